//! Ordered-fallback element location.
//!
//! Third-party markup changes between releases, so nothing here trusts a
//! single selector. A lookup is an ordered list of [`Strategy`] values,
//! ranked from most specific (breaks first on a redesign, but a hit is
//! almost certainly the right element) to most generic (survives markup
//! churn, but matches on weaker evidence). [`locate_first`] walks the list
//! in priority order; the first strategy to resolve wins.

use std::fmt;
use std::time::Duration;

use anyhow::Result;
use fantoccini::{elements::Element, Client, Locator};
use ponto_common::wait::poll_within;
use regex::Regex;

/// Elements that present as buttons to assistive tech.
const BUTTON_LIKE: &str = "button, [role='button'], input[type='submit']";

/// Build a case-insensitive matcher over several localized labels.
pub fn any_of<S: AsRef<str>>(labels: &[S]) -> Regex {
    let alternatives: Vec<String> = labels
        .iter()
        .map(|label| regex::escape(label.as_ref()))
        .collect();
    let pattern = if alternatives.is_empty() {
        // a character after end-of-text: matches nothing, ever
        r"\z.".to_string()
    } else {
        format!("(?i)({})", alternatives.join("|"))
    };
    Regex::new(&pattern).expect("escaped alternation is always a valid pattern")
}

/// One element-location tactic with its own time budget.
#[derive(Debug, Clone)]
pub enum Strategy {
    /// An `input` whose `placeholder` text matches.
    Placeholder { pattern: Regex, timeout: Duration },
    /// A `<label>` whose text matches, following `for=` (or a nested input).
    Label { pattern: Regex, timeout: Duration },
    /// A button-like element whose accessible name matches.
    Role { name: Regex, timeout: Duration },
    /// A CSS selector narrowed by visible text.
    CssWithText {
        selector: String,
        text: Regex,
        timeout: Duration,
    },
    /// An attribute-prefix match, for identifiers with generated suffixes.
    AttrPrefix {
        tag: String,
        attr: String,
        prefix: String,
        timeout: Duration,
    },
}

impl Strategy {
    pub fn timeout(&self) -> Duration {
        match self {
            Strategy::Placeholder { timeout, .. }
            | Strategy::Label { timeout, .. }
            | Strategy::Role { timeout, .. }
            | Strategy::CssWithText { timeout, .. }
            | Strategy::AttrPrefix { timeout, .. } => *timeout,
        }
    }

    /// One resolution pass against the live DOM. `Ok(None)` means "no match
    /// right now"; the caller decides whether to poll again.
    pub async fn resolve(&self, scope: &Client) -> Result<Option<Element>> {
        match self {
            Strategy::Placeholder { pattern, .. } => {
                for input in scope.find_all(Locator::Css("input[placeholder]")).await? {
                    if let Some(placeholder) = input.attr("placeholder").await? {
                        if pattern.is_match(&placeholder) {
                            return Ok(Some(input));
                        }
                    }
                }
                Ok(None)
            }
            Strategy::Label { pattern, .. } => {
                for label in scope.find_all(Locator::Css("label")).await? {
                    let text = label.text().await.unwrap_or_default();
                    if !pattern.is_match(&text) {
                        continue;
                    }
                    if let Some(target) = label.attr("for").await? {
                        if !target.is_empty() {
                            if let Some(element) =
                                scope.find_all(Locator::Id(&target)).await?.into_iter().next()
                            {
                                return Ok(Some(element));
                            }
                        }
                    }
                    // label wrapping its control instead of pointing at it
                    if let Some(element) =
                        label.find_all(Locator::Css("input")).await?.into_iter().next()
                    {
                        return Ok(Some(element));
                    }
                }
                Ok(None)
            }
            Strategy::Role { name, .. } => {
                for candidate in scope.find_all(Locator::Css(BUTTON_LIKE)).await? {
                    if name.is_match(&accessible_name(&candidate).await) {
                        return Ok(Some(candidate));
                    }
                }
                Ok(None)
            }
            Strategy::CssWithText { selector, text, .. } => {
                for element in scope.find_all(Locator::Css(selector)).await? {
                    let visible = element.text().await.unwrap_or_default();
                    if text.is_match(&visible) {
                        return Ok(Some(element));
                    }
                }
                Ok(None)
            }
            Strategy::AttrPrefix {
                tag, attr, prefix, ..
            } => {
                let selector = format!("{tag}[{attr}^=\"{prefix}\"]");
                Ok(scope
                    .find_all(Locator::Css(&selector))
                    .await?
                    .into_iter()
                    .next())
            }
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Placeholder { pattern, .. } => write!(f, "placeholder {pattern}"),
            Strategy::Label { pattern, .. } => write!(f, "label {pattern}"),
            Strategy::Role { name, .. } => write!(f, "role/name {name}"),
            Strategy::CssWithText { selector, text, .. } => {
                write!(f, "css '{selector}' + text {text}")
            }
            Strategy::AttrPrefix { attr, prefix, .. } => {
                write!(f, "{attr} prefix '{prefix}'")
            }
        }
    }
}

/// Best-effort accessible name: visible text first, then the usual
/// attribute fallbacks.
async fn accessible_name(element: &Element) -> String {
    if let Ok(text) = element.text().await {
        let text = text.trim();
        if !text.is_empty() {
            return text.to_string();
        }
    }
    for attr in ["aria-label", "value", "title"] {
        if let Ok(Some(value)) = element.attr(attr).await {
            let value = value.trim();
            if !value.is_empty() {
                return value.to_string();
            }
        }
    }
    String::new()
}

/// Walk `strategies` in priority order. Each strategy polls the live DOM
/// under its own deadline; the first hit short-circuits the rest. Returns
/// the element plus the rank of the strategy that found it, or `None` once
/// every strategy's budget is spent.
pub async fn locate_first(
    scope: &Client,
    strategies: &[Strategy],
    interval: Duration,
) -> Result<Option<(Element, usize)>> {
    for (rank, strategy) in strategies.iter().enumerate() {
        let found = poll_within(strategy.timeout(), interval, || async {
            match strategy.resolve(scope).await {
                Ok(hit) => Ok(hit),
                Err(err) => {
                    // stale elements during an SPA re-render count as a miss
                    tracing::trace!(strategy = %strategy, error = %err, "resolution pass failed");
                    Ok(None)
                }
            }
        })
        .await?;

        if let Some(element) = found {
            tracing::debug!(strategy = %strategy, rank, "element located");
            return Ok(Some((element, rank)));
        }
        tracing::trace!(strategy = %strategy, "strategy budget spent, falling back");
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_of_matches_case_insensitively() {
        let pattern = any_of(&["Entrar", "Acessar"]);
        assert!(pattern.is_match("ENTRAR"));
        assert!(pattern.is_match("acessar agora"));
        assert!(!pattern.is_match("sair"));
    }

    #[test]
    fn any_of_escapes_metacharacters() {
        let pattern = any_of(&["Entrar (novo)"]);
        assert!(pattern.is_match("entrar (novo)"));
        assert!(!pattern.is_match("Entrar novo"));
    }

    #[test]
    fn any_of_handles_accented_labels() {
        let pattern = any_of(&["Usuário", "Próximo"]);
        assert!(pattern.is_match("Usuário"));
        assert!(pattern.is_match("próximo"));
    }

    #[test]
    fn empty_label_set_matches_nothing() {
        let pattern = any_of::<&str>(&[]);
        assert!(!pattern.is_match(""));
        assert!(!pattern.is_match("anything"));
    }

    #[test]
    fn display_names_the_tactic() {
        let strategy = Strategy::AttrPrefix {
            tag: "button".into(),
            attr: "id".into(),
            prefix: "btn-clocking-event-".into(),
            timeout: Duration::from_secs(1),
        };
        assert_eq!(strategy.to_string(), "id prefix 'btn-clocking-event-'");

        let strategy = Strategy::CssWithText {
            selector: "button".into(),
            text: any_of(&["Registrar Ponto"]),
            timeout: Duration::from_secs(1),
        };
        assert!(strategy.to_string().starts_with("css 'button'"));
    }

    #[test]
    fn each_strategy_carries_its_own_timeout() {
        let strategy = Strategy::Role {
            name: any_of(&["Entrar"]),
            timeout: Duration::from_secs(3),
        };
        assert_eq!(strategy.timeout(), Duration::from_secs(3));
    }
}
