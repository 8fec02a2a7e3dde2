//! Triggering the check-in control inside the located frame.
//!
//! Strategy order runs from most fragile-but-specific to most robust-but-
//! generic: an exact selector-plus-text hit is near-certain to be the right
//! control but breaks first on a redesign; the id-prefix match survives
//! markup churn but asserts the least about what it found.

use fantoccini::Client;
use ponto_common::{runlog::RunLog, CheckinError};
use ponto_config::{Locators, Timing};
use ponto_drivers::browser::locate::{any_of, locate_first, Strategy};

use crate::into_driver;

/// The fixed priority order of action locator strategies.
pub fn action_strategies(locators: &Locators, timing: &Timing) -> Vec<Strategy> {
    let mut strategies = vec![Strategy::CssWithText {
        selector: locators.action_selector.clone(),
        text: any_of(&locators.action_labels),
        timeout: timing.action_timeout(),
    }];
    strategies.extend(locators.action_labels.iter().map(|label| Strategy::Role {
        name: any_of(&[label.as_str()]),
        timeout: timing.action_timeout(),
    }));
    strategies.push(Strategy::AttrPrefix {
        tag: "button".into(),
        attr: "id".into(),
        prefix: locators.action_id_prefix.clone(),
        timeout: timing.action_timeout(),
    });
    strategies
}

/// Try every strategy in order; the first resolve-and-click wins.
pub async fn perform(
    frame: &Client,
    locators: &Locators,
    timing: &Timing,
    log: &mut RunLog,
) -> Result<(), CheckinError> {
    let strategies = action_strategies(locators, timing);

    let located = locate_first(frame, &strategies, timing.poll_interval())
        .await
        .map_err(CheckinError::Driver)?;

    let Some((control, rank)) = located else {
        return Err(CheckinError::ActionNotFound(format!(
            "all {} locator strategies exhausted",
            strategies.len()
        )));
    };

    control.click().await.map_err(into_driver)?;
    log.push(format!("Check-in control clicked ({}).", strategies[rank]));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_order_is_css_then_role_then_prefix() {
        let locators = Locators::default();
        let timing = Timing::default();
        let strategies = action_strategies(&locators, &timing);

        assert!(matches!(strategies.first(), Some(Strategy::CssWithText { .. })));
        assert!(matches!(strategies.last(), Some(Strategy::AttrPrefix { .. })));
        // one role strategy per candidate label, between the two
        assert_eq!(strategies.len(), 2 + locators.action_labels.len());
        for strategy in &strategies[1..strategies.len() - 1] {
            assert!(matches!(strategy, Strategy::Role { .. }));
        }
    }

    #[test]
    fn prefix_strategy_carries_the_configured_prefix() {
        let locators = Locators::default();
        let timing = Timing::default();
        let strategies = action_strategies(&locators, &timing);

        match strategies.last().unwrap() {
            Strategy::AttrPrefix { attr, prefix, .. } => {
                assert_eq!(attr, "id");
                assert_eq!(prefix, &locators.action_id_prefix);
            }
            other => panic!("expected AttrPrefix last, got {other}"),
        }
    }
}
