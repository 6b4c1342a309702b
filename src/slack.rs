//! How many vacant placeholder slots each type range keeps in reserve.
//!
//! Slack is a trade between wasted memory and how often the store has to be
//! regenerated. Types that can never increase in count get none.

use serde::{Deserialize, Serialize};

/// Vacancies kept for types that can appear through promotion.
pub const PROMOTION_SLACK: usize = 10;

/// Lower bound of vacancies per type in editor-style (insertion heavy) use.
pub const EDITOR_SLACK_MIN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlackPolicy {
    /// The count of this type can only go down.
    #[default]
    Fixed,
    /// The count can grow slowly, e.g. by promotion.
    Promotion,
    /// Frequent, unbounded insertion.
    Editor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackRules {
    pub promotion_slack: usize,
    pub editor_min: usize,
    pub editor_factor: usize,
}

impl Default for SlackRules {
    fn default() -> Self {
        Self {
            promotion_slack: PROMOTION_SLACK,
            editor_min: EDITOR_SLACK_MIN,
            editor_factor: 1,
        }
    }
}

impl SlackRules {
    /// Target number of vacant slots for a type with `live_count` live pieces.
    pub fn slack(&self, policy: SlackPolicy, live_count: usize) -> usize {
        match policy {
            SlackPolicy::Fixed => 0,
            SlackPolicy::Promotion => self.promotion_slack,
            SlackPolicy::Editor => self
                .editor_min
                .max(live_count.saturating_mul(self.editor_factor)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_types_get_no_slack() {
        assert_eq!(SlackRules::default().slack(SlackPolicy::Fixed, 40), 0);
    }

    #[test]
    fn promotion_slack_is_constant() {
        let rules = SlackRules::default();
        assert_eq!(rules.slack(SlackPolicy::Promotion, 0), PROMOTION_SLACK);
        assert_eq!(rules.slack(SlackPolicy::Promotion, 500), PROMOTION_SLACK);
    }

    #[test]
    fn editor_slack_scales_with_count() {
        let rules = SlackRules {
            editor_factor: 2,
            ..SlackRules::default()
        };
        assert_eq!(rules.slack(SlackPolicy::Editor, 3), EDITOR_SLACK_MIN);
        assert_eq!(rules.slack(SlackPolicy::Editor, 400), 800);
    }
}
