use serde::{Deserialize, Serialize};

use crate::core::coord::Coord;
use crate::core::piece::PieceType;
use crate::error::{StoreError, StoreResult};
use crate::slack::{SlackPolicy, SlackRules};

/// Slack policy for one piece type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeConfig {
    #[serde(rename = "type")]
    pub piece_type: PieceType,
    #[serde(default)]
    pub policy: SlackPolicy,
}

/// How a store is laid out: which types get which slack, and which slide
/// directions are indexed.
///
/// Every type listed here gets a range even with no live pieces. Types that only
/// appear in the starting position default to [`SlackPolicy::Fixed`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Upgrades every type to [`SlackPolicy::Editor`].
    pub editor: bool,
    pub slack: SlackRules,
    pub types: Vec<TypeConfig>,
    /// Slide vectors of every type in play. Opposite vectors collapse to one direction.
    pub slides: Vec<Coord>,
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_editor(mut self, enabled: bool) -> Self {
        self.editor = enabled;
        self
    }

    pub fn with_slack_rules(mut self, rules: SlackRules) -> Self {
        self.slack = rules;
        self
    }

    /// Sets the policy of `ty`, replacing an earlier entry for the same type.
    pub fn with_type(mut self, ty: PieceType, policy: SlackPolicy) -> Self {
        match self.types.iter_mut().find(|t| t.piece_type == ty) {
            Some(t) => t.policy = policy,
            None => self.types.push(TypeConfig {
                piece_type: ty,
                policy,
            }),
        }
        self
    }

    pub fn with_slides(mut self, slides: &[Coord]) -> Self {
        self.slides.extend_from_slice(slides);
        self
    }

    pub fn policy(&self, ty: PieceType) -> SlackPolicy {
        if self.editor {
            return SlackPolicy::Editor;
        }
        self.types
            .iter()
            .find(|t| t.piece_type == ty)
            .map_or(SlackPolicy::Fixed, |t| t.policy)
    }

    /// Target vacancy count for `ty` at `live_count` live pieces.
    pub fn slack_for(&self, ty: PieceType, live_count: usize) -> usize {
        self.slack.slack(self.policy(ty), live_count)
    }

    pub fn declared_types(&self) -> impl Iterator<Item = PieceType> + '_ {
        self.types.iter().map(|t| t.piece_type)
    }

    pub fn from_json(s: &str) -> StoreResult<Self> {
        serde_json::from_str(s).map_err(|e| StoreError::Config {
            reason: e.to_string(),
        })
    }

    pub fn to_json_pretty(&self) -> StoreResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| StoreError::Config {
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slack::{EDITOR_SLACK_MIN, PROMOTION_SLACK};

    #[test]
    fn undeclared_types_are_fixed() {
        let cfg = StoreConfig::new().with_type(PieceType(3), SlackPolicy::Promotion);
        assert_eq!(cfg.policy(PieceType(3)), SlackPolicy::Promotion);
        assert_eq!(cfg.policy(PieceType(4)), SlackPolicy::Fixed);
        assert_eq!(cfg.slack_for(PieceType(3), 2), PROMOTION_SLACK);
    }

    #[test]
    fn editor_flag_overrides_every_policy() {
        let cfg = StoreConfig::new()
            .with_type(PieceType(3), SlackPolicy::Fixed)
            .with_editor(true);
        assert_eq!(cfg.slack_for(PieceType(3), 0), EDITOR_SLACK_MIN);
        assert_eq!(cfg.slack_for(PieceType(99), 0), EDITOR_SLACK_MIN);
    }

    #[test]
    fn with_type_replaces_existing_entry() {
        let cfg = StoreConfig::new()
            .with_type(PieceType(3), SlackPolicy::Fixed)
            .with_type(PieceType(3), SlackPolicy::Editor);
        assert_eq!(cfg.types.len(), 1);
        assert_eq!(cfg.policy(PieceType(3)), SlackPolicy::Editor);
    }

    #[test]
    fn loads_from_json_with_defaults() {
        let cfg = StoreConfig::from_json(
            r#"{
                "types": [{"type": 30, "policy": "promotion"}, {"type": 24}],
                "slides": [{"x": 1, "y": 0}, {"x": 1, "y": 1}],
                "slack": {"promotion_slack": 4}
            }"#,
        )
        .unwrap();
        assert!(!cfg.editor);
        assert_eq!(cfg.slack.promotion_slack, 4);
        assert_eq!(cfg.slack.editor_min, EDITOR_SLACK_MIN);
        assert_eq!(cfg.policy(PieceType(30)), SlackPolicy::Promotion);
        assert_eq!(cfg.policy(PieceType(24)), SlackPolicy::Fixed);
        assert_eq!(cfg.slides, vec![Coord::new(1, 0), Coord::new(1, 1)]);

        let again = StoreConfig::from_json(&cfg.to_json_pretty().unwrap()).unwrap();
        assert_eq!(again, cfg);
    }

    #[test]
    fn bad_json_is_a_config_error() {
        assert!(matches!(
            StoreConfig::from_json(r#"{"editor": "yes"}"#),
            Err(StoreError::Config { .. })
        ));
    }
}
