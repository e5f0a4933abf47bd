use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Action;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("level table is empty")]
    EmptyLevelTable,
    #[error("level table must start at zero points, found {0}")]
    MissingBaseLevel(u32),
    #[error("level table must be strictly increasing, {0} is out of order")]
    UnorderedLevelTable(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelThreshold {
    pub level: u32,
    pub min_points: u32,
}

/// Ordered (level, minimum cumulative points) pairs. A user holds the
/// highest level whose threshold does not exceed their point total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelTable(Vec<LevelThreshold>);

impl LevelTable {
    pub fn new(thresholds: Vec<(u32, u32)>) -> Self {
        let table = Self(
            thresholds
                .into_iter()
                .map(|(level, min_points)| LevelThreshold { level, min_points })
                .collect(),
        );
        assert!(
            table.validate().is_ok(),
            "Level table should be non-empty, zero-based and strictly increasing"
        );
        table
    }

    pub fn level_for(&self, points: u32) -> u32 {
        self.0
            .iter()
            .take_while(|threshold| threshold.min_points <= points)
            .last()
            .map(|threshold| threshold.level)
            .unwrap_or(1)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let first = self.0.first().ok_or(ConfigError::EmptyLevelTable)?;
        if first.min_points != 0 {
            return Err(ConfigError::MissingBaseLevel(first.min_points));
        }
        for pair in self.0.windows(2) {
            if pair[1].level <= pair[0].level || pair[1].min_points <= pair[0].min_points {
                return Err(ConfigError::UnorderedLevelTable(pair[1].level));
            }
        }
        Ok(())
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        Self::new(vec![(1, 0), (2, 100), (3, 250), (4, 500), (5, 1000)])
    }
}

fn default_points() -> BTreeMap<Action, u32> {
    [
        (Action::CreateNews, 10),
        (Action::CreateTopic, 5),
        (Action::ReplyTopic, 2),
        (Action::ParticipateEvent, 15),
    ]
    .into_iter()
    .collect()
}

/// The action->points table and the level table, defined once and passed
/// explicitly to every consumer. Deserializable so deployments can swap
/// the defaults for their own tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_points")]
    points: BTreeMap<Action, u32>,
    #[serde(default)]
    levels: LevelTable,
}

impl ScoringConfig {
    pub fn new(points: BTreeMap<Action, u32>, levels: LevelTable) -> Self {
        Self { points, levels }
    }

    /// Point value of an action, or `None` when the table carries no
    /// mapping for it. Callers must treat the absence as an error rather
    /// than a zero award.
    pub fn points_for(&self, action: Action) -> Option<u32> {
        self.points.get(&action).copied()
    }

    pub fn level_for(&self, points: u32) -> u32 {
        self.levels.level_for(points)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.levels.validate()
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            points: default_points(),
            levels: LevelTable::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn default_table_covers_every_action() {
        let config = ScoringConfig::default();
        for action in Action::iter() {
            assert!(
                config.points_for(action).is_some(),
                "missing point value for {action}"
            );
        }
        assert_eq!(config.points_for(Action::CreateNews), Some(10));
        assert_eq!(config.points_for(Action::CreateTopic), Some(5));
        assert_eq!(config.points_for(Action::ReplyTopic), Some(2));
        assert_eq!(config.points_for(Action::ParticipateEvent), Some(15));
    }

    #[test]
    fn level_is_highest_threshold_not_exceeding_points() {
        let config = ScoringConfig::default();
        assert_eq!(config.level_for(0), 1);
        assert_eq!(config.level_for(99), 1);
        assert_eq!(config.level_for(100), 2);
        assert_eq!(config.level_for(249), 2);
        assert_eq!(config.level_for(1000), 5);
        assert_eq!(config.level_for(250_000), 5);
    }

    #[test]
    fn level_is_monotonic_in_points() {
        let config = ScoringConfig::default();
        let mut last = 0;
        for points in 0..1100 {
            let level = config.level_for(points);
            assert!(level >= last);
            last = level;
        }
    }

    #[test]
    #[should_panic(expected = "strictly increasing")]
    fn unordered_level_table_is_rejected() {
        LevelTable::new(vec![(1, 0), (2, 100), (3, 50)]);
    }

    #[test]
    fn level_table_must_start_at_zero() {
        let table = LevelTable(vec![LevelThreshold {
            level: 1,
            min_points: 10,
        }]);
        assert_eq!(table.validate(), Err(ConfigError::MissingBaseLevel(10)));
    }

    #[test]
    fn tables_can_be_overridden_from_toml() {
        let raw = r#"
            [points]
            CREATE_NEWS = 25
            CREATE_TOPIC = 5

            [[levels]]
            level = 1
            min_points = 0

            [[levels]]
            level = 2
            min_points = 50
        "#;
        let config: ScoringConfig = toml::from_str(raw).unwrap();
        config.validate().unwrap();
        assert_eq!(config.points_for(Action::CreateNews), Some(25));
        // Unmapped actions stay unmapped rather than falling back to defaults
        assert_eq!(config.points_for(Action::ReplyTopic), None);
        assert_eq!(config.level_for(50), 2);
    }
}
