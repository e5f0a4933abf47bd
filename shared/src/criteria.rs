use serde::{Deserialize, Serialize};

/// Point total and activity counters a criterion is evaluated against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivitySnapshot {
    pub points: u32,
    pub news_authored: u64,
    pub topics_authored: u64,
    pub replies_related: u64,
    pub events_organized: u64,
}

/// Unlock condition of an achievement: a counter kind plus the threshold
/// the counter must meet or exceed. Serializes to the `{type, value}`
/// document shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum AchievementCriteria {
    Points(u32),
    News(u32),
    Topics(u32),
    Replies(u32),
    Events(u32),
}

impl AchievementCriteria {
    pub const fn is_met(&self, activity: &ActivitySnapshot) -> bool {
        match self {
            Self::Points(value) => activity.points >= *value,
            Self::News(value) => activity.news_authored >= *value as u64,
            Self::Topics(value) => activity.topics_authored >= *value as u64,
            Self::Replies(value) => activity.replies_related >= *value as u64,
            Self::Events(value) => activity.events_organized >= *value as u64,
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Points(_) => "points",
            Self::News(_) => "news",
            Self::Topics(_) => "topics",
            Self::Replies(_) => "replies",
            Self::Events(_) => "events",
        }
    }

    pub const fn threshold(&self) -> u32 {
        match self {
            Self::Points(value)
            | Self::News(value)
            | Self::Topics(value)
            | Self::Replies(value)
            | Self::Events(value) => *value,
        }
    }

    pub fn from_parts(kind: &str, value: u32) -> Option<Self> {
        match kind {
            "points" => Some(Self::Points(value)),
            "news" => Some(Self::News(value)),
            "topics" => Some(Self::Topics(value)),
            "replies" => Some(Self::Replies(value)),
            "events" => Some(Self::Events(value)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity() -> ActivitySnapshot {
        ActivitySnapshot {
            points: 120,
            news_authored: 3,
            topics_authored: 1,
            replies_related: 7,
            events_organized: 0,
        }
    }

    #[test]
    fn each_kind_checks_its_own_counter() {
        let activity = activity();
        assert!(AchievementCriteria::Points(100).is_met(&activity));
        assert!(!AchievementCriteria::Points(121).is_met(&activity));
        assert!(AchievementCriteria::News(3).is_met(&activity));
        assert!(!AchievementCriteria::News(4).is_met(&activity));
        assert!(AchievementCriteria::Topics(1).is_met(&activity));
        assert!(AchievementCriteria::Replies(7).is_met(&activity));
        assert!(!AchievementCriteria::Events(1).is_met(&activity));
    }

    #[test]
    fn document_shape_round_trips() {
        let criteria = AchievementCriteria::News(3);
        let json = serde_json::to_value(criteria).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "news", "value": 3 }));
        let parsed: AchievementCriteria = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, criteria);
    }

    #[test]
    fn parts_round_trip() {
        let criteria = AchievementCriteria::Events(5);
        assert_eq!(
            AchievementCriteria::from_parts(criteria.kind(), criteria.threshold()),
            Some(criteria)
        );
        assert_eq!(AchievementCriteria::from_parts("streak", 5), None);
    }
}
