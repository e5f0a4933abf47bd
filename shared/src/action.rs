use serde::{Deserialize, Serialize};

/// A point-awarding user activity.
///
/// The wire and configuration spelling is the upper snake form
/// (`CREATE_NEWS`, `REPLY_TOPIC`, ...).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    CreateNews,
    CreateTopic,
    ReplyTopic,
    ParticipateEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_spelling_matches_display() {
        assert_eq!(Action::CreateNews.to_string(), "CREATE_NEWS");
        assert_eq!(
            serde_json::to_string(&Action::ParticipateEvent).unwrap(),
            "\"PARTICIPATE_EVENT\""
        );
    }
}
