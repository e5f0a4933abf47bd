use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use shared::AchievementCriteria;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i32,
    pub username: String,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub role: String,
    pub points: i32,
    pub level: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct AchievementRecord {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub criteria_type: String,
    pub criteria_value: i32,
    pub points: i32,
}

impl AchievementRecord {
    /// `None` when the stored criteria kind is not one the engine
    /// recognizes.
    pub fn criteria(&self) -> Option<AchievementCriteria> {
        AchievementCriteria::from_parts(&self.criteria_type, self.criteria_value.max(0) as u32)
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct NewsRecord {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub content: String,
    pub author_id: i32,
    pub published: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct TopicRecord {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub author_id: i32,
    pub replies: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ReplyRecord {
    pub id: i32,
    pub topic_id: i32,
    pub author_id: i32,
    pub content: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub starts_at: NaiveDateTime,
    pub organizer_id: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct LeaderboardRecord {
    pub id: i32,
    pub username: String,
    pub name: String,
    pub points: i32,
    pub level: i32,
    pub place: i64,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Statistics {
    pub users: i64,
    pub news: i64,
    pub topics: i64,
    pub replies: i64,
    pub events: i64,
    pub unlocked_achievements: i64,
}
