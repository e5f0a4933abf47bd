use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use shared::AchievementCriteria;
use utoipa::ToSchema;

use crate::db::types::{
    AchievementRecord, EventRecord, LeaderboardRecord, NewsRecord, ReplyRecord, Statistics,
    TopicRecord, UserRecord,
};

#[derive(Clone, Debug, Serialize, Deserialize, Default, ToSchema)]
#[aliases(
    PaginatedNewsResponse = PaginatedResponse<NewsResponse>,
    PaginatedTopicResponse = PaginatedResponse<TopicResponse>,
    PaginatedEventResponse = PaginatedResponse<EventResponse>,
    PaginatedLeaderboardResponse = PaginatedResponse<LeaderboardResponse>
)]
pub struct PaginatedResponse<T: Serialize> {
    pub records: Vec<T>,
    pub page: u64,
    pub total_pages: u64,
    pub limit: u64,
    pub total_records: u64,
}

impl<T: Serialize> PaginatedResponse<T> {
    pub fn new(records: Vec<T>, page: u64, limit: u64, total_records: u64) -> Self {
        let limit = limit.max(1);
        let extra_page = if total_records % limit == 0 { 0 } else { 1 };
        let total_pages = (total_records / limit) + extra_page;
        Self {
            records,
            page,
            total_pages,
            limit,
            total_records,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub name: String,
    pub image: Option<String>,
    pub role: String,
    pub points: u32,
    pub level: u32,
    pub member_since: NaiveDateTime,
}

impl From<UserRecord> for UserResponse {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            name: record.name,
            image: record.image,
            role: record.role,
            points: record.points.max(0) as u32,
            level: record.level.max(1) as u32,
            member_since: record.created_at,
        }
    }
}

/// The `{type, value}` criteria shape of the achievement documents.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CriteriaShape {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: u32,
}

impl CriteriaShape {
    pub fn parse(&self) -> Option<AchievementCriteria> {
        AchievementCriteria::from_parts(&self.kind, self.value)
    }
}

impl From<AchievementCriteria> for CriteriaShape {
    fn from(criteria: AchievementCriteria) -> Self {
        Self {
            kind: criteria.kind().to_string(),
            value: criteria.threshold(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AchievementResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub criteria: CriteriaShape,
    pub points: u32,
}

impl From<AchievementRecord> for AchievementResponse {
    fn from(record: AchievementRecord) -> Self {
        Self {
            id: record.id,
            criteria: CriteriaShape {
                kind: record.criteria_type.clone(),
                value: record.criteria_value.max(0) as u32,
            },
            name: record.name,
            description: record.description,
            image: record.image,
            points: record.points.max(0) as u32,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub user: UserResponse,
    pub achievements: Vec<AchievementResponse>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct NewsResponse {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub content: String,
    pub author_id: i32,
    pub published: bool,
    pub created_at: NaiveDateTime,
}

impl From<NewsRecord> for NewsResponse {
    fn from(record: NewsRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            slug: record.slug,
            summary: record.summary,
            content: record.content,
            author_id: record.author_id,
            published: record.published,
            created_at: record.created_at,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TopicResponse {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub author_id: i32,
    pub replies: u64,
    pub created_at: NaiveDateTime,
}

impl From<TopicRecord> for TopicResponse {
    fn from(record: TopicRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            content: record.content,
            author_id: record.author_id,
            replies: record.replies.max(0) as u64,
            created_at: record.created_at,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ReplyResponse {
    pub id: i32,
    pub topic_id: i32,
    pub author_id: i32,
    pub content: String,
    pub created_at: NaiveDateTime,
}

impl From<ReplyRecord> for ReplyResponse {
    fn from(record: ReplyRecord) -> Self {
        Self {
            id: record.id,
            topic_id: record.topic_id,
            author_id: record.author_id,
            content: record.content,
            created_at: record.created_at,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TopicDetailResponse {
    pub topic: TopicResponse,
    pub replies: Vec<ReplyResponse>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct EventResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub starts_at: NaiveDateTime,
    pub organizer_id: i32,
    pub created_at: NaiveDateTime,
}

impl From<EventRecord> for EventResponse {
    fn from(record: EventRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            location: record.location,
            starts_at: record.starts_at,
            organizer_id: record.organizer_id,
            created_at: record.created_at,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct LeaderboardResponse {
    pub place: u32,
    pub username: String,
    pub name: String,
    pub points: u32,
    pub level: u32,
}

impl From<LeaderboardRecord> for LeaderboardResponse {
    fn from(record: LeaderboardRecord) -> Self {
        Self {
            place: record.place.max(0) as u32,
            username: record.username,
            name: record.name,
            points: record.points.max(0) as u32,
            level: record.level.max(1) as u32,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StatisticsResponse {
    pub users: u64,
    pub news: u64,
    pub topics: u64,
    pub replies: u64,
    pub events: u64,
    pub unlocked_achievements: u64,
}

impl From<Statistics> for StatisticsResponse {
    fn from(statistics: Statistics) -> Self {
        Self {
            users: statistics.users.max(0) as u64,
            news: statistics.news.max(0) as u64,
            topics: statistics.topics.max(0) as u64,
            replies: statistics.replies.max(0) as u64,
            events: statistics.events.max(0) as u64,
            unlocked_achievements: statistics.unlocked_achievements.max(0) as u64,
        }
    }
}

/// A created entity together with the post-award user state. `user` is
/// absent when scoring failed; the primary write is never rolled back
/// for a scoring failure.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[aliases(
    CreatedNewsResponse = CreatedWithAward<NewsResponse>,
    CreatedTopicResponse = CreatedWithAward<TopicResponse>,
    CreatedReplyResponse = CreatedWithAward<ReplyResponse>,
    CreatedEventResponse = CreatedWithAward<EventResponse>
)]
pub struct CreatedWithAward<T: Serialize> {
    pub record: T,
    pub user: Option<UserResponse>,
    pub unlocked: Vec<AchievementResponse>,
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct UserInput {
    pub username: String,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct NewsInput {
    pub title: String,
    pub summary: Option<String>,
    pub content: String,
    pub author_id: i32,
    #[serde(default = "default_published")]
    pub published: bool,
}

fn default_published() -> bool {
    true
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct TopicInput {
    pub title: String,
    pub content: String,
    pub author_id: i32,
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct ReplyInput {
    pub content: String,
    pub author_id: i32,
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct EventInput {
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub starts_at: NaiveDateTime,
    pub organizer_id: i32,
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct AchievementInput {
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub criteria: CriteriaShape,
    #[serde(default)]
    pub points: u32,
}
