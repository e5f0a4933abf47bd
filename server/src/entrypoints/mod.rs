use rocket::fairing::AdHoc;
use shared::Action;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use agora_server::db::DB;
use agora_server::engine::ScoringEngine;
use agora_server::types::{
    AchievementInput, AchievementResponse, CreatedEventResponse, CreatedNewsResponse,
    CreatedReplyResponse, CreatedTopicResponse, CriteriaShape, EventInput, EventResponse,
    NewsInput, NewsResponse, PaginatedEventResponse, PaginatedLeaderboardResponse,
    PaginatedNewsResponse, PaginatedTopicResponse, ReplyInput, ReplyResponse, StatisticsResponse,
    TopicDetailResponse, TopicInput, TopicResponse, UserInput, UserProfile, UserResponse,
};

pub mod achievements;
pub mod events;
pub mod leaderboards;
pub mod news;
pub mod statistics;
pub mod topics;
pub mod users;

#[derive(OpenApi)]
#[openapi(
    paths(
        users::create_user,
        users::get_user,
        users::get_user_achievements,
        news::get_news_list,
        news::create_news,
        topics::get_topics,
        topics::get_topic,
        topics::create_topic,
        topics::create_reply,
        events::get_events,
        events::create_event,
        achievements::get_achievements,
        achievements::create_achievement,
        leaderboards::get_leaderboard,
        statistics::get_statistics,
    ),
    components(schemas(
        UserInput,
        UserResponse,
        UserProfile,
        CriteriaShape,
        AchievementInput,
        AchievementResponse,
        NewsInput,
        NewsResponse,
        TopicInput,
        TopicResponse,
        TopicDetailResponse,
        ReplyInput,
        ReplyResponse,
        EventInput,
        EventResponse,
        StatisticsResponse,
        PaginatedNewsResponse,
        PaginatedTopicResponse,
        PaginatedEventResponse,
        PaginatedLeaderboardResponse,
        CreatedNewsResponse,
        CreatedTopicResponse,
        CreatedReplyResponse,
        CreatedEventResponse,
    ))
)]
struct ApiDoc;

pub fn stage() -> AdHoc {
    AdHoc::on_ignite("Installing entrypoints", |rocket| async {
        rocket
            .attach(users::stage())
            .attach(news::stage())
            .attach(topics::stage())
            .attach(events::stage())
            .attach(achievements::stage())
            .attach(leaderboards::stage())
            .attach(statistics::stage())
            .mount(
                "/",
                SwaggerUi::new("/swagger-ui/<_..>")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
}

// Scoring is best-effort from the handlers' point of view: the primary
// write already happened, so failures are logged and the response simply
// carries no updated user.
pub(crate) async fn award_or_log(
    engine: &ScoringEngine<DB>,
    user_id: i32,
    action: Action,
) -> (Option<UserResponse>, Vec<AchievementResponse>) {
    match engine.award(user_id, action).await {
        Ok(Some(outcome)) => (
            Some(outcome.user.into()),
            outcome.unlocked.into_iter().map(Into::into).collect(),
        ),
        Ok(None) => {
            rocket::warn!("Skipping {action} award: user {user_id} no longer exists");
            (None, vec![])
        }
        Err(e) => {
            rocket::error!("Failed to award {action} to user {user_id}: {e:#}");
            (None, vec![])
        }
    }
}
