use rocket::{http::Status, serde::json::Json, State};
use shared::Action;

use agora_server::db::DB;
use agora_server::engine::ScoringEngine;
use agora_server::types::{
    CreatedReplyResponse, CreatedTopicResponse, CreatedWithAward, PaginatedResponse,
    PaginatedTopicResponse, ReplyInput, ReplyResponse, TopicDetailResponse, TopicInput,
    TopicResponse,
};

#[utoipa::path(context_path = "/api/topics", responses(
    (status = 200, description = "Get forum topics, newest first", body = PaginatedTopicResponse)
))]
#[get("/?<page>&<limit>")]
pub(crate) async fn get_topics(
    page: Option<u64>,
    limit: Option<u64>,
    db: &State<DB>,
) -> Option<Json<PaginatedResponse<TopicResponse>>> {
    let page = page.unwrap_or(0);
    let limit = limit.unwrap_or(50);
    let (records, total) = match db.list_topics(page as i64, limit as i64).await {
        Err(e) => {
            rocket::error!("Failed to list topics: {e:#}");
            return None;
        }
        Ok(value) => value,
    };
    Some(Json(PaginatedResponse::new(
        records.into_iter().map(Into::into).collect(),
        page + 1,
        limit,
        total as u64,
    )))
}

#[utoipa::path(context_path = "/api/topics", responses(
    (status = 200, description = "Get a topic with its replies", body = TopicDetailResponse)
))]
#[get("/<topic_id>")]
pub(crate) async fn get_topic(topic_id: i32, db: &State<DB>) -> Option<Json<TopicDetailResponse>> {
    let topic = match db.get_topic(topic_id).await {
        Err(e) => {
            rocket::error!("Failed to get topic {topic_id}: {e:#}");
            return None;
        }
        Ok(value) => value?,
    };

    let replies = match db.list_replies(topic_id).await {
        Err(e) => {
            rocket::error!("Failed to list replies of topic {topic_id}: {e:#}");
            return None;
        }
        Ok(value) => value,
    };

    Some(Json(TopicDetailResponse {
        topic: topic.into(),
        replies: replies.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(context_path = "/api/topics", responses(
    (status = 200, description = "Open a topic and award its author", body = CreatedTopicResponse)
))]
#[post("/", data = "<input>")]
pub(crate) async fn create_topic(
    input: Json<TopicInput>,
    db: &State<DB>,
    engine: &State<ScoringEngine<DB>>,
) -> Result<Json<CreatedWithAward<TopicResponse>>, Status> {
    let input = input.into_inner();

    match db.get_user(input.author_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(Status::UnprocessableEntity),
        Err(e) => {
            rocket::error!("Failed to look up author {}: {e:#}", input.author_id);
            return Err(Status::InternalServerError);
        }
    }

    let record = match db
        .insert_topic(&input.title, &input.content, input.author_id)
        .await
    {
        Ok(value) => value,
        Err(e) => {
            rocket::error!("Failed to insert topic: {e:#}");
            return Err(Status::InternalServerError);
        }
    };

    let (user, unlocked) = super::award_or_log(engine, record.author_id, Action::CreateTopic).await;
    Ok(Json(CreatedWithAward {
        record: record.into(),
        user,
        unlocked,
    }))
}

#[utoipa::path(context_path = "/api/topics", responses(
    (status = 200, description = "Reply to a topic and award the reply author", body = CreatedReplyResponse),
    (status = 404, description = "Topic does not exist")
))]
#[post("/<topic_id>/replies", data = "<input>")]
pub(crate) async fn create_reply(
    topic_id: i32,
    input: Json<ReplyInput>,
    db: &State<DB>,
    engine: &State<ScoringEngine<DB>>,
) -> Result<Json<CreatedWithAward<ReplyResponse>>, Status> {
    let input = input.into_inner();

    match db.get_topic(topic_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(Status::NotFound),
        Err(e) => {
            rocket::error!("Failed to get topic {topic_id}: {e:#}");
            return Err(Status::InternalServerError);
        }
    }
    match db.get_user(input.author_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(Status::UnprocessableEntity),
        Err(e) => {
            rocket::error!("Failed to look up author {}: {e:#}", input.author_id);
            return Err(Status::InternalServerError);
        }
    }

    let record = match db
        .insert_reply(topic_id, input.author_id, &input.content)
        .await
    {
        Ok(value) => value,
        Err(e) => {
            rocket::error!("Failed to insert reply to topic {topic_id}: {e:#}");
            return Err(Status::InternalServerError);
        }
    };

    let (user, unlocked) = super::award_or_log(engine, record.author_id, Action::ReplyTopic).await;
    Ok(Json(CreatedWithAward {
        record: record.into(),
        user,
        unlocked,
    }))
}

pub fn stage() -> rocket::fairing::AdHoc {
    rocket::fairing::AdHoc::on_ignite("Installing entrypoints", |rocket| async {
        rocket.mount(
            "/api/topics",
            rocket::routes![get_topics, get_topic, create_topic, create_reply],
        )
    })
}
