use rocket::{http::Status, serde::json::Json, State};
use shared::Action;

use agora_server::db::DB;
use agora_server::engine::ScoringEngine;
use agora_server::types::{
    CreatedEventResponse, CreatedWithAward, EventInput, EventResponse, PaginatedEventResponse,
    PaginatedResponse,
};

#[utoipa::path(context_path = "/api/events", responses(
    (status = 200, description = "Get community events ordered by start time", body = PaginatedEventResponse)
))]
#[get("/?<page>&<limit>")]
pub(crate) async fn get_events(
    page: Option<u64>,
    limit: Option<u64>,
    db: &State<DB>,
) -> Option<Json<PaginatedResponse<EventResponse>>> {
    let page = page.unwrap_or(0);
    let limit = limit.unwrap_or(50);
    let (records, total) = match db.list_events(page as i64, limit as i64).await {
        Err(e) => {
            rocket::error!("Failed to list events: {e:#}");
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

#[utoipa::path(context_path = "/api/events", responses(
    (status = 200, description = "Create an event and award its organizer", body = CreatedEventResponse)
))]
#[post("/", data = "<input>")]
pub(crate) async fn create_event(
    input: Json<EventInput>,
    db: &State<DB>,
    engine: &State<ScoringEngine<DB>>,
) -> Result<Json<CreatedWithAward<EventResponse>>, Status> {
    let input = input.into_inner();

    match db.get_user(input.organizer_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(Status::UnprocessableEntity),
        Err(e) => {
            rocket::error!("Failed to look up organizer {}: {e:#}", input.organizer_id);
            return Err(Status::InternalServerError);
        }
    }

    let record = match db
        .insert_event(
            &input.title,
            &input.description,
            input.location.as_deref(),
            input.starts_at,
            input.organizer_id,
        )
        .await
    {
        Ok(value) => value,
        Err(e) => {
            rocket::error!("Failed to insert event: {e:#}");
            return Err(Status::InternalServerError);
        }
    };

    let (user, unlocked) =
        super::award_or_log(engine, record.organizer_id, Action::ParticipateEvent).await;
    Ok(Json(CreatedWithAward {
        record: record.into(),
        user,
        unlocked,
    }))
}

pub fn stage() -> rocket::fairing::AdHoc {
    rocket::fairing::AdHoc::on_ignite("Installing entrypoints", |rocket| async {
        rocket.mount("/api/events", rocket::routes![get_events, create_event])
    })
}
