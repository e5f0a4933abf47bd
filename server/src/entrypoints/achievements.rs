use rocket::{http::Status, serde::json::Json, State};

use agora_server::db::DB;
use agora_server::types::{AchievementInput, AchievementResponse};

#[utoipa::path(context_path = "/api/achievements", responses(
    (status = 200, description = "Get all achievement definitions", body = [AchievementResponse])
))]
#[get("/")]
pub(crate) async fn get_achievements(db: &State<DB>) -> Option<Json<Vec<AchievementResponse>>> {
    match db.list_achievements().await {
        Err(e) => {
            rocket::error!("Failed to list achievements: {e:#}");
            None
        }
        Ok(value) => Some(Json(value.into_iter().map(Into::into).collect())),
    }
}

#[utoipa::path(context_path = "/api/achievements", responses(
    (status = 200, description = "Create an achievement definition", body = AchievementResponse),
    (status = 422, description = "Unrecognized criteria kind")
))]
#[post("/", data = "<input>")]
pub(crate) async fn create_achievement(
    input: Json<AchievementInput>,
    db: &State<DB>,
) -> Result<Json<AchievementResponse>, Status> {
    let input = input.into_inner();

    // Reject unknown criteria kinds up front; a definition nobody can
    // evaluate would sit locked forever
    let Some(criteria) = input.criteria.parse() else {
        return Err(Status::UnprocessableEntity);
    };

    match db
        .create_achievement(
            &input.name,
            &input.description,
            input.image.as_deref(),
            criteria,
            input.points,
        )
        .await
    {
        Ok(value) => Ok(Json(value.into())),
        Err(e) => {
            rocket::error!("Failed to create achievement '{}': {e:#}", input.name);
            Err(Status::InternalServerError)
        }
    }
}

pub fn stage() -> rocket::fairing::AdHoc {
    rocket::fairing::AdHoc::on_ignite("Installing entrypoints", |rocket| async {
        rocket.mount(
            "/api/achievements",
            rocket::routes![get_achievements, create_achievement],
        )
    })
}
