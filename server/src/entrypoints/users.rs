use rocket::{http::Status, serde::json::Json, State};

use agora_server::db::DB;
use agora_server::types::{AchievementResponse, UserInput, UserProfile, UserResponse};

#[utoipa::path(context_path = "/api/users", responses(
    (status = 200, description = "Register a new portal user", body = UserResponse)
))]
#[post("/", data = "<input>")]
pub(crate) async fn create_user(
    input: Json<UserInput>,
    db: &State<DB>,
) -> Result<Json<UserResponse>, Status> {
    match db
        .create_user(
            &input.username,
            &input.name,
            &input.email,
            input.image.as_deref(),
        )
        .await
    {
        Ok(Some(user)) => Ok(Json(user.into())),
        Ok(None) => Err(Status::Conflict),
        Err(e) => {
            rocket::error!("Failed to create user {}: {e:#}", input.username);
            Err(Status::InternalServerError)
        }
    }
}

#[utoipa::path(context_path = "/api/users", responses(
    (status = 200, description = "Get user profile with unlocked achievements", body = UserProfile)
))]
#[get("/<username>")]
pub(crate) async fn get_user(username: &str, db: &State<DB>) -> Option<Json<UserProfile>> {
    let user = match db.get_user_by_username(username).await {
        Err(e) => {
            rocket::error!("Failed to get user {username}: {e:#}");
            return None;
        }
        Ok(value) => value?,
    };

    let achievements = match db.achievements_unlocked_by(user.id).await {
        Err(e) => {
            rocket::error!("Failed to get achievements of {username}: {e:#}");
            return None;
        }
        Ok(value) => value,
    };

    Some(Json(UserProfile {
        user: user.into(),
        achievements: achievements.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(context_path = "/api/users", responses(
    (status = 200, description = "Get achievements unlocked by the user", body = [AchievementResponse])
))]
#[get("/<username>/achievements")]
pub(crate) async fn get_user_achievements(
    username: &str,
    db: &State<DB>,
) -> Option<Json<Vec<AchievementResponse>>> {
    let user = match db.get_user_by_username(username).await {
        Err(e) => {
            rocket::error!("Failed to get user {username}: {e:#}");
            return None;
        }
        Ok(value) => value?,
    };

    match db.achievements_unlocked_by(user.id).await {
        Err(e) => {
            rocket::error!("Failed to get achievements of {username}: {e:#}");
            None
        }
        Ok(value) => Some(Json(value.into_iter().map(Into::into).collect())),
    }
}

pub fn stage() -> rocket::fairing::AdHoc {
    rocket::fairing::AdHoc::on_ignite("Installing entrypoints", |rocket| async {
        rocket.mount(
            "/api/users",
            rocket::routes![create_user, get_user, get_user_achievements],
        )
    })
}
