use rocket::{serde::json::Json, State};

use agora_server::db::DB;
use agora_server::types::{LeaderboardResponse, PaginatedLeaderboardResponse, PaginatedResponse};

#[utoipa::path(context_path = "/leaderboard", responses(
    (status = 200, description = "Get users ranked by points", body = PaginatedLeaderboardResponse)
))]
#[get("/users?<page>&<limit>")]
pub(crate) async fn get_leaderboard(
    page: Option<u64>,
    limit: Option<u64>,
    db: &State<DB>,
) -> Option<Json<PaginatedResponse<LeaderboardResponse>>> {
    let page = page.unwrap_or(0);
    let limit = limit.unwrap_or(50);
    let (records, total) = match db.get_leaderboard(page as i64, limit as i64).await {
        Err(e) => {
            rocket::error!("Failed to get leaderboard: {e:#}");
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

pub fn stage() -> rocket::fairing::AdHoc {
    rocket::fairing::AdHoc::on_ignite("Installing entrypoints", |rocket| async {
        rocket.mount("/leaderboard", rocket::routes![get_leaderboard])
    })
}
