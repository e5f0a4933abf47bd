use rocket::{serde::json::Json, State};

use agora_server::db::DB;
use agora_server::types::StatisticsResponse;

#[utoipa::path(context_path = "/info", responses(
    (status = 200, description = "Get portal statistics", body = StatisticsResponse)
))]
#[get("/")]
pub(crate) async fn get_statistics(db: &State<DB>) -> Option<Json<StatisticsResponse>> {
    match db.statistics().await {
        Err(e) => {
            rocket::error!("Failed to fetch statistics: {e:#}");
            None
        }
        Ok(value) => Some(Json(value.into())),
    }
}

pub fn stage() -> rocket::fairing::AdHoc {
    rocket::fairing::AdHoc::on_ignite("Installing entrypoints", |rocket| async {
        rocket.mount("/info", rocket::routes![get_statistics])
    })
}
