use rocket::{http::Status, serde::json::Json, State};
use shared::Action;

use agora_server::db::DB;
use agora_server::engine::ScoringEngine;
use agora_server::types::{
    CreatedNewsResponse, CreatedWithAward, NewsInput, NewsResponse, PaginatedNewsResponse,
    PaginatedResponse,
};

#[utoipa::path(context_path = "/api/news", responses(
    (status = 200, description = "Get published news, newest first", body = PaginatedNewsResponse)
))]
#[get("/?<page>&<limit>")]
pub(crate) async fn get_news_list(
    page: Option<u64>,
    limit: Option<u64>,
    db: &State<DB>,
) -> Option<Json<PaginatedResponse<NewsResponse>>> {
    let page = page.unwrap_or(0);
    let limit = limit.unwrap_or(50);
    let (records, total) = match db.list_news(page as i64, limit as i64).await {
        Err(e) => {
            rocket::error!("Failed to list news: {e:#}");
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

#[utoipa::path(context_path = "/api/news", responses(
    (status = 200, description = "Publish a news article and award its author", body = CreatedNewsResponse)
))]
#[post("/", data = "<input>")]
pub(crate) async fn create_news(
    input: Json<NewsInput>,
    db: &State<DB>,
    engine: &State<ScoringEngine<DB>>,
) -> Result<Json<CreatedWithAward<NewsResponse>>, Status> {
    let input = input.into_inner();

    match db.get_user(input.author_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(Status::UnprocessableEntity),
        Err(e) => {
            rocket::error!("Failed to look up author {}: {e:#}", input.author_id);
            return Err(Status::InternalServerError);
        }
    }

    let slug = slugify(&input.title);
    let record = match db
        .insert_news(
            &input.title,
            &slug,
            input.summary.as_deref(),
            &input.content,
            input.author_id,
            input.published,
        )
        .await
    {
        Ok(Some(value)) => value,
        Ok(None) => return Err(Status::Conflict),
        Err(e) => {
            rocket::error!("Failed to insert news '{slug}': {e:#}");
            return Err(Status::InternalServerError);
        }
    };

    let (user, unlocked) = super::award_or_log(engine, record.author_id, Action::CreateNews).await;
    Ok(Json(CreatedWithAward {
        record: record.into(),
        user,
        unlocked,
    }))
}

// URL-safe slug from a title: lowercase alphanumerics, runs of anything
// else collapsed into single dashes.
fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

pub fn stage() -> rocket::fairing::AdHoc {
    rocket::fairing::AdHoc::on_ignite("Installing entrypoints", |rocket| async {
        rocket.mount("/api/news", rocket::routes![get_news_list, create_news])
    })
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn slugs_are_lowercase_and_dashed() {
        assert_eq!(slugify("Breaking: Rust 2.0 Released!"), "breaking-rust-2-0-released");
        assert_eq!(slugify("  already---dashed  "), "already-dashed");
        assert_eq!(slugify("Água de Coco"), "água-de-coco");
    }
}
