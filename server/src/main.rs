#[macro_use]
extern crate rocket;

mod entrypoints;

use rocket::fairing::AdHoc;
use rocket_db_pools::Database;
use rocket_prometheus::PrometheusMetrics;
use shared::ScoringConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

use agora_server::db::{self, DB};
use agora_server::engine::ScoringEngine;

#[derive(Debug, serde::Deserialize)]
pub struct Env {
    scoring_config: Option<String>,
    allowed_origins: Option<Vec<String>>,
}

#[launch]
async fn rocket() -> _ {
    dotenv::dotenv().ok();

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().pretty());
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    let env = envy::from_env::<Env>().expect("Failed to load environment variables");
    let config = load_scoring_config(env.scoring_config.as_deref());

    let cors = cors_options(env.allowed_origins)
        .to_cors()
        .expect("Failed to create CORS configuration");
    let prometheus = PrometheusMetrics::new();

    rocket::build()
        .attach(db::stage())
        .attach(AdHoc::on_ignite("Scoring engine", move |rocket| async move {
            let db = DB::fetch(&rocket)
                .expect("Failed to get DB connection")
                .clone();
            rocket.manage(ScoringEngine::new(config, db))
        }))
        .attach(cors)
        .attach(prometheus.clone())
        .mount("/metrics", prometheus)
        .attach(entrypoints::stage())
}

fn cors_options(allowed_origins: Option<Vec<String>>) -> rocket_cors::CorsOptions {
    match allowed_origins {
        Some(origins) => rocket_cors::CorsOptions {
            allowed_origins: rocket_cors::AllowedOrigins::some_exact(&origins),
            ..Default::default()
        },
        None => rocket_cors::CorsOptions::default(),
    }
}

fn load_scoring_config(path: Option<&str>) -> ScoringConfig {
    let Some(path) = path else {
        return ScoringConfig::default();
    };
    let raw = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read scoring config {path}: {e}"));
    let config: ScoringConfig = toml::from_str(&raw)
        .unwrap_or_else(|e| panic!("Failed to parse scoring config {path}: {e}"));
    config
        .validate()
        .expect("Scoring config level table is invalid");
    config
}
