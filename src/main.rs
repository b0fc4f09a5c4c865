#[macro_use]
extern crate rocket;

mod api;
mod auth;
mod db;
mod env;
mod error;
mod model;
mod records;
mod routes;
mod telemetry;
#[cfg(test)]
mod test;
mod validation;

use api::{
    api_get_chart, api_get_records, api_login, api_logout, api_me, api_me_unauthorized,
    api_predict, health,
};
use auth::{unauthorized, unauthorized_api};
use db::{clean_expired_sessions, seed_default_user};
use error::AppError;
use model::artifact::ClassifierArtifact;
use model::predict::Predictor;
use records::RecordStore;
use rocket::{Build, Rocket, tokio};
use routes::{
    dashboard, index, index_anonymous, login_page, logout, process_login, serve_background,
    serve_static,
};
use telemetry::{TelemetryFairing, init_tracing};
use thiserror::Error;

use sqlx::SqlitePool;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Anyhow(anyhow::Error),
    #[error("{0}")]
    Figment(rocket::figment::Error),
    #[error("{0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Application error: {0}")]
    App(#[from] AppError),
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Error::Anyhow(value)
    }
}

impl From<rocket::figment::Error> for Error {
    fn from(value: rocket::figment::Error) -> Self {
        Error::Figment(value)
    }
}

#[launch]
async fn rocket() -> _ {
    if let Err(e) = env::load_environment() {
        eprintln!("Failed to load environment files: {}", e);
    }

    init_tracing();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());

    let pool = SqlitePool::connect(&database_url)
        .await
        .expect("Failed to connect to SQLite database");

    info!("Running database migrations...");
    match sqlx::migrate!("./migrations").run(&pool).await {
        Ok(_) => info!("Migrations completed successfully"),
        Err(e) => {
            error!("Failed to run migrations: {}", e);
            panic!("Database migration failed: {}", e);
        }
    }

    match seed_default_user(&pool).await {
        Ok(true) => info!("Credential table was empty, seeded default account"),
        Ok(false) => {}
        Err(e) => error!("Failed to seed default credential: {}", e),
    }

    let pool_clone = pool.clone();

    tokio::spawn(async move {
        tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;

        loop {
            match clean_expired_sessions(&pool_clone).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Cleaned up {} expired sessions", count);
                    }
                }
                Err(e) => {
                    error!("Failed to clean expired sessions: {}", e);
                }
            }

            tokio::time::sleep(tokio::time::Duration::from_secs(3600)).await;
        }
    });

    let artifact_path =
        std::env::var("ARTIFACT_PATH").unwrap_or_else(|_| "data/model.json".to_string());

    // Missing or malformed artifact degrades to a predictor that answers
    // with the failure sentinel; startup never aborts over it.
    let predictor = match ClassifierArtifact::load(&artifact_path) {
        Ok(artifact) => Predictor::new(artifact),
        Err(e) => {
            warn!(path = %artifact_path, error = %e, "Prediction disabled: artifact unavailable");
            Predictor::disabled()
        }
    };

    let dataset_path =
        std::env::var("DATASET_PATH").unwrap_or_else(|_| "data/patients.csv".to_string());

    let store = match RecordStore::from_csv(&dataset_path) {
        Ok(store) => store,
        Err(e) => {
            warn!(path = %dataset_path, error = %e, "Starting with an empty record store");
            RecordStore::new()
        }
    };

    init_rocket(pool, predictor, store).await
}

pub async fn init_rocket(
    pool: SqlitePool,
    predictor: Predictor,
    store: RecordStore,
) -> Rocket<Build> {
    info!("Starting proneness dashboard");

    rocket::build()
        .manage(pool)
        .manage(predictor)
        .manage(store)
        .mount(
            "/",
            routes![
                index,
                index_anonymous,
                login_page,
                process_login,
                logout,
                dashboard,
                serve_background,
                serve_static,
            ],
        )
        .register("/", catchers![unauthorized])
        .mount(
            "/api",
            routes![
                api_login,
                api_logout,
                api_me,
                api_me_unauthorized,
                api_predict,
                api_get_records,
                api_get_chart,
                health,
            ],
        )
        .register("/api", catchers![unauthorized_api])
        .attach(TelemetryFairing)
}
