use rocket::local::asynchronous::Client;
use sqlx::{Pool, Sqlite, SqlitePool};

use crate::db::create_user;
use crate::init_rocket;
use crate::model::artifact::{
    ClassifierArtifact, LabelEncoder, LinearClassifier, StandardScaler,
};
use crate::model::features::PatientInput;
use crate::model::predict::Predictor;
use crate::records::RecordStore;

pub const STANDARD_PASSWORD: &str = "password";

/// A small but fully functional artifact with the production schema. The
/// linear model is a nearest-centroid classifier over the summed
/// standardized symptom scores, so every category is reachable:
/// all-0 scores predict Low, ~2.5 Moderate, 5 Elevated, ~7.5 High, 10 Very
/// High.
pub fn test_artifact() -> ClassifierArtifact {
    let centroids: [(f64, &str); 5] = [
        (0.0, "Elevated Proneness"),
        (4.0, "High Proneness"),
        (-8.0, "Low Proneness"),
        (-4.0, "Moderate Proneness"),
        (8.0, "Very High Proneness"),
    ];

    let coefficients = centroids
        .iter()
        .map(|(m, _)| vec![0.0, 0.0, 2.0 * m, 2.0 * m, 2.0 * m, 2.0 * m, 2.0 * m])
        .collect();
    let intercepts = centroids.iter().map(|(m, _)| -(m * m)).collect();
    let categories = centroids.iter().map(|(_, c)| c.to_string()).collect();

    ClassifierArtifact::new(
        LabelEncoder::new(vec!["Female".to_string(), "Male".to_string()]),
        LabelEncoder::new(vec![
            "Divorced".to_string(),
            "Married".to_string(),
            "Single".to_string(),
            "Widowed".to_string(),
        ]),
        LabelEncoder::new(categories),
        StandardScaler::new(
            vec![0.5, 1.5, 0.5, 0.5, 0.5, 0.5, 0.5],
            vec![0.5, 1.0, 0.25, 0.25, 0.25, 0.25, 0.25],
        ),
        LinearClassifier::new(coefficients, intercepts),
    )
    .expect("test artifact must satisfy the schema check")
}

/// Patient submission with every symptom set to the same 0-10 score.
pub fn sample_patient(score: f64) -> PatientInput {
    PatientInput {
        name: "Jordan".to_string(),
        age: 30,
        gender: "Male".to_string(),
        marital_status: "Single".to_string(),
        fatigue: score,
        slowing: score,
        pain: score,
        hygiene: score,
        movement: score,
    }
}

pub async fn setup_test_db() -> Pool<Sqlite> {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    create_user(&pool, "admin", STANDARD_PASSWORD)
        .await
        .expect("Failed to create test user");

    pool
}

pub async fn setup_test_client(pool: Pool<Sqlite>) -> Client {
    setup_test_client_with(pool, Predictor::new(test_artifact()), RecordStore::new()).await
}

pub async fn setup_test_client_with(
    pool: Pool<Sqlite>,
    predictor: Predictor,
    store: RecordStore,
) -> Client {
    let rocket = init_rocket(pool, predictor, store).await;

    Client::tracked(rocket)
        .await
        .expect("valid rocket instance")
}

/// Logs in through the JSON endpoint; the tracked client keeps the session
/// cookies for subsequent requests.
pub async fn login_test_user(client: &Client, username: &str, password: &str) {
    use rocket::http::{ContentType, Status};
    use serde_json::json;

    let response = client
        .post("/api/login")
        .header(ContentType::JSON)
        .body(
            json!({
                "username": username,
                "password": password
            })
            .to_string(),
        )
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Ok);
}
