use rocket::State;
use rocket::http::Status;
use rocket::response::Redirect;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::{User, UserSession};
use crate::db::{authenticate_user, invalidate_session};
use crate::model::features::PatientInput;
use crate::model::precautions::precautions_for;
use crate::model::predict::Predictor;
use crate::records::{ChartSpec, PatientRecord, RecordStore};
use crate::validation::{AppErrorExt, JsonValidateExt, ValidationResponse};

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: Option<UserData>,
    pub error: Option<String>,
    pub redirect_url: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UserData {
    pub id: i64,
    pub username: String,
}

impl From<User> for UserData {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

#[post("/login", data = "<login>")]
pub async fn api_login(
    login: Json<LoginRequest>,
    cookies: &rocket::http::CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<LoginResponse>, Custom<Json<ValidationResponse>>> {
    let validated = login.validate_custom()?;

    match authenticate_user(db, &validated.username, &validated.password)
        .await
        .validate_custom()?
    {
        Some(user) => {
            establish_session(db, cookies, &user).await.validate_custom()?;

            Ok(Json(LoginResponse {
                success: true,
                user: Some(UserData::from(user)),
                error: None,
                redirect_url: Some("/dashboard".to_string()),
            }))
        }
        None => Ok(Json(LoginResponse {
            success: false,
            user: None,
            error: Some("Invalid username or password".to_string()),
            redirect_url: None,
        })),
    }
}

/// Creates the server-side session row and sets the session cookies.
/// Shared by the JSON login and the HTML form login.
pub async fn establish_session(
    db: &Pool<Sqlite>,
    cookies: &rocket::http::CookieJar<'_>,
    user: &User,
) -> Result<String, crate::error::AppError> {
    use chrono::Utc;
    use rocket::http::{Cookie, SameSite};

    let token = UserSession::generate_token();
    let expires_at = Utc::now() + chrono::Duration::hours(1);

    crate::db::create_user_session(db, user.id, &token, expires_at.naive_utc()).await?;

    cookies.add_private(
        Cookie::build(("session_token", token.clone()))
            .same_site(SameSite::Lax)
            .http_only(true)
            .max_age(rocket::time::Duration::hours(1)),
    );

    cookies.add_private(
        Cookie::build(("logged_in", user.username.clone()))
            .same_site(SameSite::Lax)
            .max_age(rocket::time::Duration::hours(1)),
    );

    Ok(token)
}

pub fn clear_session_cookies(cookies: &rocket::http::CookieJar<'_>) {
    cookies.remove_private(rocket::http::Cookie::build("session_token"));
    cookies.remove_private(rocket::http::Cookie::build("logged_in"));
}

#[post("/logout")]
pub async fn api_logout(
    cookies: &rocket::http::CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
) -> Redirect {
    let token = cookies
        .get_private("session_token")
        .map(|cookie| cookie.value().to_string());

    if let Some(token) = token {
        let _ = invalidate_session(db, &token).await;
    }

    clear_session_cookies(cookies);

    Redirect::to("/login")
}

#[get("/me")]
pub async fn api_me(user: User) -> Json<UserData> {
    Json(UserData::from(user))
}

#[get("/me", rank = 2)]
pub async fn api_me_unauthorized() -> Status {
    Status::Unauthorized
}

#[derive(Deserialize, Validate, Clone)]
pub struct PredictRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(range(min = 1, max = 120, message = "Age must be between 1 and 120"))]
    pub age: u32,
    pub gender: String,
    pub marital_status: String,
    #[validate(range(min = 0.0, max = 10.0, message = "Fatigue must be between 0 and 10"))]
    pub fatigue: f64,
    #[validate(range(min = 0.0, max = 10.0, message = "Slowing must be between 0 and 10"))]
    pub slowing: f64,
    #[validate(range(min = 0.0, max = 10.0, message = "Pain must be between 0 and 10"))]
    pub pain: f64,
    #[validate(range(min = 0.0, max = 10.0, message = "Hygiene must be between 0 and 10"))]
    pub hygiene: f64,
    #[validate(range(min = 0.0, max = 10.0, message = "Movement must be between 0 and 10"))]
    pub movement: f64,
}

impl From<PredictRequest> for PatientInput {
    fn from(request: PredictRequest) -> Self {
        Self {
            name: request.name,
            age: request.age,
            gender: request.gender,
            marital_status: request.marital_status,
            fatigue: request.fatigue,
            slowing: request.slowing,
            pain: request.pain,
            hygiene: request.hygiene,
            movement: request.movement,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct PredictResponse {
    pub name: String,
    pub category: String,
    pub precautions: String,
}

#[post("/predict", data = "<request>")]
pub async fn api_predict(
    request: Json<PredictRequest>,
    user: User,
    predictor: &State<Predictor>,
    store: &State<RecordStore>,
) -> Result<Json<PredictResponse>, Custom<Json<ValidationResponse>>> {
    let validated = request.validate_custom()?;
    let input = PatientInput::from(validated);

    tracing::info!(username = %user.username, patient = %input.name, "Prediction requested");

    let category = predictor.predict(&input).validate_custom()?;
    let precautions = precautions_for(&category).to_string();

    store.append(PatientRecord::from_input(&input, category.clone()));

    Ok(Json(PredictResponse {
        name: input.name,
        category,
        precautions,
    }))
}

#[derive(Serialize, Deserialize)]
pub struct RecordsResponse {
    pub count: usize,
    pub records: Vec<PatientRecord>,
}

#[get("/records")]
pub async fn api_get_records(_user: User, store: &State<RecordStore>) -> Json<RecordsResponse> {
    let records = store.all();

    Json(RecordsResponse {
        count: records.len(),
        records,
    })
}

#[get("/chart")]
pub async fn api_get_chart(_user: User, store: &State<RecordStore>) -> Json<ChartSpec> {
    Json(store.render_chart())
}

#[get("/health")]
pub fn health() -> &'static str {
    "OK"
}
