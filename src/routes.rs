use rocket::State;
use rocket::form::Form;
use rocket::fs::NamedFile;
use rocket::response::Redirect;
use rocket::response::content::RawHtml;
use sqlx::{Pool, Sqlite};
use tracing::info;

use crate::api::{clear_session_cookies, establish_session};
use crate::auth::User;
use crate::db::{authenticate_user, invalidate_session};

#[get("/")]
pub fn index(_user: User) -> Redirect {
    Redirect::to("/dashboard")
}

#[get("/", rank = 2)]
pub fn index_anonymous() -> Redirect {
    Redirect::to("/login")
}

#[get("/login?<error>")]
pub fn login_page(error: Option<String>) -> RawHtml<String> {
    let error_block = match error {
        Some(message) => format!(r#"<div class="error">{}</div>"#, html_escape(&message)),
        None => String::new(),
    };

    RawHtml(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Login - Proneness Dashboard</title>
    <link rel="stylesheet" href="/static/style.css">
</head>
<body class="login-body">
    <div class="login-container">
        <h1>Login</h1>
        {error_block}
        <form method="POST" action="/login">
            <div class="form-group">
                <label>Username</label>
                <input type="text" name="username" required placeholder="Enter your username">
            </div>
            <div class="form-group">
                <label>Password</label>
                <input type="password" name="password" required placeholder="Enter your password">
            </div>
            <button type="submit">Login</button>
        </form>
    </div>
</body>
</html>"#
    ))
}

#[derive(FromForm)]
pub struct LoginForm {
    username: String,
    password: String,
}

#[post("/login", data = "<form>")]
pub async fn process_login(
    form: Form<LoginForm>,
    cookies: &rocket::http::CookieJar<'_>,
    db: &State<Pool<Sqlite>>,
) -> Result<Redirect, Redirect> {
    info!(username = %form.username, "Login attempt");

    match authenticate_user(db, &form.username, &form.password).await {
        Ok(Some(user)) => match establish_session(db, cookies, &user).await {
            Ok(_) => Ok(Redirect::to("/dashboard")),
            Err(err) => {
                err.log_and_record("form login");
                Err(Redirect::to("/login?error=Login%20failed"))
            }
        },
        Ok(None) => Err(Redirect::to(
            "/login?error=Invalid%20username%20or%20password",
        )),
        Err(err) => {
            err.log_and_record("form login");
            Err(Redirect::to("/login?error=Login%20failed"))
        }
    }
}

#[get("/logout")]
pub async fn logout(cookies: &rocket::http::CookieJar<'_>, db: &State<Pool<Sqlite>>) -> Redirect {
    let token = cookies
        .get_private("session_token")
        .map(|cookie| cookie.value().to_string());

    if let Some(token) = token {
        let _ = invalidate_session(db, &token).await;
    }

    clear_session_cookies(cookies);

    Redirect::to("/login")
}

/// The gated dashboard shell. Chart data, records and predictions come from
/// the JSON API; this page is intentionally minimal markup.
#[get("/dashboard")]
pub fn dashboard(user: User) -> RawHtml<String> {
    RawHtml(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Proneness Dashboard</title>
    <link rel="stylesheet" href="/static/style.css">
</head>
<body class="dashboard-body">
    <header>
        <h1>Proneness Prediction Dashboard</h1>
        <div class="session-bar">
            <span>Welcome, {username}!</span>
            <a href="/logout">Logout</a>
        </div>
    </header>
    <div id="chart" data-source="/api/chart"></div>
    <section class="patient-form">
        <h2>Patient Information</h2>
        <form id="predict-form" data-action="/api/predict">
            <input type="text" name="name" placeholder="Enter Name" required>
            <input type="number" name="age" placeholder="Enter Age" min="1" required>
            <select name="gender" required>
                <option value="Male">Male</option>
                <option value="Female">Female</option>
            </select>
            <select name="marital_status" required>
                <option value="Single">Single</option>
                <option value="Married">Married</option>
                <option value="Widowed">Widowed</option>
                <option value="Divorced">Divorced</option>
            </select>
            <input type="number" name="fatigue" placeholder="Fatigue (0-10)" min="0" max="10" step="0.1" required>
            <input type="number" name="slowing" placeholder="Slowing (0-10)" min="0" max="10" step="0.1" required>
            <input type="number" name="pain" placeholder="Pain (0-10)" min="0" max="10" step="0.1" required>
            <input type="number" name="hygiene" placeholder="Hygiene (0-10)" min="0" max="10" step="0.1" required>
            <input type="number" name="movement" placeholder="Movement (0-10)" min="0" max="10" step="0.1" required>
            <button type="submit">Submit Prediction</button>
        </form>
    </section>
    <div id="prediction-output"></div>
    <div id="precautions-output"></div>
    <script src="/static/dashboard.js"></script>
</body>
</html>"#,
        username = html_escape(&user.username)
    ))
}

#[get("/background.jpg")]
pub async fn serve_background() -> Option<NamedFile> {
    NamedFile::open("static/background.jpg").await.ok()
}

#[get("/static/<file>")]
pub async fn serve_static(file: &str) -> Option<NamedFile> {
    // No path traversal: single segment only, resolved under static/
    if file.contains("..") || file.contains('/') {
        return None;
    }

    NamedFile::open(format!("static/{}", file)).await.ok()
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
