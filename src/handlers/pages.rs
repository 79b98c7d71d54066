//! Server-rendered pages.
//!
//! Layout is intentionally bare. Dashboard pages re-check the session even
//! though the route guard already did.

use axum::{
    extract::{Path, State},
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
};
use tower_cookies::Cookies;

use crate::app_state::AppState;
use crate::guard::login_redirect_target;
use crate::session::{self, SessionInfo};

/// Dashboard sections with a page of their own.
const DASHBOARD_SECTIONS: &[&str] = &["items", "vacancies", "applications", "analytics", "settings"];

const LOGIN_PAGE: &str = r#"<!doctype html>
<html>
<head><title>Sign in</title></head>
<body>
  <h1>Sign in</h1>
  <form id="login">
    <input name="username" placeholder="Username" autocomplete="username" required>
    <input name="password" type="password" placeholder="Password" autocomplete="current-password" required>
    <button type="submit">Sign in</button>
  </form>
  <p id="error" role="alert"></p>
  <script>
    document.getElementById("login").addEventListener("submit", async (event) => {
      event.preventDefault();
      const form = new FormData(event.target);
      const redirectTo = new URLSearchParams(location.search).get("redirect_to");
      const res = await fetch("/api/login", {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify({
          username: form.get("username"),
          password: form.get("password"),
          redirect_to: redirectTo,
        }),
      });
      const body = await res.json();
      if (res.ok) {
        location.assign(body.redirect_to);
      } else {
        document.getElementById("error").textContent = body.message;
      }
    });
  </script>
</body>
</html>
"#;

const REGISTER_PAGE: &str = r#"<!doctype html>
<html>
<head><title>Register</title></head>
<body>
  <h1>Register</h1>
  <p>Ask a signed-in administrator for a verification code. Codes expire after ten minutes.</p>
  <form id="register">
    <input name="username" placeholder="Username" autocomplete="username" required>
    <input name="password" type="password" placeholder="Password" autocomplete="new-password" required>
    <input name="verificationCode" placeholder="Verification code" inputmode="numeric" required>
    <button type="submit">Register</button>
  </form>
  <p id="error" role="alert"></p>
  <p><a href="/login">Back to sign in</a></p>
  <script>
    document.getElementById("register").addEventListener("submit", async (event) => {
      event.preventDefault();
      const form = new FormData(event.target);
      const res = await fetch("/api/register", {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify(Object.fromEntries(form)),
      });
      if (res.ok) {
        location.assign("/login");
      } else {
        document.getElementById("error").textContent = (await res.json()).message;
      }
    });
  </script>
</body>
</html>
"#;

/// GET /login
pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

/// GET /register
pub async fn register_page() -> Html<&'static str> {
    Html(REGISTER_PAGE)
}

fn render_dashboard(session: &SessionInfo, section: Option<&str>) -> Html<String> {
    // ---
    let title = section.unwrap_or("overview");
    let nav: String = DASHBOARD_SECTIONS
        .iter()
        .map(|s| format!(r#"<li><a href="/dashboard/{s}">{s}</a></li>"#))
        .collect();

    Html(format!(
        r#"<!doctype html>
<html>
<head><title>Dashboard - {title}</title></head>
<body>
  <header>Signed in as {user} <form method="post" action="/api/logout"><button>Sign out</button></form></header>
  <nav><ul><li><a href="/dashboard">overview</a></li>{nav}</ul></nav>
  <main><h1>{title}</h1></main>
</body>
</html>
"#,
        user = escape_html(&session.username),
    ))
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Redirects to login when the request has no valid session.
fn session_or_login(cookies: &Cookies, state: &AppState, uri: &Uri) -> Result<SessionInfo, Response> {
    // ---
    session::validate_session(cookies, state.session_keys()).ok_or_else(|| {
        let original = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/dashboard");
        Redirect::temporary(&login_redirect_target(original)).into_response()
    })
}

/// GET /dashboard
pub async fn dashboard(State(state): State<AppState>, cookies: Cookies, uri: Uri) -> Response {
    // ---
    match session_or_login(&cookies, &state, &uri) {
        Ok(session) => render_dashboard(&session, None).into_response(),
        Err(redirect) => redirect,
    }
}

/// GET /dashboard/{section}
pub async fn dashboard_section(
    State(state): State<AppState>,
    cookies: Cookies,
    uri: Uri,
    Path(section): Path<String>,
) -> Response {
    // ---
    let session = match session_or_login(&cookies, &state, &uri) {
        Ok(session) => session,
        Err(redirect) => return redirect,
    };

    if !DASHBOARD_SECTIONS.contains(&section.as_str()) {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    }

    render_dashboard(&session, Some(&section)).into_response()
}
