use axum::response::IntoResponse;

pub async fn root_handler() -> impl IntoResponse {
    let version = env!("CARGO_PKG_VERSION");
    format!(
        r#"Admin portal
Version: {version}

Pages:
  - GET    /login               - Sign-in page (only without a session)
  - GET    /register            - Registration form (only without a session)
  - GET    /dashboard           - Dashboard (requires a session)
  - GET    /dashboard/{{section}} - items, vacancies, applications, analytics, settings

API:
  - POST   /api/login           - Exchange username/password for a session cookie
  - POST   /api/logout          - Clear the session cookie
  - GET    /api/session         - Current session or null
  - POST   /api/register        - Register with a one-time verification code
  - POST   /api/register/code   - Issue a verification code (requires a session)
  - GET    /api/users           - List users (requires a session)
  - POST   /api/users           - Create a user (requires a session)
  - DELETE /api/users/{{id}}      - Delete a user (requires a session)
  - GET    /health              - Light health check
  - GET    /health?mode=full    - Full health check (includes the user store)
  - GET    /metrics             - Prometheus metrics
"#
    )
}
