use metrics::{counter, histogram};
use std::time::Instant;

/// Count login attempts by outcome.
pub fn increment_login(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!("auth_login_attempts_total", "outcome" => outcome).increment(1);
}

/// Count route guard redirects by target page.
pub fn increment_guard_redirect(target: &'static str) {
    counter!("route_guard_redirects_total", "target" => target).increment(1);
}

/// Track HTTP request latency using a histogram.
pub fn track_http_request(start: Instant, path: &str, method: &str, status: u16) {
    let elapsed = start.elapsed();
    histogram!(
        "http_request_duration_seconds",
        "path" => path.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .record(elapsed);
}
