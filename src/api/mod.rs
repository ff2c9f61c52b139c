// Health endpoint module
// Authenticated status report: uptime, memory, loaded page count

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::HeaderMap;
use hyper::{Response, StatusCode};

use crate::config::{AppState, DEFAULT_API_KEY};
use crate::http::response;
use crate::logger;

/// Outcome of checking the caller-supplied key
#[derive(Debug, PartialEq, Eq)]
enum KeyCheck {
    Ok,
    Unauthorized,
    /// Key matched, but the configured secret is still the shipped default
    DefaultKey,
}

/// GET /health
pub fn handle_health(
    state: &AppState,
    headers: &HeaderMap,
    query: Option<&str>,
) -> Response<Full<Bytes>> {
    let supplied = caller_key(headers, query);

    match check_key(supplied.as_deref(), &state.config.health.api_key) {
        KeyCheck::Unauthorized => {
            logger::log_api_request("GET", "/health", 401);
            response::json_response(
                StatusCode::UNAUTHORIZED,
                &serde_json::json!({
                    "error": "Unauthorized",
                    "message": "Missing or invalid API key",
                }),
            )
        }
        KeyCheck::DefaultKey => {
            logger::log_api_request("GET", "/health", 403);
            response::json_response(
                StatusCode::FORBIDDEN,
                &serde_json::json!({
                    "error": "Forbidden",
                    "message": "Server is still using the default API key; set SERVER_HEALTH__API_KEY",
                }),
            )
        }
        KeyCheck::Ok => {
            logger::log_api_request("GET", "/health", 200);
            response::json_response(
                StatusCode::OK,
                &serde_json::json!({
                    "status": "healthy",
                    "uptime": format_uptime(state.uptime_secs()),
                    "memoryUsageMb": memory_usage_mb(),
                    "loadedHtmlFiles": state.content.len(),
                }),
            )
        }
    }
}

/// Caller key from the `x-api-key` header, falling back to the `key` query
/// parameter
fn caller_key(headers: &HeaderMap, query: Option<&str>) -> Option<String> {
    if let Some(value) = headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
        return Some(value.to_string());
    }

    query?
        .split('&')
        .find_map(|pair| pair.strip_prefix("key="))
        .map(ToString::to_string)
}

fn check_key(supplied: Option<&str>, configured: &str) -> KeyCheck {
    match supplied {
        Some(key) if key == configured => {
            if configured == DEFAULT_API_KEY {
                KeyCheck::DefaultKey
            } else {
                KeyCheck::Ok
            }
        }
        _ => KeyCheck::Unauthorized,
    }
}

/// Human-readable uptime, largest nonzero unit first
pub fn format_uptime(total_secs: u64) -> String {
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m {seconds}s")
    } else if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Resident set size in MB, one decimal. Informational; reports 0 where the
/// proc filesystem is unavailable.
#[cfg(target_os = "linux")]
fn memory_usage_mb() -> f64 {
    let Ok(statm) = std::fs::read_to_string("/proc/self/statm") else {
        return 0.0;
    };
    let resident_pages: u64 = statm
        .split_whitespace()
        .nth(1)
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    // statm counts pages; 4 KiB pages on every platform we deploy to
    #[allow(clippy::cast_precision_loss)]
    let mb = (resident_pages * 4096) as f64 / (1024.0 * 1024.0);
    (mb * 10.0).round() / 10.0
}

#[cfg(not(target_os = "linux"))]
fn memory_usage_mb() -> f64 {
    0.0
}
