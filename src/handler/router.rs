// Request router
//
// Every route resolves by lookup against the preloaded content table; apart
// from the assets passthrough, no handler touches the disk at request time.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::HeaderMap;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::api;
use crate::config::AppState;
use crate::content::INDEX_ROUTE;
use crate::handler::assets;
use crate::http::response;
use crate::logger;

/// Body of the fixed greeting endpoint
pub const HELLO_WORLD: &str = "Hello World!";

/// Fixed endpoints advertised by the root listing alongside loaded routes
const API_ENDPOINTS: [&str; 4] = ["/helloworld", "/helloworld-heavy", "/health", "/assets/*"];

pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(ToString::to_string);
    let is_head = method == Method::HEAD;
    let remote = client_addr(req.headers(), peer_addr, state.config.http.trust_proxy);

    let response = if let Some(early) = check_http_method(&method) {
        early
    } else if let Some(early) = check_body_size(&req, state.config.http.max_body_size) {
        early
    } else {
        route_request(&state, &path, query.as_deref(), req.headers(), is_head).await
    };

    if state.config.logging.access_log {
        let mut entry = logger::AccessLogEntry::new(remote, method.to_string(), path);
        entry.status = response.status().as_u16();
        entry.body_bytes = content_length_of(&response);
        logger::log_access(&entry);
    }

    Ok(response)
}

/// Check HTTP method and return an early response for anything but GET/HEAD
fn check_http_method(method: &Method) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(response::build_options_response()),
        _ => Some(response::build_405_response()),
    }
}

/// Validate Content-Length against the configured body-size limit
fn check_body_size(
    req: &Request<hyper::body::Incoming>,
    max_body_size: u64,
) -> Option<Response<Full<Bytes>>> {
    let size_str = req
        .headers()
        .get("content-length")?
        .to_str()
        .ok()?;

    match size_str.parse::<u64>() {
        Ok(size) if size > max_body_size => {
            logger::log_warning(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            Some(response::build_413_response())
        }
        _ => None,
    }
}

/// Resolve a request against fixed endpoints and the content table.
///
/// Exposed for tests: the routing decision only needs the path, query, and
/// headers, never the request body.
pub async fn route_request(
    state: &AppState,
    path: &str,
    query: Option<&str>,
    headers: &HeaderMap,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let server_name = &state.config.server.name;

    match path {
        "/" => serve_root(state, is_head),
        "/helloworld" => response::build_text_response(HELLO_WORLD, server_name, is_head),
        "/helloworld-heavy" => serve_hello_heavy(state, is_head),
        "/health" => api::handle_health(state, headers, query),
        p if p.starts_with("/assets/") => assets::serve(state, p, is_head).await,
        p => serve_content(state, p, is_head),
    }
}

/// `/{name}`: preloaded page lookup. The reserved `index` name only exists
/// behind `/`.
fn serve_content(state: &AppState, path: &str, is_head: bool) -> Response<Full<Bytes>> {
    let name = path.trim_start_matches('/');
    if name == INDEX_ROUTE {
        return response::build_404_response();
    }

    match state.content.get(name) {
        Some(content) => {
            response::build_html_response(content.clone(), &state.config.server.name, is_head)
        }
        None => response::build_404_response(),
    }
}

/// `/`: the `index` entry when loaded, otherwise a JSON listing of what the
/// server exposes
fn serve_root(state: &AppState, is_head: bool) -> Response<Full<Bytes>> {
    if let Some(content) = state.content.get(INDEX_ROUTE) {
        return response::build_html_response(
            content.clone(),
            &state.config.server.name,
            is_head,
        );
    }

    let listing = serde_json::json!({
        "name": state.config.server.name,
        "routes": state.content.route_names(),
        "endpoints": API_ENDPOINTS,
    });
    response::json_response(hyper::StatusCode::OK, &listing)
}

/// `/helloworld-heavy`: legacy alias for the `helloworld` page when one was
/// loaded, plain-text fallback otherwise
fn serve_hello_heavy(state: &AppState, is_head: bool) -> Response<Full<Bytes>> {
    match state.content.get("helloworld") {
        Some(content) => {
            response::build_html_response(content.clone(), &state.config.server.name, is_head)
        }
        None => response::build_text_response(HELLO_WORLD, &state.config.server.name, is_head),
    }
}

/// Client address for the access log; `X-Forwarded-For` only counts when the
/// proxy is trusted
fn client_addr(headers: &HeaderMap, peer: SocketAddr, trust_proxy: bool) -> String {
    if trust_proxy {
        if let Some(first) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            return first.to_string();
        }
    }
    peer.ip().to_string()
}

fn content_length_of(response: &Response<Full<Bytes>>) -> usize {
    response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AffinityConfig, Config, ContentConfig, HealthConfig, HttpConfig, LoggingConfig,
        PerformanceConfig, ServerConfig, DEFAULT_API_KEY,
    };
    use crate::content::ContentTable;
    use http_body_util::BodyExt;

    fn test_config(api_key: &str) -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                name: "test/0".to_string(),
                workers: None,
            },
            http: HttpConfig {
                max_body_size: 1024,
                trust_proxy: false,
            },
            performance: PerformanceConfig {
                keep_alive_timeout: 65,
                request_timeout: 30,
                connection_timeout: 300,
            },
            logging: LoggingConfig { access_log: false },
            content: ContentConfig {
                public_dir: "public".to_string(),
            },
            health: HealthConfig {
                api_key: api_key.to_string(),
            },
            affinity: AffinityConfig {
                single_core: false,
                cpu_core: 0,
            },
        }
    }

    fn test_state(pages: &[(&str, &str)]) -> AppState {
        let entries = pages
            .iter()
            .map(|(name, body)| ((*name).to_string(), Bytes::from((*body).to_string())));
        AppState::new(test_config("test-key"), ContentTable::from_entries(entries))
    }

    async fn body_string(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn get(state: &AppState, path: &str) -> Response<Full<Bytes>> {
        route_request(state, path, None, &HeaderMap::new(), false).await
    }

    #[tokio::test]
    async fn test_loaded_route_returns_stored_bytes() {
        let state = test_state(&[("about", "<h1>about</h1>")]);
        let resp = get(&state, "/about").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers()["Content-Type"],
            "text/html; charset=utf-8"
        );
        assert_eq!(body_string(resp).await, "<h1>about</h1>");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let state = test_state(&[("about", "<p>a</p>")]);
        let resp = get(&state, "/missing").await;
        assert_eq!(resp.status(), 404);
        assert_eq!(body_string(resp).await, "404 Not Found");
    }

    #[tokio::test]
    async fn test_index_is_reserved() {
        let state = test_state(&[("index", "<h1>home</h1>")]);
        let resp = get(&state, "/index").await;
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_helloworld_is_constant() {
        let state = test_state(&[("helloworld", "<h1>rich page</h1>")]);
        let resp = get(&state, "/helloworld").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(body_string(resp).await, HELLO_WORLD);
    }

    #[tokio::test]
    async fn test_helloworld_heavy_alias() {
        let state = test_state(&[("helloworld", "<h1>rich page</h1>")]);
        let resp = get(&state, "/helloworld-heavy").await;
        assert_eq!(
            resp.headers()["Content-Type"],
            "text/html; charset=utf-8"
        );
        assert_eq!(body_string(resp).await, "<h1>rich page</h1>");

        let bare = test_state(&[("about", "<p>a</p>")]);
        let resp = get(&bare, "/helloworld-heavy").await;
        assert_eq!(body_string(resp).await, HELLO_WORLD);
    }

    #[tokio::test]
    async fn test_root_serves_index_entry() {
        let state = test_state(&[("index", "<h1>home</h1>")]);
        let resp = get(&state, "/").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(body_string(resp).await, "<h1>home</h1>");
    }

    #[tokio::test]
    async fn test_root_listing_without_index() {
        let state = test_state(&[("b-page", "<p>b</p>"), ("a-page", "<p>a</p>")]);
        let resp = get(&state, "/").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Type"], "application/json");

        let body: serde_json::Value =
            serde_json::from_str(&body_string(resp).await).expect("valid JSON");
        assert_eq!(body["routes"], serde_json::json!(["a-page", "b-page"]));
        assert_eq!(
            body["endpoints"],
            serde_json::json!(["/helloworld", "/helloworld-heavy", "/health", "/assets/*"])
        );
    }

    #[tokio::test]
    async fn test_health_requires_key() {
        let state = test_state(&[("about", "<p>a</p>")]);

        let resp = get(&state, "/health").await;
        assert_eq!(resp.status(), 401);

        let resp = route_request(&state, "/health", Some("key=wrong"), &HeaderMap::new(), false)
            .await;
        assert_eq!(resp.status(), 401);

        let resp =
            route_request(&state, "/health", Some("key=test-key"), &HeaderMap::new(), false)
                .await;
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value =
            serde_json::from_str(&body_string(resp).await).expect("valid JSON");
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["loadedHtmlFiles"], 1);
    }

    #[tokio::test]
    async fn test_health_rejects_default_key() {
        let entries = [("about".to_string(), Bytes::from("<p>a</p>"))];
        let state = AppState::new(
            test_config(DEFAULT_API_KEY),
            ContentTable::from_entries(entries),
        );

        let resp = route_request(
            &state,
            "/health",
            Some(&format!("key={DEFAULT_API_KEY}")),
            &HeaderMap::new(),
            false,
        )
        .await;
        assert_eq!(resp.status(), 403);
    }

    #[tokio::test]
    async fn test_health_accepts_header_key() {
        let state = test_state(&[("about", "<p>a</p>")]);
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "test-key".parse().unwrap());

        let resp = route_request(&state, "/health", None, &headers, false).await;
        assert_eq!(resp.status(), 200);
    }

    #[test]
    fn test_method_gate() {
        assert!(check_http_method(&Method::GET).is_none());
        assert!(check_http_method(&Method::HEAD).is_none());

        let resp = check_http_method(&Method::POST).expect("rejected");
        assert_eq!(resp.status(), 405);

        let resp = check_http_method(&Method::OPTIONS).expect("handled");
        assert_eq!(resp.status(), 204);
    }

    #[test]
    fn test_client_addr_trust() {
        let peer: SocketAddr = "10.0.0.9:1234".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());

        assert_eq!(client_addr(&headers, peer, false), "10.0.0.9");
        assert_eq!(client_addr(&headers, peer, true), "203.0.113.7");
        assert_eq!(client_addr(&HeaderMap::new(), peer, true), "10.0.0.9");
    }
}
