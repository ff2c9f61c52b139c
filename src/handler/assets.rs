// Asset passthrough module
//
// Serves files under `{public_dir}/assets` straight from disk with long-lived
// cache headers. Every HTML page is preloaded at startup; this path exists
// for the images, styles, and scripts those pages reference.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::Path;
use tokio::fs;

use crate::config::AppState;
use crate::http::{mime, response};
use crate::logger;

/// GET /assets/*
pub async fn serve(state: &AppState, path: &str, is_head: bool) -> Response<Full<Bytes>> {
    match load(&state.config.content.public_dir, path).await {
        Some((data, content_type)) => {
            response::build_asset_response(Bytes::from(data), content_type, is_head)
        }
        None => response::build_404_response(),
    }
}

/// Load an asset, refusing anything that resolves outside `{public_dir}/assets`
async fn load(public_dir: &str, path: &str) -> Option<(Vec<u8>, &'static str)> {
    // Neutralize traversal before joining; containment is still verified on
    // the canonical path below.
    let clean_path = path.trim_start_matches('/').replace("..", "");
    let file_path = Path::new(public_dir).join(&clean_path);

    let assets_root = match Path::new(public_dir).join("assets").canonicalize() {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Assets directory missing under '{public_dir}': {e}"
            ));
            return None;
        }
    };

    // Missing files are ordinary 404s, not worth a log line
    let file_canonical = file_path.canonicalize().ok()?;
    if !file_canonical.starts_with(&assets_root) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {path} -> {}",
            file_canonical.display()
        ));
        return None;
    }

    let content = match fs::read(&file_canonical).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read asset '{}': {e}",
                file_canonical.display()
            ));
            return None;
        }
    };

    let content_type = mime::content_type_for(file_canonical.extension().and_then(|e| e.to_str()));
    Some((content, content_type))
}
