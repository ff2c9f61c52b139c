// Logging module
// Small println!/eprintln! helpers; the access log goes through format.rs

mod format;

pub use format::AccessLogEntry;

use std::net::SocketAddr;

use crate::config::Config;

/// Below this count the startup summary lists every loaded route.
const SUMMARY_LIST_THRESHOLD: usize = 10;

pub fn log_server_start(addr: &SocketAddr, config: &Config, loaded_files: usize) {
    println!("======================================");
    println!("{} started successfully", config.server.name);
    println!("Listening on: http://{addr}");
    println!("Preloaded HTML files: {loaded_files}");
    println!("Public directory: {}", config.content.public_dir);
    if let Some(workers) = config.server.workers {
        println!("Worker threads: {workers}");
    }
    if config.affinity.single_core {
        println!("Single-core mode: pinned to core {}", config.affinity.cpu_core);
    }
    println!("======================================\n");
}

/// Startup summary for the content scan. Cosmetic only; the file list is
/// printed only below a small threshold.
pub fn log_content_summary(names: &[&str]) {
    println!("[CONTENT] Loaded {} HTML file(s)", names.len());
    if names.len() < SUMMARY_LIST_THRESHOLD {
        for name in names {
            println!("[CONTENT]   /{name}");
        }
    }
}

pub fn log_access(entry: &AccessLogEntry) {
    println!("{}", entry.combined());
}

pub fn log_api_request(method: &str, path: &str, status: u16) {
    println!("[API] {method} {path} - {status}");
}

pub fn log_port_in_use(port: u16) {
    eprintln!("[WARN] Port {port} is in use, trying the next one");
}

pub fn log_port_fallback(configured: u16, bound: u16) {
    println!("[INFO] Configured port {configured} was taken; bound {bound} instead");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    eprintln!("[ERROR] Failed to serve connection: {err:?}");
}

pub fn log_signal(name: &str) {
    println!("\n[SIGNAL] {name} received, shutting down");
}

pub fn log_shutdown() {
    println!("[SERVER] Listener closed, exiting cleanly");
}

pub fn log_warning(message: &str) {
    eprintln!("[WARN] {message}");
}

pub fn log_error(message: &str) {
    eprintln!("[ERROR] {message}");
}
