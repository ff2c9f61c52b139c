use std::sync::Arc;

use preload_webserver::config::{AppState, Config};
use preload_webserver::{affinity, bench, content, logger, server};

/// Launcher mode, first CLI argument
#[derive(Debug, PartialEq, Eq)]
enum Mode {
    Api { port: Option<u16> },
    Benchmark,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    install_panic_hook();

    let args: Vec<String> = std::env::args().collect();
    let mode = match parse_mode(&args) {
        Ok(mode) => mode,
        Err(usage) => {
            eprintln!("{usage}");
            std::process::exit(2);
        }
    };

    let mut cfg = Config::load()?;

    match mode {
        Mode::Api { port } => {
            if let Some(port) = port {
                cfg.server.port = port;
            }

            // Single-core mode: the parent only supervises; the child (marked
            // by environment) falls through to the normal server path.
            if cfg.affinity.single_core && !affinity::is_supervised_child() {
                let status = affinity::run_single_core(&cfg.affinity, &args[1..])?;
                std::process::exit(status.code().unwrap_or(1));
            }

            build_runtime(cfg.server.workers)?.block_on(run_server(cfg))
        }
        Mode::Benchmark => {
            let base_url = format!("http://{}:{}", cfg.server.host, cfg.server.port);
            build_runtime(None)?.block_on(async move {
                if let Err(e) = bench::run(&base_url).await {
                    logger::log_error(&format!("Benchmark failed: {e}"));
                    std::process::exit(1);
                }
                Ok(())
            })
        }
    }
}

fn parse_mode(args: &[String]) -> Result<Mode, String> {
    let usage = format!(
        "Usage: {} [api [port] | benchmark]",
        args.first().map_or("preload_webserver", String::as_str)
    );

    match args.get(1).map(String::as_str) {
        None | Some("api") => {
            let port = match args.get(2) {
                None => None,
                Some(raw) => Some(
                    raw.parse::<u16>()
                        .map_err(|_| format!("Invalid port '{raw}'\n{usage}"))?,
                ),
            };
            Ok(Mode::Api { port })
        }
        Some("benchmark") => Ok(Mode::Benchmark),
        Some(other) => Err(format!("Unknown mode '{other}'\n{usage}")),
    }
}

/// Multi-thread Tokio runtime, worker count from configuration
fn build_runtime(workers: Option<usize>) -> std::io::Result<tokio::runtime::Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(workers) = workers {
        builder.worker_threads(workers);
        println!("[CONFIG] Using {workers} worker threads");
    }
    builder.build()
}

async fn run_server(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    // Refuse to start rather than serve unsafe or empty content
    let table = match content::load_content(&cfg.content.public_dir) {
        Ok(table) => table,
        Err(e) => {
            logger::log_error(&format!("Startup aborted: {e}"));
            std::process::exit(1);
        }
    };
    logger::log_content_summary(&table.route_names());

    let addr = cfg.get_socket_addr()?;
    let (listener, bound_addr) = match server::bind_with_retry(addr) {
        Ok(bound) => bound,
        Err(e) => {
            logger::log_error(&format!("Startup aborted: {e}"));
            std::process::exit(1);
        }
    };

    let state = Arc::new(AppState::new(cfg, table));
    logger::log_server_start(&bound_addr, &state.config, state.content.len());

    server::run(listener, state).await?;
    Ok(())
}

/// Fail fast: a panic anywhere, worker tasks included, must not leave a
/// half-alive server behind.
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        default_hook(info);
        logger::log_error("Unrecoverable error, exiting");
        std::process::exit(1);
    }));
}
