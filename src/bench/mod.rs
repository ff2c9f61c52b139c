// Benchmark driver module
//
// Standalone client mode: drives a sequence of parameterized load-test runs
// against a running instance and prints an aggregate report. Runs are
// sequential with a fixed delay between them; one mixed phase fires several
// runs concurrently and aggregates after all complete.

mod stats;

pub use stats::{rating_for, RunStats};

use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// One parameterized load-test run
#[derive(Debug, Clone)]
pub struct Phase {
    pub name: &'static str,
    pub path: &'static str,
    pub connections: usize,
    pub duration: Duration,
    /// Requests kept in flight per connection
    pub pipelining: usize,
}

const INTER_PHASE_DELAY: Duration = Duration::from_secs(2);

fn phases() -> Vec<Phase> {
    vec![
        Phase {
            name: "warmup",
            path: "/helloworld",
            connections: 10,
            duration: Duration::from_secs(3),
            pipelining: 1,
        },
        Phase {
            name: "hello world",
            path: "/helloworld",
            connections: 50,
            duration: Duration::from_secs(10),
            pipelining: 1,
        },
        Phase {
            name: "hello world pipelined",
            path: "/helloworld",
            connections: 50,
            duration: Duration::from_secs(10),
            pipelining: 4,
        },
        Phase {
            name: "preloaded page",
            path: "/",
            connections: 100,
            duration: Duration::from_secs(10),
            pipelining: 1,
        },
        Phase {
            name: "heavy alias",
            path: "/helloworld-heavy",
            connections: 50,
            duration: Duration::from_secs(10),
            pipelining: 2,
        },
    ]
}

/// Run the full benchmark sequence against `base_url`.
///
/// The first failing run aborts the remaining sequence.
pub async fn run(base_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    // A dead target should fail fast, not one phase in.
    client
        .get(format!("{base_url}/helloworld"))
        .send()
        .await
        .map_err(|e| format!("server not reachable at {base_url}: {e}"))?;

    let mut results: Vec<(&'static str, RunStats)> = Vec::new();

    let sequence = phases();
    for (i, phase) in sequence.iter().enumerate() {
        println!(
            "[BENCH] {} - {} connections, {}s, pipelining {} -> {}",
            phase.name,
            phase.connections,
            phase.duration.as_secs(),
            phase.pipelining,
            phase.path
        );

        let stats = run_phase(&client, base_url, phase).await?;
        results.push((phase.name, stats));

        if i + 1 < sequence.len() {
            tokio::time::sleep(INTER_PHASE_DELAY).await;
        }
    }

    tokio::time::sleep(INTER_PHASE_DELAY).await;
    println!("[BENCH] mixed load - three concurrent runs");
    let mixed = run_mixed(&client, base_url).await?;
    results.push(("mixed load", mixed));

    print_report(&results);
    Ok(())
}

/// Drive one run: `connections` workers, each keeping `pipelining` requests
/// in flight until the deadline.
async fn run_phase(
    client: &reqwest::Client,
    base_url: &str,
    phase: &Phase,
) -> Result<RunStats, Box<dyn std::error::Error>> {
    let url = format!("{base_url}{}", phase.path);
    let started = Instant::now();
    let deadline = started + phase.duration;

    let mut workers = JoinSet::new();
    for _ in 0..phase.connections {
        let client = client.clone();
        let url = url.clone();
        let pipelining = phase.pipelining.max(1);

        workers.spawn(async move {
            let mut local = RunStats::default();

            while Instant::now() < deadline {
                let mut batch = JoinSet::new();
                for _ in 0..pipelining {
                    batch.spawn(one_request(client.clone(), url.clone()));
                }
                while let Some(joined) = batch.join_next().await {
                    match joined {
                        Ok(Some(latency)) => local.record(latency),
                        Ok(None) | Err(_) => local.record_error(),
                    }
                }
            }

            local
        });
    }

    let mut stats = RunStats::default();
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(local) => stats.merge(local),
            Err(e) => return Err(format!("benchmark worker died: {e}").into()),
        }
    }
    stats.elapsed = started.elapsed();

    if stats.requests == 0 {
        return Err(format!("run '{}' produced no successful requests", phase.name).into());
    }

    Ok(stats)
}

/// Latency of one successful request, `None` on any error
async fn one_request(client: reqwest::Client, url: String) -> Option<Duration> {
    let started = Instant::now();
    let response = client.get(&url).send().await.ok()?;
    if !response.status().is_success() {
        return None;
    }
    response.bytes().await.ok()?;
    Some(started.elapsed())
}

/// Mixed load: several runs in flight at once, aggregated after all complete
async fn run_mixed(
    client: &reqwest::Client,
    base_url: &str,
) -> Result<RunStats, Box<dyn std::error::Error>> {
    let light = Phase {
        name: "mixed:hello",
        path: "/helloworld",
        connections: 25,
        duration: Duration::from_secs(8),
        pipelining: 1,
    };
    let page = Phase {
        name: "mixed:page",
        path: "/",
        connections: 25,
        duration: Duration::from_secs(8),
        pipelining: 1,
    };
    let heavy = Phase {
        name: "mixed:heavy",
        path: "/helloworld-heavy",
        connections: 25,
        duration: Duration::from_secs(8),
        pipelining: 2,
    };

    let (light_run, page_run, heavy_run) = tokio::join!(
        run_phase(client, base_url, &light),
        run_phase(client, base_url, &page),
        run_phase(client, base_url, &heavy),
    );

    let mut merged = light_run?;
    merged.merge(page_run?);
    merged.merge(heavy_run?);
    Ok(merged)
}

fn print_report(results: &[(&'static str, RunStats)]) {
    println!("\n==================== BENCHMARK REPORT ====================");
    println!(
        "{:<24} {:>10} {:>8} {:>10} {:>9} {:>9}",
        "phase", "requests", "errors", "req/s", "avg ms", "p99 ms"
    );

    let mut peak_rps: f64 = 0.0;
    for (name, stats) in results {
        let rps = stats.throughput();
        peak_rps = peak_rps.max(rps);
        println!(
            "{name:<24} {:>10} {:>8} {rps:>10.0} {:>9.2} {:>9.2}",
            stats.requests,
            stats.errors,
            stats.latency_avg_ms(),
            stats.latency_percentile_ms(99.0),
        );
    }

    println!("----------------------------------------------------------");
    println!(
        "Peak throughput: {peak_rps:.0} req/s - rating: {}",
        rating_for(peak_rps)
    );
    println!("==========================================================\n");
}
