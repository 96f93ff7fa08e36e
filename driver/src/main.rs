mod args;
mod logging;
mod workload;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use kvbench_mysql::{DbRegistry, KvBenchError, KvDb};
use tokio_util::sync::CancellationToken;
use tracing::Level;

use crate::args::{Args, RunConfig};
use crate::logging::LogWriter;
use crate::workload::{Stats, Workload};

#[tokio::main]
async fn main() {
    let config = match RunConfig::from_args(Args::parse()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };
    let writer = LogWriter::new(config.log.clone()).unwrap_or_else(|err| {
        eprintln!("failed to open log file: {err}");
        std::process::exit(1);
    });

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_target(false)
        .with_max_level(Level::INFO)
        .init();

    let config_json = serde_json::to_string_pretty(&config).unwrap_or_else(|_| "{}".to_string());
    tracing::info!("config: {}", config_json);

    if let Err(err) = drive(config).await {
        tracing::error!(error = %err, "benchmark failed");
        std::process::exit(1);
    }
}

async fn drive(config: RunConfig) -> Result<(), KvBenchError> {
    let registry = DbRegistry::with_mysql_family();
    let db = registry.create(&config.db, &config.props).await?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted, stopping workers");
            on_signal.cancel();
        }
    });

    let result = phases(Arc::clone(&db), config, cancel).await;
    db.close().await;
    result
}

async fn phases(
    db: Arc<dyn KvDb>,
    config: RunConfig,
    cancel: CancellationToken,
) -> Result<(), KvBenchError> {
    let load = config.load;
    let plan = Arc::new(Workload::new(config)?);

    if load {
        let (stats, elapsed) =
            workload::load(Arc::clone(&db), Arc::clone(&plan), cancel.clone()).await?;
        report("load", &stats, elapsed);
    }
    if !cancel.is_cancelled() {
        let (stats, elapsed) = workload::run(db, plan, cancel).await?;
        report("run", &stats, elapsed);
    }
    Ok(())
}

fn report(phase: &str, stats: &Stats, elapsed: Duration) {
    let total: u64 = stats.values().map(|s| s.count()).sum();
    let secs = elapsed.as_secs_f64();
    let throughput = if secs > 0.0 { total as f64 / secs } else { 0.0 };
    tracing::info!(
        "complete: phase={} ops={} elapsed={}ms throughput={:.1} ops/s",
        phase,
        total,
        elapsed.as_millis(),
        throughput
    );
    for (op, s) in stats {
        tracing::info!(
            "  {:?}: ok={} not_found={} errors={} avg={}us max={}us",
            op,
            s.ok,
            s.not_found,
            s.errors,
            s.avg_us(),
            s.max_us
        );
    }
    if let Ok(json) = serde_json::to_string(stats) {
        tracing::info!("stats: {}", json);
    }
}
