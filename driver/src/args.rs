use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use kvbench_mysql::properties::{THREAD_COUNT, THREAD_COUNT_DEFAULT};
use kvbench_mysql::{Backend, KvBenchError, Properties};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(author, version, about = "YCSB-style workload driver for MySQL-protocol databases")]
pub(crate) struct Args {
    /// Registered database name.
    #[arg(long, value_enum, default_value = "mysql")]
    pub(crate) db: Backend,
    /// Adapter property, repeatable: `-p mysql.host=10.0.0.5`.
    #[arg(short = 'p', long = "prop", value_name = "KEY=VALUE")]
    pub(crate) props: Vec<String>,
    /// JSON object of string properties, applied before any `-p`.
    #[arg(long)]
    pub(crate) property_file: Option<PathBuf>,
    /// Worker count; overrides the `threadcount` property.
    #[arg(long)]
    pub(crate) threads: Option<usize>,
    #[arg(long, default_value_t = 1_000)]
    pub(crate) records: u64,
    #[arg(long, default_value_t = 10_000)]
    pub(crate) operations: u64,
    #[arg(long, default_value_t = 0.5)]
    pub(crate) read_proportion: f64,
    #[arg(long, default_value_t = 0.0)]
    pub(crate) scan_proportion: f64,
    #[arg(long, default_value_t = 10)]
    pub(crate) max_scan_length: usize,
    /// Stop the run phase after this long, e.g. `30s`.
    #[arg(long, value_parser = humantime::parse_duration)]
    pub(crate) duration: Option<Duration>,
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Skip the insert phase and run against existing data.
    #[arg(long)]
    pub(crate) skip_load: bool,
    #[arg(long)]
    pub(crate) log: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct RunConfig {
    pub(crate) db: String,
    pub(crate) threads: usize,
    pub(crate) records: u64,
    pub(crate) operations: u64,
    pub(crate) read_proportion: f64,
    pub(crate) scan_proportion: f64,
    pub(crate) max_scan_length: usize,
    pub(crate) duration_ms: Option<u64>,
    pub(crate) seed: u64,
    pub(crate) load: bool,
    pub(crate) log: Option<PathBuf>,
    #[serde(skip)]
    pub(crate) props: Properties,
}

impl RunConfig {
    pub(crate) fn from_args(args: Args) -> Result<Self, KvBenchError> {
        let mut props = match &args.property_file {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    KvBenchError::ConfigError(format!("cannot read {}: {e}", path.display()))
                })?;
                Properties::from_json_str(&text)?
            }
            None => Properties::new(),
        };
        for assignment in &args.props {
            let (key, value) = Properties::parse_assignment(assignment)?;
            props.set(key, value);
        }

        let threads = match args.threads {
            Some(threads) => threads,
            None => props.get_parsed(THREAD_COUNT, THREAD_COUNT_DEFAULT as usize)?,
        };
        if threads == 0 {
            return Err(KvBenchError::ConfigError(
                "at least one thread is required".to_string(),
            ));
        }
        props.set(THREAD_COUNT, threads.to_string());

        let read_proportion = clamp_proportion(args.read_proportion);
        let scan_proportion = clamp_proportion(args.scan_proportion).min(1.0 - read_proportion);

        Ok(RunConfig {
            db: args.db.to_string(),
            threads,
            records: args.records.max(1),
            operations: args.operations,
            read_proportion,
            scan_proportion,
            max_scan_length: args.max_scan_length.max(1),
            duration_ms: args.duration.map(|d| d.as_millis() as u64),
            seed: args.seed.unwrap_or_else(random_seed),
            load: !args.skip_load,
            log: args.log,
            props,
        })
    }
}

fn clamp_proportion(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn random_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    now.as_secs() ^ u64::from(now.subsec_nanos())
}
