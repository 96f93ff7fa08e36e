use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use kvbench_mysql::cancel::{with_cancellation, with_deadline};
use kvbench_mysql::schema::ColumnDef;
use kvbench_mysql::{KvBenchError, KvDb, MysqlConfig, Values, WorkerSession};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::args::RunConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Op {
    Insert,
    Read,
    Scan,
    Update,
}

/// Record keys sort in the same order as their numbers.
pub(crate) fn record_key(n: u64) -> String {
    format!("user{n:012}")
}

/// How to generate a value for one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FieldGen {
    Text(usize),
    Flag,
    Number(usize),
}

impl FieldGen {
    fn for_column(column: &ColumnDef, default_length: usize) -> Self {
        let sql_type = column.sql_type.as_str();
        let mut declared = sql_type
            .split_once('(')
            .and_then(|(_, rest)| rest.split_once(')'))
            .into_iter()
            .flat_map(|(args, _)| args.split(','))
            .filter_map(|n| n.trim().parse::<usize>().ok());
        let length = declared.next();
        let scale = declared.next().unwrap_or(0);

        let digits = if sql_type.starts_with("BOOL") {
            return FieldGen::Flag;
        } else if sql_type.starts_with("TINYINT") {
            2
        } else if sql_type.starts_with("SMALLINT") {
            4
        } else if sql_type.starts_with("MEDIUMINT") {
            6
        } else if sql_type.starts_with("INT") || sql_type.starts_with("BIGINT") {
            9
        } else if sql_type.starts_with("DECIMAL") || sql_type.starts_with("NUMERIC") {
            length.unwrap_or(10).saturating_sub(scale)
        } else {
            return FieldGen::Text(length.unwrap_or(default_length).min(default_length).max(1));
        };
        FieldGen::Number(digits.clamp(1, 9))
    }

    fn generate(&self, rng: &mut ChaCha8Rng) -> Vec<u8> {
        match self {
            FieldGen::Text(len) => (0..*len).map(|_| rng.random_range(b'a'..=b'z')).collect(),
            FieldGen::Flag => {
                if rng.random_bool(0.5) {
                    b"true".to_vec()
                } else {
                    b"false".to_vec()
                }
            }
            FieldGen::Number(digits) => {
                let max = 10u64.pow(*digits as u32) - 1;
                rng.random_range(0..=max).to_string().into_bytes()
            }
        }
    }
}

/// The table a run writes to and how to fill each of its columns.
#[derive(Debug, Clone)]
pub(crate) struct Workload {
    table: String,
    fields: Vec<(String, FieldGen)>,
    config: RunConfig,
}

impl Workload {
    pub(crate) fn new(config: RunConfig) -> Result<Self, KvBenchError> {
        let db_config = MysqlConfig::from_properties(&config.props)?;
        let table = db_config.table;
        let fields = match &table.fields {
            Some(spec) => spec
                .columns()
                .iter()
                .map(|c| (c.name.clone(), FieldGen::for_column(c, table.field_length)))
                .collect(),
            None => (0..table.field_count)
                .map(|i| (format!("FIELD{i}"), FieldGen::Text(table.field_length)))
                .collect(),
        };
        Ok(Self {
            table: table.name,
            fields,
            config,
        })
    }

    fn record(&self, rng: &mut ChaCha8Rng) -> Values {
        self.fields
            .iter()
            .map(|(name, generator)| (name.clone(), generator.generate(rng)))
            .collect()
    }

    /// One field, for updates.
    fn field(&self, rng: &mut ChaCha8Rng) -> Values {
        let mut values = Values::new();
        if !self.fields.is_empty() {
            let (name, generator) = &self.fields[rng.random_range(0..self.fields.len())];
            values.insert(name.clone(), generator.generate(rng));
        }
        values
    }

    fn choose(&self, rng: &mut ChaCha8Rng) -> Op {
        let roll = rng.random::<f64>();
        if roll < self.config.read_proportion {
            Op::Read
        } else if roll < self.config.read_proportion + self.config.scan_proportion {
            Op::Scan
        } else {
            Op::Update
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub(crate) struct OpStats {
    pub(crate) ok: u64,
    pub(crate) not_found: u64,
    pub(crate) errors: u64,
    pub(crate) total_us: u64,
    pub(crate) max_us: u64,
}

impl OpStats {
    fn record(&mut self, elapsed: Duration) {
        let us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.total_us = self.total_us.saturating_add(us);
        self.max_us = self.max_us.max(us);
    }

    fn merge(&mut self, other: &OpStats) {
        self.ok += other.ok;
        self.not_found += other.not_found;
        self.errors += other.errors;
        self.total_us = self.total_us.saturating_add(other.total_us);
        self.max_us = self.max_us.max(other.max_us);
    }

    pub(crate) fn count(&self) -> u64 {
        self.ok + self.not_found + self.errors
    }

    pub(crate) fn avg_us(&self) -> u64 {
        self.total_us.checked_div(self.count()).unwrap_or(0)
    }
}

pub(crate) type Stats = BTreeMap<Op, OpStats>;

fn merge_stats(into: &mut Stats, from: &Stats) {
    for (op, stats) in from {
        into.entry(*op).or_default().merge(stats);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Load,
    Run,
}

/// Share of `total` assigned to `worker`: the first `total % workers` workers take one extra.
fn share(total: u64, worker: usize, workers: usize) -> u64 {
    let workers = workers as u64;
    let worker = worker as u64;
    total / workers + u64::from(worker < total % workers)
}

/// Insert every record, splitting keys across workers by residue.
pub(crate) async fn load(
    db: Arc<dyn KvDb>,
    workload: Arc<Workload>,
    cancel: CancellationToken,
) -> Result<(Stats, Duration), KvBenchError> {
    run_phase(db, workload, cancel, Phase::Load).await
}

/// The mixed read/scan/update phase.
pub(crate) async fn run(
    db: Arc<dyn KvDb>,
    workload: Arc<Workload>,
    cancel: CancellationToken,
) -> Result<(Stats, Duration), KvBenchError> {
    run_phase(db, workload, cancel, Phase::Run).await
}

async fn run_phase(
    db: Arc<dyn KvDb>,
    workload: Arc<Workload>,
    cancel: CancellationToken,
    phase: Phase,
) -> Result<(Stats, Duration), KvBenchError> {
    let started = Instant::now();
    let threads = workload.config.threads;
    let deadline = match phase {
        Phase::Run => workload
            .config
            .duration_ms
            .map(|ms| tokio::time::Instant::now() + Duration::from_millis(ms)),
        Phase::Load => None,
    };

    let mut handles = Vec::with_capacity(threads);
    for worker in 0..threads {
        let db = Arc::clone(&db);
        let workload = Arc::clone(&workload);
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            let mut session = db.init_thread(worker, threads).await?;
            let stats = worker_loop(&*db, &workload, &mut session, worker, phase, deadline, &cancel)
                .await;
            db.cleanup_thread(session).await;
            Ok::<Stats, KvBenchError>(stats)
        }));
    }

    let mut total = Stats::new();
    for handle in handles {
        let stats = handle
            .await
            .map_err(|e| KvBenchError::ConnectionError(format!("worker task failed: {e}")))??;
        merge_stats(&mut total, &stats);
    }
    Ok((total, started.elapsed()))
}

async fn worker_loop(
    db: &dyn KvDb,
    workload: &Workload,
    session: &mut WorkerSession,
    worker: usize,
    phase: Phase,
    deadline: Option<tokio::time::Instant>,
    cancel: &CancellationToken,
) -> Stats {
    let config = &workload.config;
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed ^ (worker as u64).wrapping_mul(0x9E37_79B9));
    let mut stats = Stats::new();
    let ops = match phase {
        Phase::Load => share(config.records, worker, config.threads),
        Phase::Run => share(config.operations, worker, config.threads),
    };

    for i in 0..ops {
        let (op, key) = match phase {
            Phase::Load => (Op::Insert, record_key(i * config.threads as u64 + worker as u64)),
            Phase::Run => (
                workload.choose(&mut rng),
                record_key(rng.random_range(0..config.records)),
            ),
        };
        let started = Instant::now();
        let op_future = execute(db, workload, session, op, &key, &mut rng);
        let outcome = match deadline {
            Some(deadline) => with_cancellation(cancel, with_deadline(deadline, op_future)).await,
            None => with_cancellation(cancel, op_future).await,
        };
        let entry = stats.entry(op).or_default();
        match outcome {
            Ok(true) => entry.ok += 1,
            Ok(false) => entry.not_found += 1,
            Err(KvBenchError::Cancelled | KvBenchError::DeadlineExceeded) => break,
            Err(err) => {
                entry.errors += 1;
                tracing::warn!(worker, ?op, key = %key, error = %err, "operation failed");
            }
        }
        entry.record(started.elapsed());
    }
    stats
}

/// Run one operation; `Ok(false)` means the key was absent.
async fn execute(
    db: &dyn KvDb,
    workload: &Workload,
    session: &mut WorkerSession,
    op: Op,
    key: &str,
    rng: &mut ChaCha8Rng,
) -> Result<bool, KvBenchError> {
    let table = workload.table.as_str();
    match op {
        Op::Insert => {
            let values = workload.record(rng);
            db.insert(session, table, key, &values).await?;
            Ok(true)
        }
        Op::Read => Ok(db.read(session, table, key, None).await?.is_some()),
        Op::Scan => {
            let count = rng.random_range(1..=workload.config.max_scan_length);
            Ok(!db.scan(session, table, key, count, None).await?.is_empty())
        }
        Op::Update => {
            let values = workload.field(rng);
            if values.is_empty() {
                return Ok(true);
            }
            db.update(session, table, key, &values).await?;
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvbench_mysql::schema::FieldSpec;

    #[test]
    fn shares_cover_the_total() {
        let total: u64 = (0..7).map(|w| share(100, w, 7)).sum();
        assert_eq!(total, 100);
        assert_eq!(share(10, 0, 4), 3);
        assert_eq!(share(10, 3, 4), 2);
    }

    #[test]
    fn record_keys_sort_numerically() {
        assert!(record_key(9) < record_key(10));
        assert_eq!(record_key(42), "user000000000042");
    }

    #[test]
    fn generators_follow_column_types() {
        let spec = FieldSpec::parse("NAME:VARCHAR(20),ACTIVE:BOOLEAN,PRICE:DECIMAL(10,2),N:INT")
            .unwrap();
        let gens: Vec<FieldGen> = spec
            .columns()
            .iter()
            .map(|c| FieldGen::for_column(c, 100))
            .collect();
        assert_eq!(
            gens,
            [
                FieldGen::Text(20),
                FieldGen::Flag,
                FieldGen::Number(8),
                FieldGen::Number(9)
            ]
        );

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(FieldGen::Text(20).generate(&mut rng).len(), 20);
        let flag = FieldGen::Flag.generate(&mut rng);
        assert!(flag == b"true" || flag == b"false");
        let number = String::from_utf8(FieldGen::Number(3).generate(&mut rng)).unwrap();
        assert!(number.parse::<u64>().unwrap() <= 999);
    }
}
