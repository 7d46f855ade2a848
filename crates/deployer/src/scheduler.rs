//! Spreads the configuration files of a directory over time.
//!
//! Files are grouped into batches of a fixed size. In staggered mode batch
//! `k` starts `k * interval` after the run started regardless of whether the
//! batches before it finished, while a semaphore keeps at most `batch_size`
//! configurations in flight. In sequential mode a batch only starts once the
//! previous one finished and the interval passed.

use {
    crate::{
        infra::{observe, persistence},
        processor::{self, Process, Summary},
    },
    anyhow::Context,
    std::{
        collections::{BTreeMap, HashMap},
        fmt::{self, Display, Formatter},
        num::NonZeroUsize,
        path::{Path, PathBuf},
        sync::Arc,
        time::Duration,
    },
    tokio::{
        sync::Semaphore,
        task::{Id, JoinError, JoinSet},
        time::{self, Instant},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Dispatch {
    /// Batches start at fixed offsets and may overlap.
    Staggered,
    /// Each batch is drained before the next one starts.
    Sequential,
}

impl Display for Dispatch {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Staggered => f.write_str("staggered"),
            Self::Sequential => f.write_str("sequential"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub batch_size: NonZeroUsize,
    pub interval: Duration,
    pub dispatch: Dispatch,
}

/// Configuration files scheduled to start together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub index: usize,
    /// Time after the start of the run at which the batch begins in
    /// staggered mode.
    pub offset: Duration,
    pub configs: Vec<PathBuf>,
}

/// Groups `files` into batches of exactly `batch_size`, the last one holding
/// whatever is left.
pub fn plan(files: &[PathBuf], config: &Config) -> Vec<Batch> {
    files
        .chunks(config.batch_size.get())
        .enumerate()
        .map(|(index, configs)| Batch {
            index,
            offset: config
                .interval
                .saturating_mul(u32::try_from(index).unwrap_or(u32::MAX)),
            configs: configs.to_vec(),
        })
        .collect()
}

/// The outcome of a whole run.
#[derive(Debug, Default)]
pub struct Report {
    pub summaries: BTreeMap<PathBuf, Summary>,
    /// Files that could not be read as a configuration.
    pub malformed: Vec<PathBuf>,
    /// Files whose outcome could not be written back or whose processing
    /// panicked.
    pub unfinished: Vec<PathBuf>,
}

impl Report {
    pub fn total(&self) -> Summary {
        let mut total = Summary::default();
        for summary in self.summaries.values() {
            total += *summary;
        }
        total
    }

    /// Whether every file was processed and every contract is deployed.
    pub fn is_complete(&self) -> bool {
        self.malformed.is_empty() && self.unfinished.is_empty() && self.total().failed == 0
    }

    fn record(
        &mut self,
        path: PathBuf,
        result: Result<Result<Summary, processor::Error>, JoinError>,
    ) {
        match result {
            Ok(Ok(summary)) => {
                self.summaries.insert(path, summary);
            }
            Ok(Err(processor::Error::Load(_))) => self.malformed.push(path),
            Ok(Err(processor::Error::Store(_))) => self.unfinished.push(path),
            Err(err) => {
                observe::processing_panicked(&path, &err);
                self.unfinished.push(path);
            }
        }
    }
}

pub struct Scheduler {
    processor: Arc<dyn Process>,
    config: Config,
}

impl Scheduler {
    pub fn new(processor: Arc<dyn Process>, config: Config) -> Self {
        Self { processor, config }
    }

    /// Processes every configuration file in `dir` and returns once all of
    /// them are done.
    pub async fn run(&self, dir: &Path) -> anyhow::Result<Report> {
        let files = persistence::list(dir)
            .await
            .context("listing configuration directory")?;
        let batches = plan(&files, &self.config);
        for batch in &batches {
            observe::batch_scheduled(batch.index, batch.configs.len(), batch.offset);
        }

        let mut tasks = Tasks::new(self.config.batch_size);
        let start = Instant::now();
        for batch in batches {
            match self.config.dispatch {
                Dispatch::Staggered => time::sleep_until(start + batch.offset).await,
                Dispatch::Sequential => {
                    if batch.index > 0 {
                        time::sleep(self.config.interval).await;
                    }
                }
            }
            observe::batch_started(batch.index);
            for path in batch.configs {
                tasks.spawn(self.processor.clone(), path);
            }
            if self.config.dispatch == Dispatch::Sequential {
                tasks.drain().await;
            }
        }
        tasks.drain().await;

        let mut report = tasks.report;
        report.malformed.sort();
        report.unfinished.sort();
        observe::finished(&report);
        Ok(report)
    }
}

/// The configurations in flight.
struct Tasks {
    set: JoinSet<Result<Summary, processor::Error>>,
    paths: HashMap<Id, PathBuf>,
    permits: Arc<Semaphore>,
    report: Report,
}

impl Tasks {
    fn new(limit: NonZeroUsize) -> Self {
        Self {
            set: JoinSet::new(),
            paths: HashMap::new(),
            permits: Arc::new(Semaphore::new(limit.get())),
            report: Report::default(),
        }
    }

    fn spawn(&mut self, processor: Arc<dyn Process>, path: PathBuf) {
        let permits = self.permits.clone();
        let task_path = path.clone();
        let handle = self.set.spawn(async move {
            // The semaphore is never closed.
            let _permit = permits.acquire_owned().await;
            processor.process(&task_path).await
        });
        self.paths.insert(handle.id(), path);
    }

    async fn drain(&mut self) {
        while let Some(result) = self.set.join_next_with_id().await {
            let (id, result) = match result {
                Ok((id, summary)) => (id, Ok(summary)),
                Err(err) => (err.id(), Err(err)),
            };
            let Some(path) = self.paths.remove(&id) else {
                continue;
            };
            self.report.record(path, result);
        }
    }
}
