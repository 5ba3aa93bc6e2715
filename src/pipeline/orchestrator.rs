//! Pipeline orchestrator - resumable job state machine
//!
//! One job moves through `Init -> Enumerating -> Extracting -> Finalizing ->
//! Done`, or ends in `Interrupted` when the cancellation token fires. An
//! interrupted or stopped-early job is continued by running the same query
//! and cap again with resume enabled.

use super::{enumerate, extract, jittered_delay, pause};
use crate::browser::Browser;
use crate::config::Config;
use crate::model::BusinessRecord;
use crate::output::{existing_keys, sort_by_score, IncrementalWriter};
use crate::state::{session_key, SessionState, StateStore};
use crate::validate::Validator;
use crate::Result;
use chrono::Local;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Phase of the job currently being run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Init,
    Enumerating,
    Extracting,
    Finalizing,
    Done,
    /// Terminal for this invocation, resumable by the next one
    Interrupted,
}

impl JobPhase {
    /// Returns true if the job has ended for this invocation
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Interrupted)
    }
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Enumerating => "enumerating",
            Self::Extracting => "extracting",
            Self::Finalizing => "finalizing",
            Self::Done => "done",
            Self::Interrupted => "interrupted",
        };
        f.write_str(name)
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every candidate was processed
    Completed,

    /// Enumeration produced nothing; not an error
    NoResults { diagnostic: String },

    /// The circuit breaker tripped; partial results were kept
    StoppedEarly { consecutive_failures: u32 },

    /// The cancellation token fired; progress was saved
    Interrupted,
}

impl RunOutcome {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Completed | Self::NoResults { .. } => 0,
            Self::StoppedEarly { .. } => 2,
            Self::Interrupted => 130,
        }
    }
}

/// Summary of one run, cumulative over resumed sessions
#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub session_key: String,
    pub output_path: PathBuf,
    pub total_candidates: usize,
    pub success_count: usize,
    pub failed_count: usize,
    /// Rows appended by this invocation
    pub rows_written: usize,
    /// Successful records not written because the name was already present
    pub duplicates_skipped: usize,
    pub resumed: bool,
}

/// Output file name used when none is given
pub fn default_output_path() -> PathBuf {
    PathBuf::from(format!(
        "business_leads_{}.csv",
        Local::now().format("%Y%m%d_%H%M%S")
    ))
}

enum CandidateOutcome {
    Record(BusinessRecord),
    Failed(String),
    /// Cancelled mid-candidate; left unprocessed
    Abandoned,
}

/// Per-run bookkeeping shared by the extraction loop and finalization
struct Job {
    session: SessionState,
    writer: IncrementalWriter,
    known_names: HashSet<String>,
    duplicates_skipped: usize,
    resumed: bool,
}

/// Drives one scraping job against a rendering collaborator
pub struct Orchestrator<B: Browser> {
    config: Config,
    browser: B,
    validator: Validator,
    store: StateStore,
    cancel: CancellationToken,
    phase: JobPhase,
}

impl<B: Browser> Orchestrator<B> {
    /// Creates a new orchestrator
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `browser` - The rendering collaborator; closed at the end of every run
    /// * `cancel` - Interruption signal, checked between and during candidates
    ///
    /// # Returns
    ///
    /// * `Ok(Orchestrator)` - Ready to run
    /// * `Err(ScoutError)` - The state directory or the probe client could not be set up
    pub fn new(config: Config, browser: B, cancel: CancellationToken) -> Result<Self> {
        let validator = Validator::new(&config.validation, config.scoring.clone())?;
        let store = StateStore::open(&config.state.directory, config.state.max_backups)?;

        Ok(Self {
            config,
            browser,
            validator,
            store,
            cancel,
            phase: JobPhase::Init,
        })
    }

    pub fn phase(&self) -> JobPhase {
        self.phase
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Runs a job to completion, early stop, or interruption
    ///
    /// The browser is closed on every exit path, including errors.
    ///
    /// # Arguments
    ///
    /// * `query` - Search query
    /// * `max_results` - Result cap; part of the session key
    /// * `output` - CSV destination for a fresh job; a resumed job keeps its own
    /// * `resume` - Continue a matching incomplete session if one exists
    pub async fn run(
        &mut self,
        query: &str,
        max_results: usize,
        output: Option<PathBuf>,
        resume: bool,
    ) -> Result<RunReport> {
        let result = self.run_job(query, max_results, output, resume).await;

        if let Err(e) = self.browser.close().await {
            tracing::warn!("Failed to close browser session: {}", e);
        }

        if let Err(e) = &result {
            tracing::error!("Run failed during {}: {}", self.phase, e);
        }
        result
    }

    async fn run_job(
        &mut self,
        query: &str,
        max_results: usize,
        output: Option<PathBuf>,
        resume: bool,
    ) -> Result<RunReport> {
        self.enter(JobPhase::Init);
        let key = session_key(query, max_results);
        tracing::info!("Job '{}' (max {}) has session key {}", query, max_results, key);

        let previous = if resume { self.store.load(&key) } else { None };
        let mut job = match previous {
            Some(session) if !session.completed => {
                if let Some(requested) = output.as_ref() {
                    if requested.as_os_str() != session.output_file.as_str() {
                        tracing::info!(
                            "Resumed session keeps its output {}, ignoring {}",
                            session.output_file,
                            requested.display()
                        );
                    }
                }
                self.resume_job(session)?
            }
            other => {
                if let Some(done) = other {
                    tracing::info!(
                        "Session {} already completed ({} successful), starting a new job",
                        key,
                        done.success_count
                    );
                }
                let output = output.unwrap_or_else(default_output_path);
                match self.start_job(query, max_results, output).await? {
                    Ok(fresh) => fresh,
                    Err(report) => return Ok(report),
                }
            }
        };

        self.enter(JobPhase::Extracting);
        let outcome = self.extract_all(&mut job).await?;
        self.finish(job, outcome)
    }

    fn resume_job(&mut self, session: SessionState) -> Result<Job> {
        tracing::info!(
            "Resuming session {} at candidate {} ({}/{} done)",
            session.query_hash,
            session.first_unprocessed().map_or(session.total(), |i| i + 1),
            session.processed_count(),
            session.total()
        );

        let path = PathBuf::from(&session.output_file);
        let known_names = existing_keys(&path)?;
        let writer = IncrementalWriter::open(&path, true)?;
        tracing::debug!("{} names already in {}", known_names.len(), path.display());

        Ok(Job {
            session,
            writer,
            known_names,
            duplicates_skipped: 0,
            resumed: true,
        })
    }

    /// Enumerates a fresh job
    ///
    /// The inner `Err` carries the final report when there is nothing to
    /// extract (no results or interrupted during enumeration).
    async fn start_job(
        &mut self,
        query: &str,
        max_results: usize,
        output: PathBuf,
    ) -> Result<std::result::Result<Job, RunReport>> {
        self.enter(JobPhase::Enumerating);
        let key = session_key(query, max_results);

        let early_report = |outcome: RunOutcome| RunReport {
            outcome,
            session_key: key.clone(),
            output_path: output.clone(),
            total_candidates: 0,
            success_count: 0,
            failed_count: 0,
            rows_written: 0,
            duplicates_skipped: 0,
            resumed: false,
        };

        let timeout = self.config.enumeration.scroll_timeout();
        let opened = tokio::select! {
            r = tokio::time::timeout(timeout, self.browser.open_search(query)) => r,
            _ = self.cancel.cancelled() => {
                self.enter(JobPhase::Interrupted);
                return Ok(Err(early_report(RunOutcome::Interrupted)));
            }
        };
        let diagnostic = match opened {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(format!("could not open search results: {}", e)),
            Err(_) => Some(format!("search results did not load within {:?}", timeout)),
        };
        if let Some(diagnostic) = diagnostic {
            tracing::error!("{}", diagnostic);
            self.enter(JobPhase::Done);
            return Ok(Err(early_report(RunOutcome::NoResults { diagnostic })));
        }

        let found = enumerate(
            &mut self.browser,
            max_results,
            &self.config.enumeration,
            &self.cancel,
        )
        .await;

        if found.interrupted {
            tracing::info!(
                "Interrupted during enumeration after {} listings; nothing to save",
                found.identifiers.len()
            );
            self.enter(JobPhase::Interrupted);
            return Ok(Err(early_report(RunOutcome::Interrupted)));
        }

        if found.identifiers.is_empty() {
            let diagnostic = format!("no listings found for '{}'", query);
            tracing::warn!("{}", diagnostic);
            self.enter(JobPhase::Done);
            return Ok(Err(early_report(RunOutcome::NoResults { diagnostic })));
        }

        if found.identifiers.len() < max_results {
            tracing::info!(
                "Found {} of {} requested listings",
                found.identifiers.len(),
                max_results
            );
        }

        let session = SessionState::new(
            query,
            max_results,
            output.to_string_lossy(),
            found.identifiers,
        );
        // Persist the candidate list before any extraction so a resume never re-enumerates
        self.store.save(&session)?;
        let writer = IncrementalWriter::open(&output, false)?;

        Ok(Ok(Job {
            session,
            writer,
            known_names: HashSet::new(),
            duplicates_skipped: 0,
            resumed: false,
        }))
    }

    /// Processes every pending candidate in enumeration order
    async fn extract_all(&mut self, job: &mut Job) -> Result<RunOutcome> {
        let save_interval = self.config.extraction.save_interval.max(1) as usize;
        let breaker = self.config.extraction.max_consecutive_failures;
        let pending = job.session.pending_indices();
        let total = job.session.total();

        let mut consecutive_failures = 0u32;
        let mut unsaved = 0usize;

        for (n, index) in pending.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Ok(RunOutcome::Interrupted);
            }

            if n > 0 {
                let delay = jittered_delay(
                    self.config.extraction.delay_min_ms,
                    self.config.extraction.delay_max_ms,
                );
                if !pause(delay, &self.cancel).await {
                    return Ok(RunOutcome::Interrupted);
                }
            }

            let identifier = job.session.business_urls[index].clone();
            tracing::debug!("Candidate {}/{}: {}", index + 1, total, identifier);

            match self.process_candidate(&identifier).await {
                CandidateOutcome::Abandoned => {
                    tracing::info!("Abandoned candidate {} on interrupt", index + 1);
                    return Ok(RunOutcome::Interrupted);
                }
                CandidateOutcome::Failed(reason) => {
                    tracing::warn!("Candidate {} failed: {}", index + 1, reason);
                    job.session.mark_failed(index);
                    consecutive_failures += 1;
                }
                CandidateOutcome::Record(record) => {
                    consecutive_failures = 0;
                    self.write_record(job, &record)?;
                    job.session.mark_success(index);
                }
            }

            unsaved += 1;
            if unsaved >= save_interval {
                self.store.save(&job.session)?;
                unsaved = 0;
            }

            if job.session.processed_count() % 10 == 0 {
                tracing::info!(
                    "Progress: {}/{} ({:.1}%), {} successful, {} failed",
                    job.session.processed_count(),
                    total,
                    job.session.progress_percentage(),
                    job.session.success_count,
                    job.session.failed_count
                );
            }

            if consecutive_failures >= breaker {
                tracing::error!(
                    "{} consecutive failures, stopping early",
                    consecutive_failures
                );
                return Ok(RunOutcome::StoppedEarly {
                    consecutive_failures,
                });
            }
        }

        Ok(RunOutcome::Completed)
    }

    /// Renders, extracts and validates one candidate
    async fn process_candidate(&mut self, identifier: &str) -> CandidateOutcome {
        let timeout = self.config.extraction.render_timeout();

        let rendered = tokio::select! {
            biased;
            r = tokio::time::timeout(timeout, self.browser.render(identifier)) => r,
            _ = self.cancel.cancelled() => return CandidateOutcome::Abandoned,
        };

        let record = match rendered {
            Ok(Ok(view)) => extract(view.as_ref()),
            Ok(Err(e)) => return CandidateOutcome::Failed(e.to_string()),
            Err(_) => {
                return CandidateOutcome::Failed(format!("render timed out after {:?}", timeout))
            }
        };

        if !record.has_any_field() {
            return CandidateOutcome::Failed("no readable fields on detail view".to_string());
        }

        tokio::select! {
            biased;
            validated = self.validator.validate(record) => CandidateOutcome::Record(validated),
            _ = self.cancel.cancelled() => CandidateOutcome::Abandoned,
        }
    }

    /// Appends a record unless its name is already in the output
    fn write_record(&self, job: &mut Job, record: &BusinessRecord) -> Result<()> {
        let key = record.dedup_key();
        if let Some(name) = key.as_ref().filter(|k| job.known_names.contains(*k)) {
            tracing::info!("Skipping duplicate business '{}'", name);
            job.duplicates_skipped += 1;
            return Ok(());
        }

        if let Err(e) = job.writer.append(record) {
            if let Err(save_err) = self.store.save(&job.session) {
                tracing::error!("Could not save state after write failure: {}", save_err);
            }
            return Err(e.into());
        }

        tracing::debug!(
            "Wrote '{}' (score {})",
            record.name,
            record.lead_score
        );
        if let Some(name) = key {
            job.known_names.insert(name);
        }
        Ok(())
    }

    /// Persists final state, closes the output and builds the report
    fn finish(&mut self, mut job: Job, outcome: RunOutcome) -> Result<RunReport> {
        match &outcome {
            RunOutcome::Interrupted => {
                tracing::info!(
                    "Interrupted at {}/{}; saving progress",
                    job.session.processed_count(),
                    job.session.total()
                );
            }
            _ => {
                self.enter(JobPhase::Finalizing);
                if matches!(outcome, RunOutcome::Completed) && job.session.all_processed() {
                    job.session.mark_completed();
                }
            }
        }

        job.session.touch();
        self.store.save(&job.session)?;

        let output_path = job.writer.path().to_path_buf();
        let rows_written = job.writer.finish()?;

        // Resumed runs stay append-only; interrupted runs will be continued
        if !job.resumed && !matches!(outcome, RunOutcome::Interrupted) {
            let rows = sort_by_score(&output_path)?;
            tracing::debug!("Sorted {} rows by lead score", rows);
        }

        self.enter(if matches!(outcome, RunOutcome::Interrupted) {
            JobPhase::Interrupted
        } else {
            JobPhase::Done
        });

        tracing::info!(
            "Run {}: {} successful, {} failed, {} duplicates skipped, output {}",
            self.phase,
            job.session.success_count,
            job.session.failed_count,
            job.duplicates_skipped,
            output_path.display()
        );

        Ok(RunReport {
            outcome,
            session_key: job.session.query_hash.clone(),
            output_path,
            total_candidates: job.session.total(),
            success_count: job.session.success_count,
            failed_count: job.session.failed_count,
            rows_written,
            duplicates_skipped: job.duplicates_skipped,
            resumed: job.resumed,
        })
    }

    fn enter(&mut self, phase: JobPhase) {
        tracing::debug!("Phase {} -> {}", self.phase, phase);
        self.phase = phase;
    }
}
