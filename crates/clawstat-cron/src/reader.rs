//! Scheduled job reader
//!
//! Loads the job list from the configuration file and derives the views the
//! dashboard shows. The decoded list is cached until either the TTL expires or
//! the file's modification time changes. A missing or malformed file yields an
//! empty list; it is never an error.

use crate::config::{RawConfig, RawJob, RawPayload};
use crate::schedule::{Schedule, ScheduleKind};
use chrono::{DateTime, Utc};
use clawstat_core::config::DEFAULT_CACHE_TTL;
use clawstat_core::error::{ClawstatError, Result};
use clawstat_core::timezone::TimezoneConfig;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, warn};

/// Status recorded for a successful run
pub const STATUS_OK: &str = "ok";

const PAYLOAD_TEXT_LIMIT: usize = 100;
const DEFAULT_NAME: &str = "Unnamed";
const DEFAULT_SESSION_TARGET: &str = "main";
const UNKNOWN_PAYLOAD: &str = "unknown";
const SUMMARY_NEXT_JOBS: usize = 3;

/// One configured job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledJob {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub schedule_kind: ScheduleKind,
    /// Human-readable schedule, see [`Schedule::describe`]
    pub schedule_expr: String,
    pub timezone: Option<String>,
    pub next_run: Option<DateTime<Utc>>,
    pub last_run: Option<DateTime<Utc>>,
    pub last_status: Option<String>,
    pub last_duration_ms: Option<u64>,
    pub session_target: String,
    pub payload_kind: String,
    /// First 100 characters of the event text or agent message
    pub payload_text: Option<String>,
}

impl ScheduledJob {
    fn from_raw(raw: RawJob, schedule: Schedule, timezone: &TimezoneConfig) -> Self {
        let payload_text = payload_text(&raw.payload);
        Self {
            id: raw.id.unwrap_or_default(),
            name: raw.name.unwrap_or_else(|| DEFAULT_NAME.to_string()),
            enabled: raw.enabled.unwrap_or(true),
            schedule_kind: schedule.kind(),
            schedule_expr: schedule.describe(timezone),
            timezone: schedule.timezone().map(str::to_string),
            next_run: raw.state.next_run_at_ms.and_then(TimezoneConfig::from_epoch_ms),
            last_run: raw.state.last_run_at_ms.and_then(TimezoneConfig::from_epoch_ms),
            last_status: raw.state.last_status,
            last_duration_ms: raw.state.last_duration_ms,
            session_target: raw
                .session_target
                .unwrap_or_else(|| DEFAULT_SESSION_TARGET.to_string()),
            payload_kind: raw.payload.kind.unwrap_or_else(|| UNKNOWN_PAYLOAD.to_string()),
            payload_text,
        }
    }

    /// Whether the last run ended in anything but success
    pub fn has_failed(&self) -> bool {
        self.last_status.as_deref().is_some_and(|s| !s.is_empty() && s != STATUS_OK)
    }
}

fn payload_text(payload: &RawPayload) -> Option<String> {
    let text = match payload.kind.as_deref() {
        Some("systemEvent") => payload.text.as_deref(),
        Some("agentTurn") => payload.message.as_deref(),
        _ => return None,
    };
    Some(text.unwrap_or("").chars().take(PAYLOAD_TEXT_LIMIT).collect())
}

/// Upcoming run of an enabled job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NextJob {
    pub id: String,
    pub name: String,
    /// `"<kind>: <schedule>"`
    pub schedule: String,
    pub next_run: DateTime<Utc>,
    /// Whole minutes until the run, rounded down; negative when overdue
    pub minutes_until: i64,
    pub overdue: bool,
    pub last_status: Option<String>,
}

/// Most recent run of a job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentRun {
    pub id: String,
    pub name: String,
    pub last_run: DateTime<Utc>,
    pub last_status: Option<String>,
    pub duration_ms: Option<u64>,
    pub enabled: bool,
}

/// Counts over the whole job list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CronSummary {
    pub total_jobs: usize,
    pub enabled_jobs: usize,
    pub disabled_jobs: usize,
    /// Enabled jobs per schedule kind
    pub by_schedule_kind: BTreeMap<ScheduleKind, usize>,
    pub recent_failures: usize,
    /// Entries in the file that could not be decoded as a job
    pub skipped_jobs: usize,
    pub next_jobs: Vec<NextJob>,
}

/// Decoded jobs plus the number of entries that were dropped
#[derive(Debug, Default)]
struct JobList {
    jobs: Vec<ScheduledJob>,
    skipped: usize,
}

struct CachedJobs {
    jobs: Arc<JobList>,
    loaded_at: Instant,
    modified: SystemTime,
}

/// Reads and caches the scheduled job list
pub struct CronReader {
    jobs_file: PathBuf,
    timezone: TimezoneConfig,
    ttl: Duration,
    cache: Mutex<Option<CachedJobs>>,
    parses: AtomicU64,
}

impl CronReader {
    /// Create a reader for `jobs_file` with the default 30 second TTL
    pub fn new(jobs_file: impl Into<PathBuf>, timezone: TimezoneConfig) -> Self {
        Self {
            jobs_file: jobs_file.into(),
            timezone,
            ttl: DEFAULT_CACHE_TTL,
            cache: Mutex::new(None),
            parses: AtomicU64::new(0),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn jobs_file(&self) -> &Path {
        &self.jobs_file
    }

    /// Number of times the configuration file has been decoded
    pub fn parses(&self) -> u64 {
        self.parses.load(Ordering::Relaxed)
    }

    /// Drop the cached job list
    pub fn clear_cache(&self) {
        *self.cache.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Configured jobs in file order, optionally including disabled ones
    pub fn jobs(&self, include_disabled: bool) -> Vec<ScheduledJob> {
        self.load()
            .jobs
            .iter()
            .filter(|job| include_disabled || job.enabled)
            .cloned()
            .collect()
    }

    /// The next `count` enabled jobs with a known next run, soonest first
    pub fn next_jobs(&self, count: usize) -> Vec<NextJob> {
        self.next_jobs_at(count, Utc::now())
    }

    /// [`next_jobs`](Self::next_jobs) relative to a fixed `now`
    pub fn next_jobs_at(&self, count: usize, now: DateTime<Utc>) -> Vec<NextJob> {
        next_jobs_of(&self.load().jobs, count, now)
    }

    /// The `count` most recently run jobs, enabled or not, latest first
    pub fn recent_runs(&self, count: usize) -> Vec<RecentRun> {
        let list = self.load();
        let mut ran: Vec<(&ScheduledJob, DateTime<Utc>)> = list
            .jobs
            .iter()
            .filter_map(|job| job.last_run.map(|at| (job, at)))
            .collect();
        ran.sort_by(|a, b| b.1.cmp(&a.1));

        ran.into_iter()
            .take(count)
            .map(|(job, last_run)| RecentRun {
                id: job.id.clone(),
                name: job.name.clone(),
                last_run,
                last_status: job.last_status.clone(),
                duration_ms: job.last_duration_ms,
                enabled: job.enabled,
            })
            .collect()
    }

    pub fn summary(&self) -> CronSummary {
        self.summary_at(Utc::now())
    }

    /// [`summary`](Self::summary) relative to a fixed `now`
    pub fn summary_at(&self, now: DateTime<Utc>) -> CronSummary {
        let list = self.load();
        let jobs = &list.jobs;
        let enabled_jobs = jobs.iter().filter(|job| job.enabled).count();

        let mut by_schedule_kind = BTreeMap::new();
        for job in jobs.iter().filter(|job| job.enabled) {
            *by_schedule_kind.entry(job.schedule_kind).or_insert(0) += 1;
        }

        CronSummary {
            total_jobs: jobs.len(),
            enabled_jobs,
            disabled_jobs: jobs.len() - enabled_jobs,
            by_schedule_kind,
            recent_failures: jobs.iter().filter(|job| job.has_failed()).count(),
            skipped_jobs: list.skipped,
            next_jobs: next_jobs_of(jobs, SUMMARY_NEXT_JOBS, now),
        }
    }

    fn load(&self) -> Arc<JobList> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);

        let modified = match std::fs::metadata(&self.jobs_file).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                debug!("Cron config {} unavailable: {}", self.jobs_file.display(), e);
                *cache = None;
                return Arc::default();
            }
        };

        if let Some(cached) = cache.as_ref()
            && cached.loaded_at.elapsed() < self.ttl
            && cached.modified == modified
        {
            return Arc::clone(&cached.jobs);
        }

        match self.read_jobs() {
            Ok(list) => {
                let jobs = Arc::new(list);
                *cache = Some(CachedJobs {
                    jobs: Arc::clone(&jobs),
                    loaded_at: Instant::now(),
                    modified,
                });
                jobs
            }
            Err(e) => {
                warn!("Failed to read cron jobs: {}", e);
                *cache = None;
                Arc::default()
            }
        }
    }

    fn read_jobs(&self) -> Result<JobList> {
        let content = std::fs::read_to_string(&self.jobs_file)
            .map_err(|e| ClawstatError::io_at(&self.jobs_file, e))?;
        self.parses.fetch_add(1, Ordering::Relaxed);

        let config: RawConfig =
            serde_json::from_str(&content).map_err(|e| ClawstatError::Parse {
                file: self.jobs_file.clone(),
                error: e.to_string(),
            })?;

        let mut list = JobList {
            jobs: Vec::with_capacity(config.jobs.len()),
            skipped: 0,
        };
        for (index, value) in config.jobs.into_iter().enumerate() {
            let mut raw: RawJob = match serde_json::from_value(value) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Skipping malformed cron job #{}: {}", index, e);
                    list.skipped += 1;
                    continue;
                }
            };
            let schedule = match serde_json::from_value::<Schedule>(raw.schedule.take()) {
                Ok(schedule) => schedule,
                Err(e) => {
                    warn!(
                        "Skipping cron job '{}' with unsupported schedule: {}",
                        raw.id.as_deref().unwrap_or_default(),
                        e
                    );
                    list.skipped += 1;
                    continue;
                }
            };
            list.jobs
                .push(ScheduledJob::from_raw(raw, schedule, &self.timezone));
        }

        debug!(
            "Loaded {} cron jobs from {} ({} skipped)",
            list.jobs.len(),
            self.jobs_file.display(),
            list.skipped
        );
        Ok(list)
    }
}

fn next_jobs_of(jobs: &[ScheduledJob], count: usize, now: DateTime<Utc>) -> Vec<NextJob> {
    let mut scheduled: Vec<(&ScheduledJob, DateTime<Utc>)> = jobs
        .iter()
        .filter(|job| job.enabled)
        .filter_map(|job| job.next_run.map(|at| (job, at)))
        .collect();
    scheduled.sort_by_key(|(_, at)| *at);

    scheduled
        .into_iter()
        .take(count)
        .map(|(job, next_run)| NextJob {
            id: job.id.clone(),
            name: job.name.clone(),
            schedule: format!("{}: {}", job.schedule_kind, job.schedule_expr),
            next_run,
            minutes_until: (next_run - now).num_milliseconds().div_euclid(60_000),
            overdue: next_run <= now,
            last_status: job.last_status.clone(),
        })
        .collect()
}
