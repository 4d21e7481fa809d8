//! Session log parser
//!
//! Parses the agent runtime's session logs from
//! `<state>/agents/main/sessions/{session_id}.jsonl`. Each file is read as
//! newline-delimited JSON records, in order:
//!
//! - `session` opens the session summary (first one wins)
//! - `model_change` and `custom`/`model-snapshot` switch the current provider/model
//! - `message` records with a `usage` object become [`UsageRecord`]s, falling
//!   back to the current provider/model when the message carries none
//!
//! Lines that fail to decode are skipped. Parse results are cached per file
//! and reused while the file's (mtime, size) identity is unchanged.

use crate::schema::{LogMessage, LogRecord, first_text, snapshot_model};
use chrono::{DateTime, Utc};
use clawstat_core::cache::{FileCache, FileIdentity};
use clawstat_core::error::{ClawstatError, Result};
use clawstat_core::timezone::TimezoneConfig;
use clawstat_core::types::{
    CostBreakdown, DELIVERY_MIRROR_MODEL, ISOTimestamp, SessionId, SessionSummary, TokenCounts,
    UNKNOWN, UsageRecord,
};
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// File names containing this marker belong to deleted sessions
pub const DELETED_MARKER: &str = ".deleted.";

/// User messages whose first text block contains one of these were injected by automation
pub const DEFAULT_SYSTEM_MARKERS: &[&str] = &["System: [", "[cron:", "HEARTBEAT", "Exec completed"];

const MODEL_SNAPSHOT: &str = "model-snapshot";
const SECONDS_PER_DAY: u64 = 86_400;

/// Author class of a conversational message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Assistant,
    /// User-role message produced by automation
    System,
}

/// One user or assistant message, kept so message counts can reuse the parse cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageMark {
    /// `None` when the record's timestamp did not parse
    pub timestamp: Option<DateTime<Utc>>,
    pub role: MessageRole,
}

/// Parse result for one session log
#[derive(Debug, Clone)]
pub struct ParsedSession {
    pub path: PathBuf,
    /// Identity of the file when it was read
    pub identity: FileIdentity,
    /// Retained usage records, in file order
    pub entries: Vec<UsageRecord>,
    pub summary: SessionSummary,
    pub messages: Vec<MessageMark>,
    pub parsed_at: DateTime<Utc>,
}

impl ParsedSession {
    /// Latest usage record timestamp
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.entries.iter().map(|e| *e.timestamp.inner()).max()
    }
}

/// Why a file produced no parse result without failing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The file does not exist (or vanished before it could be read)
    Missing,
    /// The file name carries the deletion marker
    Deleted,
}

/// Outcome of parsing one file
#[derive(Debug)]
pub enum ParseOutcome {
    Parsed(Arc<ParsedSession>),
    Skipped(SkipReason),
    /// The file exists but could not be read
    Failed(ClawstatError),
}

impl ParseOutcome {
    /// The parse result, if there is one
    pub fn parsed(self) -> Option<Arc<ParsedSession>> {
        match self {
            ParseOutcome::Parsed(session) => Some(session),
            _ => None,
        }
    }
}

/// Whether `path` names a deleted session
pub fn is_deleted(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.contains(DELETED_MARKER))
}

/// Parser state while walking one file
struct SessionScan<'a> {
    session_id: SessionId,
    timezone: &'a TimezoneConfig,
    system_markers: &'a [String],
    provider: String,
    model: String,
    summary: Option<SessionSummary>,
    entries: Vec<UsageRecord>,
    messages: Vec<MessageMark>,
}

impl<'a> SessionScan<'a> {
    fn new(session_id: SessionId, timezone: &'a TimezoneConfig, system_markers: &'a [String]) -> Self {
        Self {
            session_id,
            timezone,
            system_markers,
            provider: UNKNOWN.to_string(),
            model: UNKNOWN.to_string(),
            summary: None,
            entries: Vec::new(),
            messages: Vec::new(),
        }
    }

    fn feed(&mut self, record: LogRecord) {
        match record {
            LogRecord::Session { id, timestamp, cwd } => {
                if self.summary.is_some() {
                    return;
                }
                let started_at = timestamp
                    .as_deref()
                    .and_then(|ts| self.timezone.parse_timestamp(ts))
                    .unwrap_or_else(Utc::now);
                let id = id
                    .map(SessionId::new)
                    .unwrap_or_else(|| self.session_id.clone());
                self.summary = Some(SessionSummary::new(id, started_at, cwd.unwrap_or_default()));
            }
            LogRecord::ModelChange { provider, model_id } => {
                self.switch_model(provider.as_deref(), model_id.as_deref());
            }
            LogRecord::Custom { custom_type, data } => {
                if custom_type.as_deref() == Some(MODEL_SNAPSHOT)
                    && let Some(data) = data
                {
                    let (provider, model) = snapshot_model(&data);
                    self.switch_model(provider, model);
                }
            }
            LogRecord::Message { timestamp, message } => {
                if let Some(message) = message {
                    self.message(timestamp.as_deref(), message);
                }
            }
            LogRecord::Other => {}
        }
    }

    fn switch_model(&mut self, provider: Option<&str>, model: Option<&str>) {
        if let Some(provider) = provider {
            self.provider = provider.to_string();
        }
        if let Some(model) = model {
            self.model = model.to_string();
        }
    }

    fn message(&mut self, raw_timestamp: Option<&str>, message: LogMessage) {
        let timestamp = raw_timestamp.and_then(|ts| self.timezone.parse_timestamp(ts));
        let model = message.model.clone().unwrap_or_else(|| self.model.clone());
        if model == DELIVERY_MIRROR_MODEL {
            return;
        }

        self.mark(timestamp, &message);

        let Some(usage) = message.usage else {
            return;
        };
        let Some(timestamp) = timestamp else {
            return;
        };

        let tokens = TokenCounts::new(
            usage.input,
            usage.output,
            usage.cache_read,
            usage.cache_write,
        );
        let total_tokens = usage.total_tokens.unwrap_or_else(|| tokens.total());
        if total_tokens == 0 {
            return;
        }

        let cost = usage
            .cost
            .map(|c| CostBreakdown {
                total: c.total,
                input: c.input,
                output: c.output,
                cache_read: c.cache_read,
                cache_write: c.cache_write,
            })
            .unwrap_or_default();

        self.entries.push(UsageRecord {
            session_id: self.session_id.clone(),
            timestamp: ISOTimestamp::new(timestamp),
            provider: message.provider.unwrap_or_else(|| self.provider.clone()),
            model,
            tokens,
            total_tokens,
            cost,
        });
    }

    fn mark(&mut self, timestamp: Option<DateTime<Utc>>, message: &LogMessage) {
        let role = match message.role.as_deref() {
            Some("assistant") => MessageRole::Assistant,
            Some("user") => {
                let text = message.content.as_ref().map(first_text).unwrap_or("");
                if self.system_markers.iter().any(|m| text.contains(m.as_str())) {
                    MessageRole::System
                } else {
                    MessageRole::User
                }
            }
            _ => return,
        };
        self.messages.push(MessageMark { timestamp, role });
    }

    fn finish(
        self,
        fallback_start: DateTime<Utc>,
    ) -> (Vec<UsageRecord>, SessionSummary, Vec<MessageMark>) {
        let mut summary = self
            .summary
            .unwrap_or_else(|| SessionSummary::new(self.session_id.clone(), fallback_start, ""));
        summary.provider = self.provider;
        summary.model = self.model;
        let summary = summary.with_totals(&self.entries);
        (self.entries, summary, self.messages)
    }
}

/// Parses session logs and caches one result per file
pub struct SessionParser {
    sessions_dir: PathBuf,
    timezone: TimezoneConfig,
    system_markers: Vec<String>,
    cache: FileCache<ParsedSession>,
    file_reads: AtomicU64,
}

impl SessionParser {
    /// Create a parser for the logs in `sessions_dir`
    pub fn new(sessions_dir: impl Into<PathBuf>, timezone: TimezoneConfig) -> Self {
        let sessions_dir = sessions_dir.into();
        if !sessions_dir.exists() {
            debug!("Sessions directory not found: {}", sessions_dir.display());
        }

        Self {
            sessions_dir,
            timezone,
            system_markers: DEFAULT_SYSTEM_MARKERS.iter().map(|m| m.to_string()).collect(),
            cache: FileCache::new(),
            file_reads: AtomicU64::new(0),
        }
    }

    /// Replace the markers that classify user messages as automated
    pub fn with_system_markers(mut self, markers: Vec<String>) -> Self {
        self.system_markers = markers;
        self.cache.clear();
        self
    }

    pub fn sessions_dir(&self) -> &Path {
        &self.sessions_dir
    }

    pub fn timezone(&self) -> &TimezoneConfig {
        &self.timezone
    }

    /// Number of times a log file has been opened for reading
    pub fn file_reads(&self) -> u64 {
        self.file_reads.load(Ordering::Relaxed)
    }

    /// Number of files with a cached parse result
    pub fn cached_files(&self) -> usize {
        self.cache.len()
    }

    /// Drop every cached parse result
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Drop the cached parse result of one file
    pub fn invalidate(&self, path: &Path) -> bool {
        self.cache.invalidate(path)
    }

    /// Parse one file, reusing the cached result while its identity is unchanged
    pub fn parse_file(&self, path: &Path) -> ParseOutcome {
        self.parse_with(path, false)
    }

    /// Parse one file, ignoring any cached result
    pub fn parse_file_forced(&self, path: &Path) -> ParseOutcome {
        self.parse_with(path, true)
    }

    /// Parse every session log whose mtime falls in the last `days` days
    ///
    /// `None` scans every file in the directory. A missing directory yields
    /// nothing. Deleted sessions are excluded before any parse attempt.
    ///
    /// A full scan also evicts cached parses of files that are no longer
    /// listed, so renamed or removed logs do not stay in memory.
    pub fn scan(&self, days: Option<u32>) -> Vec<(PathBuf, ParseOutcome)> {
        let files = self.session_files(days);
        debug!(
            "Found {} session files in {}",
            files.len(),
            self.sessions_dir.display()
        );

        if days.is_none() {
            // `files` is sorted
            let evicted = self
                .cache
                .retain(|path| files.binary_search_by(|f| f.as_path().cmp(path)).is_ok());
            if evicted > 0 {
                debug!("Evicted {} cached sessions no longer on disk", evicted);
            }
        }

        files
            .into_iter()
            .map(|path| {
                let outcome = self.parse_file(&path);
                (path, outcome)
            })
            .collect()
    }

    /// Parsed sessions in the window that retained at least one usage record
    ///
    /// Unreadable files contribute nothing and are logged.
    pub fn sessions_with_usage(&self, days: Option<u32>) -> Vec<Arc<ParsedSession>> {
        self.scan(days)
            .into_iter()
            .filter_map(|(path, outcome)| match outcome {
                ParseOutcome::Parsed(session) => Some(session),
                ParseOutcome::Skipped(reason) => {
                    debug!("Skipping {}: {:?}", path.display(), reason);
                    None
                }
                ParseOutcome::Failed(e) => {
                    warn!("Failed to parse {}: {}", path.display(), e);
                    None
                }
            })
            .filter(|session| !session.entries.is_empty())
            .collect()
    }

    fn parse_with(&self, path: &Path, force: bool) -> ParseOutcome {
        if is_deleted(path) {
            return ParseOutcome::Skipped(SkipReason::Deleted);
        }

        let identity = match FileIdentity::of(path) {
            Ok(identity) => identity,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.cache.invalidate(path);
                return ParseOutcome::Skipped(SkipReason::Missing);
            }
            Err(e) => return ParseOutcome::Failed(ClawstatError::io_at(path, e)),
        };

        if !force && let Some(cached) = self.cache.get(path, &identity) {
            debug!("Parse cache hit for {}", path.display());
            return ParseOutcome::Parsed(cached);
        }

        match self.read_session(path, identity) {
            Ok(parsed) => {
                let parsed = Arc::new(parsed);
                self.cache
                    .insert(path.to_path_buf(), identity, Arc::clone(&parsed));
                ParseOutcome::Parsed(parsed)
            }
            Err(ClawstatError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                self.cache.invalidate(path);
                ParseOutcome::Skipped(SkipReason::Missing)
            }
            Err(e) => {
                self.cache.invalidate(path);
                ParseOutcome::Failed(e)
            }
        }
    }

    fn read_session(&self, path: &Path, identity: FileIdentity) -> Result<ParsedSession> {
        let file = File::open(path).map_err(|e| ClawstatError::io_at(path, e))?;
        self.file_reads.fetch_add(1, Ordering::Relaxed);

        let session_id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(UNKNOWN)
            .to_string();
        let mut scan = SessionScan::new(
            SessionId::new(session_id),
            &self.timezone,
            &self.system_markers,
        );

        let mut malformed = 0usize;
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| ClawstatError::io_at(path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<LogRecord>(&line) {
                Ok(record) => scan.feed(record),
                Err(_) => malformed += 1,
            }
        }
        if malformed > 0 {
            debug!("Skipped {} malformed lines in {}", malformed, path.display());
        }

        let (entries, summary, messages) = scan.finish(DateTime::<Utc>::from(identity.modified));
        debug!(
            "Parsed {}: {} usage records",
            path.display(),
            entries.len()
        );

        Ok(ParsedSession {
            path: path.to_path_buf(),
            identity,
            entries,
            summary,
            messages,
            parsed_at: Utc::now(),
        })
    }

    fn session_files(&self, days: Option<u32>) -> Vec<PathBuf> {
        if !self.sessions_dir.is_dir() {
            return Vec::new();
        }

        let cutoff = days.and_then(|days| {
            SystemTime::now().checked_sub(Duration::from_secs(u64::from(days) * SECONDS_PER_DAY))
        });

        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(&self.sessions_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "jsonl"))
            .filter(|e| !is_deleted(e.path()))
            .filter(|e| match cutoff {
                None => true,
                // Files that vanish or cannot be stat'ed are skipped
                Some(cutoff) => e
                    .metadata()
                    .ok()
                    .and_then(|m| m.modified().ok())
                    .is_some_and(|mtime| mtime >= cutoff),
            })
            .map(|e| e.into_path())
            .collect();
        files.sort();
        files
    }
}
