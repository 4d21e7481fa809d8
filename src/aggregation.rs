//! Usage aggregation
//!
//! [`StatsAggregator`] turns the usage records of the session parser into the
//! dashboard's views: today, per day, all time, per provider/model, per
//! session and message counts. Each view is cached for the aggregator's TTL,
//! keyed by the query and its parameters; a fresh cached result is returned
//! without touching any file.
//!
//! The reductions themselves are plain functions over records so they can be
//! exercised without a sessions directory.
//!
//! # Examples
//!
//! ```no_run
//! use clawstat::aggregation::StatsAggregator;
//! use clawstat_core::timezone::TimezoneConfig;
//! use clawstat_sessions::SessionParser;
//! use std::sync::Arc;
//!
//! let parser = Arc::new(SessionParser::new(
//!     "/home/me/.openclaw/agents/main/sessions",
//!     TimezoneConfig::default(),
//! ));
//! let aggregator = StatsAggregator::new(parser);
//!
//! let today = aggregator.today_stats();
//! println!("{} tokens today, ${:.4}", today.tokens_total, today.cost_total_usd);
//!
//! for day in aggregator.daily_stats(Some(7)) {
//!     println!("{}: {} calls", day.date, day.api_calls);
//! }
//! ```

use chrono::{DateTime, Days, Utc};
use chrono_tz::Tz;
use clawstat_core::aggregation_types::{
    DailyStats, DashboardStats, MessageCounts, ProviderStats, SessionStats, TodayStats,
    TotalStats, UsageTotals,
};
use clawstat_core::cache::TtlCache;
use clawstat_core::config::DEFAULT_CACHE_TTL;
use clawstat_core::timezone::TimezoneConfig;
use clawstat_core::types::{DailyDate, UsageRecord, round_cost};
use clawstat_sessions::{MessageRole, ParseOutcome, ParsedSession, SessionParser};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Days of history shown on the dashboard
pub const DASHBOARD_HISTORY_DAYS: u32 = 7;
/// Provider window shown on the dashboard
pub const DASHBOARD_PROVIDER_DAYS: u32 = 1;

const SECONDS_PER_DAY: i64 = 86_400;

/// Cached usage views over one sessions directory
pub struct StatsAggregator {
    parser: Arc<SessionParser>,
    today: TtlCache<DailyDate, TodayStats>,
    daily: TtlCache<(Option<u32>, DailyDate), Vec<DailyStats>>,
    total: TtlCache<(), TotalStats>,
    providers: TtlCache<u32, Vec<ProviderStats>>,
    sessions: TtlCache<(u32, usize), Vec<SessionStats>>,
    messages: TtlCache<u32, MessageCounts>,
}

impl StatsAggregator {
    /// Create an aggregator with the default 30 second TTL
    pub fn new(parser: Arc<SessionParser>) -> Self {
        Self::with_ttl(parser, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(parser: Arc<SessionParser>, ttl: Duration) -> Self {
        Self {
            parser,
            today: TtlCache::new(ttl),
            daily: TtlCache::new(ttl),
            total: TtlCache::new(ttl),
            providers: TtlCache::new(ttl),
            sessions: TtlCache::new(ttl),
            messages: TtlCache::new(ttl),
        }
    }

    pub fn parser(&self) -> &SessionParser {
        &self.parser
    }

    pub fn timezone(&self) -> &TimezoneConfig {
        self.parser.timezone()
    }

    /// Total number of cache misses across all views
    pub fn computations(&self) -> u64 {
        self.today.computations()
            + self.daily.computations()
            + self.total.computations()
            + self.providers.computations()
            + self.sessions.computations()
            + self.messages.computations()
    }

    /// Drop every cached view and every cached file parse
    pub fn clear_cache(&self) {
        self.today.clear();
        self.daily.clear();
        self.total.clear();
        self.providers.clear();
        self.sessions.clear();
        self.messages.clear();
        self.parser.clear_cache();
    }

    /// Usage recorded on the current day in the reference timezone
    pub fn today_stats(&self) -> TodayStats {
        self.today_stats_at(Utc::now())
    }

    pub fn today_stats_at(&self, now: DateTime<Utc>) -> TodayStats {
        let today = self.timezone().date_of(&now);
        self.today.get_or_compute(today, || {
            let sessions = self.contributions(Some(1));
            summarize_today(records_of(&sessions), today, &self.timezone().tz)
        })
    }

    /// One bucket per day, oldest first
    ///
    /// With `Some(days)` the window is seeded with empty buckets for each of
    /// the last `days` days; `None` covers all data but only emits days that
    /// have usage.
    pub fn daily_stats(&self, days: Option<u32>) -> Vec<DailyStats> {
        self.daily_stats_at(days, Utc::now())
    }

    pub fn daily_stats_at(&self, days: Option<u32>, now: DateTime<Utc>) -> Vec<DailyStats> {
        let today = self.timezone().date_of(&now);
        self.daily.get_or_compute((days, today), || {
            let sessions = self.contributions(days);
            bucket_daily(records_of(&sessions), days, today, &self.timezone().tz)
        })
    }

    /// Usage over every session log in the directory
    pub fn total_stats(&self) -> TotalStats {
        self.total.get_or_compute((), || {
            let sessions = self.contributions(None);
            summarize_total(records_of(&sessions), &self.timezone().tz)
        })
    }

    /// Usage per (provider, model), most expensive first
    pub fn provider_stats(&self, days: u32) -> Vec<ProviderStats> {
        self.providers.get_or_compute(days, || {
            let sessions = self.contributions(Some(days));
            group_by_provider(records_of(&sessions))
        })
    }

    /// The `limit` most recently active sessions with usage
    pub fn session_stats(&self, days: u32, limit: usize) -> Vec<SessionStats> {
        self.sessions.get_or_compute((days, limit), || {
            let sessions = self.parser.sessions_with_usage(Some(days));
            rank_sessions(&sessions, limit)
        })
    }

    /// User, assistant and automated messages in the last `days` days
    pub fn message_counts(&self, days: u32) -> MessageCounts {
        self.message_counts_at(days, Utc::now())
    }

    pub fn message_counts_at(&self, days: u32, now: DateTime<Utc>) -> MessageCounts {
        self.messages.get_or_compute(days, || {
            let cutoff = now - chrono::Duration::seconds(i64::from(days) * SECONDS_PER_DAY);
            let sessions = self.contributions(Some(days));
            count_messages(&sessions, cutoff)
        })
    }

    /// Today, the last week and today's providers in one value
    pub fn dashboard_stats(&self) -> DashboardStats {
        let now = Utc::now();
        DashboardStats {
            today: self.today_stats_at(now),
            daily_history: self.daily_stats_at(Some(DASHBOARD_HISTORY_DAYS), now),
            providers: self.provider_stats(DASHBOARD_PROVIDER_DAYS),
            timestamp: now,
        }
    }

    /// Parsed sessions in the window; skipped and failed files contribute nothing
    fn contributions(&self, days: Option<u32>) -> Vec<Arc<ParsedSession>> {
        let scanned = self.parser.scan(days);
        let mut sessions = Vec::with_capacity(scanned.len());

        for (path, outcome) in scanned {
            match outcome {
                ParseOutcome::Parsed(session) => sessions.push(session),
                ParseOutcome::Skipped(reason) => {
                    debug!("Skipping {}: {:?}", path.display(), reason);
                }
                ParseOutcome::Failed(e) => {
                    warn!("Ignoring unreadable session log {}: {}", path.display(), e);
                }
            }
        }

        debug!(
            "Aggregating {} sessions (window: {:?} days)",
            sessions.len(),
            days
        );
        sessions
    }
}

fn records_of(sessions: &[Arc<ParsedSession>]) -> impl Iterator<Item = &UsageRecord> {
    sessions.iter().flat_map(|session| session.entries.iter())
}

/// Sum the records that fall on `today` in `tz`
pub fn summarize_today<'a>(
    records: impl IntoIterator<Item = &'a UsageRecord>,
    today: DailyDate,
    tz: &Tz,
) -> TodayStats {
    let totals = UsageTotals::from_records(
        records
            .into_iter()
            .filter(|record| record.timestamp.to_daily_date_with_tz(tz) == today),
    );
    TodayStats::new(today, &totals)
}

/// Group records into per-day buckets, sorted ascending by date
pub fn bucket_daily<'a>(
    records: impl IntoIterator<Item = &'a UsageRecord>,
    days: Option<u32>,
    today: DailyDate,
    tz: &Tz,
) -> Vec<DailyStats> {
    let mut buckets: BTreeMap<DailyDate, UsageTotals> = BTreeMap::new();

    if let Some(days) = days {
        for offset in 0..u64::from(days) {
            if let Some(date) = today.inner().checked_sub_days(Days::new(offset)) {
                buckets.insert(DailyDate::new(date), UsageTotals::default());
            }
        }
    }

    for record in records {
        let date = record.timestamp.to_daily_date_with_tz(tz);
        match (days, buckets.get_mut(&date)) {
            (_, Some(totals)) => *totals = totals.plus(record),
            (None, None) => {
                buckets.insert(date, UsageTotals::default().plus(record));
            }
            // Outside the seeded window
            (Some(_), None) => {}
        }
    }

    buckets
        .iter()
        .map(|(date, totals)| DailyStats::new(*date, totals))
        .collect()
}

/// Sum every record and track the first and last usage dates
pub fn summarize_total<'a>(
    records: impl IntoIterator<Item = &'a UsageRecord>,
    tz: &Tz,
) -> TotalStats {
    let mut totals = UsageTotals::default();
    let mut first: Option<DailyDate> = None;
    let mut last: Option<DailyDate> = None;

    for record in records {
        totals = totals.plus(record);
        let date = record.timestamp.to_daily_date_with_tz(tz);
        first = Some(first.map_or(date, |d| d.min(date)));
        last = Some(last.map_or(date, |d| d.max(date)));
    }

    TotalStats::new(&totals, first, last)
}

/// Group records by (provider, model), sorted descending by cost
pub fn group_by_provider<'a>(
    records: impl IntoIterator<Item = &'a UsageRecord>,
) -> Vec<ProviderStats> {
    let mut groups: BTreeMap<(&str, &str), UsageTotals> = BTreeMap::new();
    for record in records {
        let totals = groups
            .entry((record.provider.as_str(), record.model.as_str()))
            .or_default();
        *totals = totals.plus(record);
    }

    let mut groups: Vec<_> = groups.into_iter().collect();
    groups.sort_by(|a, b| b.1.cost.total_cmp(&a.1.cost));

    groups
        .into_iter()
        .map(|((provider, model), totals)| {
            ProviderStats::new(provider.to_string(), model.to_string(), &totals)
        })
        .collect()
}

/// One row per session with usage, most recently active first
pub fn rank_sessions(sessions: &[Arc<ParsedSession>], limit: usize) -> Vec<SessionStats> {
    let mut rows: Vec<SessionStats> = sessions
        .iter()
        .filter(|session| !session.entries.is_empty())
        .map(|session| {
            let summary = &session.summary;
            SessionStats {
                session_id: summary.session_id.clone(),
                started_at: summary.started_at,
                last_activity: session.last_activity(),
                provider: summary.provider.clone(),
                model: summary.model.clone(),
                total_tokens: summary.total_tokens,
                cost_usd: round_cost(summary.total_cost),
                entry_count: summary.total_entries,
            }
        })
        .collect();

    rows.sort_by(|a, b| b.recency().cmp(&a.recency()));
    rows.truncate(limit);
    rows
}

/// Count messages at or after `cutoff`; messages without a timestamp always count
pub fn count_messages(sessions: &[Arc<ParsedSession>], cutoff: DateTime<Utc>) -> MessageCounts {
    let mut counts = MessageCounts::default();

    for mark in sessions.iter().flat_map(|session| session.messages.iter()) {
        if mark.timestamp.is_some_and(|ts| ts < cutoff) {
            continue;
        }
        match mark.role {
            MessageRole::User => counts.user += 1,
            MessageRole::Assistant => counts.assistant += 1,
            MessageRole::System => counts.system += 1,
        }
    }

    counts.total = counts.user + counts.assistant;
    counts
}
