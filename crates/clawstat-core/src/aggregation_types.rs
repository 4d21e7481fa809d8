//! Aggregation data types for clawstat
//!
//! Pure data structures for aggregated usage views. Every row is a plain
//! serializable value; costs are rounded to 4 decimal places when a row is
//! built from [`UsageTotals`].

use crate::types::{DailyDate, SessionId, TokenCounts, UsageRecord, round_cost};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sums over a set of usage records
///
/// Built by folding records with [`UsageTotals::plus`]; never mutated in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageTotals {
    pub tokens: TokenCounts,
    /// Sum of the runtime-reported totals
    pub total_tokens: u64,
    pub cost: f64,
    /// Number of records folded in
    pub calls: u64,
}

impl UsageTotals {
    /// Totals with one more record folded in
    pub fn plus(self, record: &UsageRecord) -> Self {
        Self {
            tokens: self.tokens + record.tokens,
            total_tokens: self.total_tokens.saturating_add(record.total_tokens),
            cost: self.cost + record.cost.total,
            calls: self.calls.saturating_add(1),
        }
    }

    /// Fold any sequence of records
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a UsageRecord>) -> Self {
        records
            .into_iter()
            .fold(Self::default(), |totals, record| totals.plus(record))
    }
}

/// Usage for the current calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodayStats {
    pub date: DailyDate,
    pub tokens_total: u64,
    pub tokens_input: u64,
    pub tokens_output: u64,
    pub tokens_cache_read: u64,
    pub tokens_cache_write: u64,
    pub cost_total_usd: f64,
    pub api_calls: u64,
}

impl TodayStats {
    pub fn new(date: DailyDate, totals: &UsageTotals) -> Self {
        Self {
            date,
            tokens_total: totals.total_tokens,
            tokens_input: totals.tokens.input_tokens,
            tokens_output: totals.tokens.output_tokens,
            tokens_cache_read: totals.tokens.cache_read_tokens,
            tokens_cache_write: totals.tokens.cache_write_tokens,
            cost_total_usd: round_cost(totals.cost),
            api_calls: totals.calls,
        }
    }
}

/// One daily bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: DailyDate,
    pub total_tokens: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_read_tokens: u64,
    pub cache_write_tokens: u64,
    pub cost_usd: f64,
    pub api_calls: u64,
}

impl DailyStats {
    pub fn new(date: DailyDate, totals: &UsageTotals) -> Self {
        Self {
            date,
            total_tokens: totals.total_tokens,
            input_tokens: totals.tokens.input_tokens,
            output_tokens: totals.tokens.output_tokens,
            cache_read_tokens: totals.tokens.cache_read_tokens,
            cache_write_tokens: totals.tokens.cache_write_tokens,
            cost_usd: round_cost(totals.cost),
            api_calls: totals.calls,
        }
    }
}

/// All-time usage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalStats {
    pub total_tokens: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_read_tokens: u64,
    pub cache_write_tokens: u64,
    pub cost_usd: f64,
    pub api_calls: u64,
    pub first_date: Option<DailyDate>,
    pub last_date: Option<DailyDate>,
    /// Calendar days from first to last date, inclusive; zero without data
    pub total_days: i64,
}

impl TotalStats {
    pub fn new(totals: &UsageTotals, first: Option<DailyDate>, last: Option<DailyDate>) -> Self {
        let total_days = match (&first, &last) {
            (Some(first), Some(last)) => first.span_days(last),
            _ => 0,
        };
        Self {
            total_tokens: totals.total_tokens,
            input_tokens: totals.tokens.input_tokens,
            output_tokens: totals.tokens.output_tokens,
            cache_read_tokens: totals.tokens.cache_read_tokens,
            cache_write_tokens: totals.tokens.cache_write_tokens,
            cost_usd: round_cost(totals.cost),
            api_calls: totals.calls,
            first_date: first,
            last_date: last,
            total_days,
        }
    }
}

/// Usage grouped by (provider, model)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderStats {
    pub provider: String,
    pub model: String,
    pub total_tokens: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_read_tokens: u64,
    pub cost_usd: f64,
    pub call_count: u64,
    pub avg_tokens_per_call: u64,
}

impl ProviderStats {
    pub fn new(provider: String, model: String, totals: &UsageTotals) -> Self {
        Self {
            provider,
            model,
            total_tokens: totals.total_tokens,
            input_tokens: totals.tokens.input_tokens,
            output_tokens: totals.tokens.output_tokens,
            cache_read_tokens: totals.tokens.cache_read_tokens,
            cost_usd: round_cost(totals.cost),
            call_count: totals.calls,
            avg_tokens_per_call: totals.total_tokens.checked_div(totals.calls).unwrap_or(0),
        }
    }
}

/// One row per session log with usage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: SessionId,
    pub started_at: DateTime<Utc>,
    /// Timestamp of the latest usage record in the session
    pub last_activity: Option<DateTime<Utc>>,
    pub provider: String,
    pub model: String,
    pub total_tokens: u64,
    pub cost_usd: f64,
    pub entry_count: usize,
}

impl SessionStats {
    /// Sort key: latest activity, falling back to the start time
    pub fn recency(&self) -> DateTime<Utc> {
        self.last_activity.unwrap_or(self.started_at)
    }
}

/// Message counts by author class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageCounts {
    /// Messages typed by a person
    pub user: u64,
    pub assistant: u64,
    /// User-role messages injected by automation (cron triggers, heartbeats)
    pub system: u64,
    /// `user + assistant`
    pub total: u64,
}

/// Composite view for a dashboard landing page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub today: TodayStats,
    pub daily_history: Vec<DailyStats>,
    pub providers: Vec<ProviderStats>,
    pub timestamp: DateTime<Utc>,
}
