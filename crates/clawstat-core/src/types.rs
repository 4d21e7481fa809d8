//! Core domain types for clawstat
//!
//! Strongly-typed values shared by the session parser, the aggregator and the
//! output layer: session ids, timestamps, calendar dates, token counts and the
//! cost breakdown carried by every usage record.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

/// Model name used for delivery-echo messages. These never carry real usage.
pub const DELIVERY_MIRROR_MODEL: &str = "delivery-mirror";

/// Provider/model placeholder before any `model_change` record has been seen.
pub const UNKNOWN: &str = "unknown";

/// Strongly-typed session ID wrapper
///
/// # Examples
/// ```
/// use clawstat_core::types::SessionId;
///
/// let session = SessionId::new("4f1c2a9e");
/// assert_eq!(session.as_str(), "4f1c2a9e");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new SessionId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// ISO timestamp wrapper for UTC timestamps
///
/// # Examples
/// ```
/// use clawstat_core::types::ISOTimestamp;
/// use chrono::{TimeZone, Utc};
///
/// let dt = Utc.with_ymd_and_hms(2024, 1, 15, 23, 30, 0).unwrap();
/// let timestamp = ISOTimestamp::new(dt);
///
/// let tokyo: chrono_tz::Tz = "Asia/Tokyo".parse().unwrap();
/// assert_eq!(timestamp.to_daily_date_with_tz(&tokyo).to_string(), "2024-01-16");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ISOTimestamp(DateTime<Utc>);

impl ISOTimestamp {
    /// Create a new ISOTimestamp
    pub fn new(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Get the inner DateTime
    pub fn inner(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Convert to DailyDate using specified timezone
    pub fn to_daily_date_with_tz(&self, tz: &Tz) -> DailyDate {
        DailyDate::new(self.0.with_timezone(tz).date_naive())
    }
}

impl AsRef<DateTime<Utc>> for ISOTimestamp {
    fn as_ref(&self) -> &DateTime<Utc> {
        &self.0
    }
}

/// Calendar date used as a daily bucket key
///
/// Serializes as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DailyDate(NaiveDate);

impl DailyDate {
    /// Create a new DailyDate
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Get the inner NaiveDate
    pub fn inner(&self) -> &NaiveDate {
        &self.0
    }

    /// Number of days from `self` to `later`, inclusive of both ends
    pub fn span_days(&self, later: &DailyDate) -> i64 {
        (later.0 - self.0).num_days() + 1
    }
}

impl fmt::Display for DailyDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Token counts for one usage record or an accumulation of them
///
/// # Examples
/// ```
/// use clawstat_core::types::TokenCounts;
///
/// let tokens = TokenCounts::new(100, 50, 10, 5);
/// assert_eq!(tokens.total(), 165);
///
/// let combined = tokens + TokenCounts::new(50, 25, 5, 2);
/// assert_eq!(combined.input_tokens, 150);
/// ```
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenCounts {
    /// Input tokens used
    pub input_tokens: u64,
    /// Output tokens generated
    pub output_tokens: u64,
    /// Tokens served from the prompt cache
    pub cache_read_tokens: u64,
    /// Tokens written to the prompt cache
    pub cache_write_tokens: u64,
}

impl TokenCounts {
    /// Create new TokenCounts
    pub fn new(
        input_tokens: u64,
        output_tokens: u64,
        cache_read_tokens: u64,
        cache_write_tokens: u64,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            cache_read_tokens,
            cache_write_tokens,
        }
    }

    /// Sum of all four components, saturating at `u64::MAX`
    pub fn total(&self) -> u64 {
        self.input_tokens
            .saturating_add(self.output_tokens)
            .saturating_add(self.cache_read_tokens)
            .saturating_add(self.cache_write_tokens)
    }
}

impl Add for TokenCounts {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            input_tokens: self.input_tokens.saturating_add(other.input_tokens),
            output_tokens: self.output_tokens.saturating_add(other.output_tokens),
            cache_read_tokens: self.cache_read_tokens.saturating_add(other.cache_read_tokens),
            cache_write_tokens: self.cache_write_tokens.saturating_add(other.cache_write_tokens),
        }
    }
}

impl AddAssign for TokenCounts {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

/// Cost of one usage record in USD, as reported by the agent runtime
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CostBreakdown {
    pub total: f64,
    pub input: f64,
    pub output: f64,
    pub cache_read: f64,
    pub cache_write: f64,
}

/// One billable model invocation extracted from a session log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UsageRecord {
    /// Session the record belongs to (the log file stem)
    pub session_id: SessionId,
    /// When the invocation happened
    pub timestamp: ISOTimestamp,
    pub provider: String,
    pub model: String,
    /// Per-kind token counts
    #[serde(flatten)]
    pub tokens: TokenCounts,
    /// Total tokens as reported by the runtime
    pub total_tokens: u64,
    pub cost: CostBreakdown,
}

/// Rollup of one session log file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub started_at: DateTime<Utc>,
    /// Last provider seen in the file
    pub provider: String,
    /// Last model seen in the file
    pub model: String,
    /// Working directory the session was started in (empty if unknown)
    pub cwd: String,
    pub total_entries: usize,
    pub total_tokens: u64,
    pub total_cost: f64,
}

impl SessionSummary {
    /// Create a summary with no usage attached yet
    pub fn new(session_id: SessionId, started_at: DateTime<Utc>, cwd: impl Into<String>) -> Self {
        Self {
            session_id,
            started_at,
            provider: UNKNOWN.to_string(),
            model: UNKNOWN.to_string(),
            cwd: cwd.into(),
            total_entries: 0,
            total_tokens: 0,
            total_cost: 0.0,
        }
    }

    /// Replace the aggregate fields with sums over `records`
    pub fn with_totals(mut self, records: &[UsageRecord]) -> Self {
        self.total_entries = records.len();
        self.total_tokens = records
            .iter()
            .fold(0u64, |sum, r| sum.saturating_add(r.total_tokens));
        self.total_cost = records.iter().map(|r| r.cost.total).sum();
        self
    }
}

/// Round a USD amount to 4 decimal places for display and serialization
pub fn round_cost(amount: f64) -> f64 {
    (amount * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(total_tokens: u64, cost: f64) -> UsageRecord {
        UsageRecord {
            session_id: SessionId::new("s1"),
            timestamp: ISOTimestamp::new(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()),
            provider: "anthropic".into(),
            model: "claude-opus-4".into(),
            tokens: TokenCounts::new(total_tokens, 0, 0, 0),
            total_tokens,
            cost: CostBreakdown {
                total: cost,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_token_counts_add_assign() {
        let mut tokens = TokenCounts::new(1, 2, 3, 4);
        tokens += TokenCounts::new(10, 20, 30, 40);
        assert_eq!(tokens, TokenCounts::new(11, 22, 33, 44));
        assert_eq!(tokens.total(), 110);
    }

    #[test]
    fn test_token_counts_saturate() {
        let huge = TokenCounts::new(u64::MAX, 1, 0, 0);
        assert_eq!(huge.total(), u64::MAX);

        let mut tokens = TokenCounts::new(u64::MAX - 1, 0, 0, 0);
        tokens += TokenCounts::new(5, 0, 0, 0);
        assert_eq!(tokens.input_tokens, u64::MAX);

        let summary = SessionSummary::new(SessionId::new("s1"), Utc::now(), "")
            .with_totals(&[record(u64::MAX, 0.0), record(1, 0.0)]);
        assert_eq!(summary.total_tokens, u64::MAX);
    }

    #[test]
    fn test_daily_date_span_and_display() {
        let first = DailyDate::new(NaiveDate::from_ymd_opt(2024, 2, 27).unwrap());
        let last = DailyDate::new(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert_eq!(first.span_days(&last), 5);
        assert_eq!(first.span_days(&first), 1);
        assert_eq!(last.to_string(), "2024-03-02");
    }

    #[test]
    fn test_daily_date_serializes_as_plain_date() {
        let date = DailyDate::new(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert_eq!(serde_json::to_string(&date).unwrap(), "\"2024-03-02\"");
    }

    #[test]
    fn test_summary_totals() {
        let started = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let summary = SessionSummary::new(SessionId::new("s1"), started, "/work")
            .with_totals(&[record(100, 0.25), record(50, 0.5)]);
        assert_eq!(summary.total_entries, 2);
        assert_eq!(summary.total_tokens, 150);
        assert!((summary.total_cost - 0.75).abs() < f64::EPSILON);
        assert_eq!(summary.provider, UNKNOWN);
    }

    #[test]
    fn test_round_cost() {
        assert_eq!(round_cost(0.123456), 0.1235);
        assert_eq!(round_cost(0.0), 0.0);
        assert_eq!(round_cost(1.00004), 1.0);
    }
}
