//! Output formatting module for clawstat
//!
//! This module provides formatters for displaying usage and job data in different formats:
//! - Table format for human-readable terminal output
//! - JSON format for machine-readable output and integration with other tools
//!
//! # Examples
//!
//! ```
//! use clawstat::output::get_formatter;
//! use clawstat_core::aggregation_types::{TodayStats, UsageTotals};
//! use clawstat_core::types::DailyDate;
//! use chrono::NaiveDate;
//!
//! let today = TodayStats::new(
//!     DailyDate::new(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()),
//!     &UsageTotals::default(),
//! );
//!
//! let formatter = get_formatter(false, chrono_tz::Tz::UTC);
//! assert!(formatter.format_today(&today).contains("2024-05-01"));
//!
//! let json_formatter = get_formatter(true, chrono_tz::Tz::UTC);
//! assert!(json_formatter.format_today(&today).contains("\"tokens_total\""));
//! ```

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clawstat_core::aggregation_types::{
    DailyStats, DashboardStats, MessageCounts, ProviderStats, SessionStats, TodayStats,
    TotalStats,
};
use clawstat_cron::{CronSummary, NextJob, RecentRun, ScheduledJob};
use prettytable::{Cell, Row, Table, format, row};
use serde::Serialize;

/// Trait for output formatters
///
/// One method per view; implementations decide the presentation.
pub trait OutputFormatter {
    fn format_today(&self, stats: &TodayStats) -> String;

    fn format_daily(&self, data: &[DailyStats]) -> String;

    fn format_total(&self, stats: &TotalStats) -> String;

    fn format_providers(&self, data: &[ProviderStats]) -> String;

    fn format_sessions(&self, data: &[SessionStats]) -> String;

    fn format_messages(&self, counts: &MessageCounts) -> String;

    fn format_dashboard(&self, stats: &DashboardStats) -> String;

    fn format_jobs(&self, jobs: &[ScheduledJob]) -> String;

    fn format_next_jobs(&self, jobs: &[NextJob]) -> String;

    fn format_recent_runs(&self, runs: &[RecentRun]) -> String;

    fn format_cron_summary(&self, summary: &CronSummary) -> String;
}

/// Table formatter for human-readable output
///
/// Numbers are formatted with thousands separators and timestamps are shown
/// in the configured timezone.
pub struct TableFormatter {
    tz: Tz,
}

impl TableFormatter {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Format a number with thousands separators
    fn format_number(n: u64) -> String {
        let s = n.to_string();
        let mut result = String::new();

        for (count, ch) in s.chars().rev().enumerate() {
            if count > 0 && count % 3 == 0 {
                result.push(',');
            }
            result.push(ch);
        }

        result.chars().rev().collect()
    }

    /// Format currency with dollar sign
    fn format_currency(amount: f64) -> String {
        format!("${amount:.4}")
    }

    fn format_datetime(&self, dt: &DateTime<Utc>) -> String {
        dt.with_timezone(&self.tz).format("%Y-%m-%d %H:%M").to_string()
    }

    fn format_optional_datetime(&self, dt: Option<&DateTime<Utc>>) -> String {
        dt.map(|dt| self.format_datetime(dt))
            .unwrap_or_else(|| "-".to_string())
    }

    fn table() -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table
    }

    fn key_value_table(rows: Vec<(&str, String)>) -> String {
        let mut table = Self::table();
        table.set_titles(row![b -> "Metric", b -> "Value"]);
        for (key, value) in rows {
            table.add_row(row![key, r -> value]);
        }
        table.to_string()
    }
}

impl OutputFormatter for TableFormatter {
    fn format_today(&self, stats: &TodayStats) -> String {
        Self::key_value_table(vec![
            ("Date", stats.date.to_string()),
            ("Input", Self::format_number(stats.tokens_input)),
            ("Output", Self::format_number(stats.tokens_output)),
            ("Cache Read", Self::format_number(stats.tokens_cache_read)),
            ("Cache Write", Self::format_number(stats.tokens_cache_write)),
            ("Total Tokens", Self::format_number(stats.tokens_total)),
            ("Cost", Self::format_currency(stats.cost_total_usd)),
            ("API Calls", Self::format_number(stats.api_calls)),
        ])
    }

    fn format_daily(&self, data: &[DailyStats]) -> String {
        let mut table = Self::table();

        table.set_titles(row![
            b -> "Date",
            b -> "Input",
            b -> "Output",
            b -> "Cache Read",
            b -> "Cache Write",
            b -> "Total",
            b -> "Cost",
            b -> "Calls"
        ]);

        for day in data {
            table.add_row(row![
                day.date.to_string(),
                r -> Self::format_number(day.input_tokens),
                r -> Self::format_number(day.output_tokens),
                r -> Self::format_number(day.cache_read_tokens),
                r -> Self::format_number(day.cache_write_tokens),
                r -> Self::format_number(day.total_tokens),
                r -> Self::format_currency(day.cost_usd),
                r -> Self::format_number(day.api_calls)
            ]);
        }

        // Add separator
        table.add_row(Row::new(vec![Cell::new(""); 8]));

        table.add_row(row![
            b -> "TOTAL",
            b -> Self::format_number(data.iter().map(|d| d.input_tokens).sum()),
            b -> Self::format_number(data.iter().map(|d| d.output_tokens).sum()),
            b -> Self::format_number(data.iter().map(|d| d.cache_read_tokens).sum()),
            b -> Self::format_number(data.iter().map(|d| d.cache_write_tokens).sum()),
            b -> Self::format_number(data.iter().map(|d| d.total_tokens).sum()),
            b -> Self::format_currency(data.iter().map(|d| d.cost_usd).sum()),
            b -> Self::format_number(data.iter().map(|d| d.api_calls).sum())
        ]);

        table.to_string()
    }

    fn format_total(&self, stats: &TotalStats) -> String {
        let span = match (stats.first_date, stats.last_date) {
            (Some(first), Some(last)) => format!("{first} .. {last}"),
            _ => "-".to_string(),
        };
        Self::key_value_table(vec![
            ("Period", span),
            ("Days", stats.total_days.to_string()),
            ("Input", Self::format_number(stats.input_tokens)),
            ("Output", Self::format_number(stats.output_tokens)),
            ("Cache Read", Self::format_number(stats.cache_read_tokens)),
            ("Cache Write", Self::format_number(stats.cache_write_tokens)),
            ("Total Tokens", Self::format_number(stats.total_tokens)),
            ("Cost", Self::format_currency(stats.cost_usd)),
            ("API Calls", Self::format_number(stats.api_calls)),
        ])
    }

    fn format_providers(&self, data: &[ProviderStats]) -> String {
        let mut table = Self::table();

        table.set_titles(row![
            b -> "Provider",
            b -> "Model",
            b -> "Input",
            b -> "Output",
            b -> "Total",
            b -> "Cost",
            b -> "Calls",
            b -> "Avg/Call"
        ]);

        for stats in data {
            table.add_row(row![
                stats.provider,
                stats.model,
                r -> Self::format_number(stats.input_tokens),
                r -> Self::format_number(stats.output_tokens),
                r -> Self::format_number(stats.total_tokens),
                r -> Self::format_currency(stats.cost_usd),
                r -> Self::format_number(stats.call_count),
                r -> Self::format_number(stats.avg_tokens_per_call)
            ]);
        }

        table.to_string()
    }

    fn format_sessions(&self, data: &[SessionStats]) -> String {
        let mut table = Self::table();

        table.set_titles(row![
            b -> "Session ID",
            b -> "Started",
            b -> "Last Activity",
            b -> "Model",
            b -> "Entries",
            b -> "Total Tokens",
            b -> "Cost"
        ]);

        for session in data {
            table.add_row(row![
                session.session_id.as_str(),
                self.format_datetime(&session.started_at),
                self.format_optional_datetime(session.last_activity.as_ref()),
                format!("{}/{}", session.provider, session.model),
                r -> session.entry_count,
                r -> Self::format_number(session.total_tokens),
                r -> Self::format_currency(session.cost_usd)
            ]);
        }

        table.to_string()
    }

    fn format_messages(&self, counts: &MessageCounts) -> String {
        Self::key_value_table(vec![
            ("User", Self::format_number(counts.user)),
            ("Assistant", Self::format_number(counts.assistant)),
            ("System", Self::format_number(counts.system)),
            ("Total", Self::format_number(counts.total)),
        ])
    }

    fn format_dashboard(&self, stats: &DashboardStats) -> String {
        let mut output = String::new();

        output.push_str("=== TODAY ===\n");
        output.push_str(&self.format_today(&stats.today));
        output.push_str("\n=== LAST 7 DAYS ===\n");
        output.push_str(&self.format_daily(&stats.daily_history));
        output.push_str("\n=== PROVIDERS (TODAY) ===\n");
        output.push_str(&self.format_providers(&stats.providers));
        output.push_str(&format!(
            "\nGenerated at {}\n",
            self.format_datetime(&stats.timestamp)
        ));

        output
    }

    fn format_jobs(&self, jobs: &[ScheduledJob]) -> String {
        let mut table = Self::table();

        table.set_titles(row![
            b -> "Name",
            b -> "Enabled",
            b -> "Kind",
            b -> "Schedule",
            b -> "Next Run",
            b -> "Last Run",
            b -> "Status",
            b -> "Target",
            b -> "Payload"
        ]);

        for job in jobs {
            let schedule = match &job.timezone {
                Some(tz) => format!("{} ({tz})", job.schedule_expr),
                None => job.schedule_expr.clone(),
            };
            table.add_row(row![
                job.name,
                if job.enabled { "yes" } else { "no" },
                job.schedule_kind.as_str(),
                schedule,
                self.format_optional_datetime(job.next_run.as_ref()),
                self.format_optional_datetime(job.last_run.as_ref()),
                job.last_status.as_deref().unwrap_or("-"),
                job.session_target,
                job.payload_text.as_deref().unwrap_or(job.payload_kind.as_str())
            ]);
        }

        table.to_string()
    }

    fn format_next_jobs(&self, jobs: &[NextJob]) -> String {
        let mut table = Self::table();

        table.set_titles(row![
            b -> "Name",
            b -> "Schedule",
            b -> "Next Run",
            b -> "In",
            b -> "Last Status"
        ]);

        for job in jobs {
            let due = if job.overdue {
                "overdue".to_string()
            } else {
                format!("{}m", job.minutes_until)
            };
            table.add_row(row![
                job.name,
                job.schedule,
                self.format_datetime(&job.next_run),
                r -> due,
                job.last_status.as_deref().unwrap_or("-")
            ]);
        }

        table.to_string()
    }

    fn format_recent_runs(&self, runs: &[RecentRun]) -> String {
        let mut table = Self::table();

        table.set_titles(row![
            b -> "Name",
            b -> "Last Run",
            b -> "Status",
            b -> "Duration",
            b -> "Enabled"
        ]);

        for run in runs {
            let duration = run
                .duration_ms
                .map(|ms| format!("{:.1}s", ms as f64 / 1000.0))
                .unwrap_or_else(|| "-".to_string());
            table.add_row(row![
                run.name,
                self.format_datetime(&run.last_run),
                run.last_status.as_deref().unwrap_or("-"),
                r -> duration,
                if run.enabled { "yes" } else { "no" }
            ]);
        }

        table.to_string()
    }

    fn format_cron_summary(&self, summary: &CronSummary) -> String {
        let by_kind = if summary.by_schedule_kind.is_empty() {
            "-".to_string()
        } else {
            summary
                .by_schedule_kind
                .iter()
                .map(|(kind, count)| format!("{kind}: {count}"))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut output = Self::key_value_table(vec![
            ("Total Jobs", summary.total_jobs.to_string()),
            ("Enabled", summary.enabled_jobs.to_string()),
            ("Disabled", summary.disabled_jobs.to_string()),
            ("By Kind", by_kind),
            ("Recent Failures", summary.recent_failures.to_string()),
            ("Skipped Entries", summary.skipped_jobs.to_string()),
        ]);
        output.push_str("\n=== NEXT RUNS ===\n");
        output.push_str(&self.format_next_jobs(&summary.next_jobs));
        output
    }
}

/// JSON formatter for machine-readable output
///
/// Serializes the result values as they are.
pub struct JsonFormatter;

impl JsonFormatter {
    fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
        serde_json::to_string_pretty(value)
            .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_today(&self, stats: &TodayStats) -> String {
        Self::to_json(stats)
    }

    fn format_daily(&self, data: &[DailyStats]) -> String {
        Self::to_json(data)
    }

    fn format_total(&self, stats: &TotalStats) -> String {
        Self::to_json(stats)
    }

    fn format_providers(&self, data: &[ProviderStats]) -> String {
        Self::to_json(data)
    }

    fn format_sessions(&self, data: &[SessionStats]) -> String {
        Self::to_json(data)
    }

    fn format_messages(&self, counts: &MessageCounts) -> String {
        Self::to_json(counts)
    }

    fn format_dashboard(&self, stats: &DashboardStats) -> String {
        Self::to_json(stats)
    }

    fn format_jobs(&self, jobs: &[ScheduledJob]) -> String {
        Self::to_json(jobs)
    }

    fn format_next_jobs(&self, jobs: &[NextJob]) -> String {
        Self::to_json(jobs)
    }

    fn format_recent_runs(&self, runs: &[RecentRun]) -> String {
        Self::to_json(runs)
    }

    fn format_cron_summary(&self, summary: &CronSummary) -> String {
        Self::to_json(summary)
    }
}

/// Get the appropriate formatter based on output format preference
pub fn get_formatter(json: bool, tz: Tz) -> Box<dyn OutputFormatter + Send + Sync> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(TableFormatter::new(tz))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use clawstat_core::aggregation_types::UsageTotals;
    use clawstat_core::types::{DailyDate, SessionId, TokenCounts};
    use clawstat_cron::ScheduleKind;
    use std::collections::BTreeMap;

    fn date(y: i32, m: u32, d: u32) -> DailyDate {
        DailyDate::new(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn totals(input: u64, output: u64, cost: f64, calls: u64) -> UsageTotals {
        UsageTotals {
            tokens: TokenCounts::new(input, output, 0, 0),
            total_tokens: input + output,
            cost,
            calls,
        }
    }

    fn next_job(name: &str, minutes_until: i64) -> NextJob {
        NextJob {
            id: name.to_lowercase(),
            name: name.to_string(),
            schedule: "every: every 30m".to_string(),
            next_run: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
            minutes_until,
            overdue: minutes_until < 0,
            last_status: Some("ok".to_string()),
        }
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(TableFormatter::format_number(1234567), "1,234,567");
        assert_eq!(TableFormatter::format_number(999), "999");
        assert_eq!(TableFormatter::format_number(0), "0");
        assert_eq!(TableFormatter::format_number(1000000000), "1,000,000,000");
    }

    #[test]
    fn test_currency_formatting() {
        assert_eq!(TableFormatter::format_currency(0.0123), "$0.0123");
        assert_eq!(TableFormatter::format_currency(0.0), "$0.0000");
        assert_eq!(TableFormatter::format_currency(12.5), "$12.5000");
    }

    #[test]
    fn test_datetime_formatting_with_timezone() {
        let dt = Utc.with_ymd_and_hms(2024, 5, 1, 23, 30, 0).unwrap();
        assert_eq!(
            TableFormatter::new(Tz::UTC).format_datetime(&dt),
            "2024-05-01 23:30"
        );
        assert_eq!(
            TableFormatter::new(Tz::Asia__Tokyo).format_datetime(&dt),
            "2024-05-02 08:30"
        );
    }

    #[test]
    fn test_table_formatter_daily() {
        let formatter = TableFormatter::new(Tz::UTC);

        let empty_output = formatter.format_daily(&[]);
        assert!(empty_output.contains("TOTAL"));

        let data = vec![
            DailyStats::new(date(2024, 5, 1), &totals(1000, 500, 0.25, 3)),
            DailyStats::new(date(2024, 5, 2), &totals(2000, 0, 0.5, 1)),
        ];
        let output = formatter.format_daily(&data);
        assert!(output.contains("2024-05-01"));
        assert!(output.contains("2024-05-02"));
        assert!(output.contains("1,500"));
        assert!(output.contains("3,000"));
        assert!(output.contains("$0.7500"));
    }

    #[test]
    fn test_table_formatter_views() {
        let formatter = TableFormatter::new(Tz::UTC);

        let today = TodayStats::new(date(2024, 5, 1), &totals(100, 50, 0.01, 1));
        let output = formatter.format_today(&today);
        assert!(output.contains("150"));
        assert!(output.contains("$0.0100"));

        let providers = vec![ProviderStats::new(
            "anthropic".into(),
            "claude-opus-4".into(),
            &totals(10_000, 2_000, 1.5, 4),
        )];
        let output = formatter.format_providers(&providers);
        assert!(output.contains("claude-opus-4"));
        assert!(output.contains("3,000"));

        let sessions = vec![SessionStats {
            session_id: SessionId::new("abc-123"),
            started_at: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
            last_activity: None,
            provider: "openai".into(),
            model: "gpt-5".into(),
            total_tokens: 42,
            cost_usd: 0.0042,
            entry_count: 2,
        }];
        let output = formatter.format_sessions(&sessions);
        assert!(output.contains("abc-123"));
        assert!(output.contains("openai/gpt-5"));
        assert!(output.contains("2024-05-01 08:00"));

        let counts = MessageCounts {
            user: 3,
            assistant: 4,
            system: 2,
            total: 7,
        };
        assert!(formatter.format_messages(&counts).contains("Assistant"));
    }

    #[test]
    fn test_table_formatter_cron() {
        let formatter = TableFormatter::new(Tz::UTC);

        let output = formatter.format_next_jobs(&[next_job("Heartbeat", 10), next_job("Late", -2)]);
        assert!(output.contains("Heartbeat"));
        assert!(output.contains("10m"));
        assert!(output.contains("overdue"));

        let mut by_kind = BTreeMap::new();
        by_kind.insert(ScheduleKind::Every, 2);
        by_kind.insert(ScheduleKind::Cron, 1);
        let summary = CronSummary {
            total_jobs: 4,
            enabled_jobs: 3,
            disabled_jobs: 1,
            by_schedule_kind: by_kind,
            recent_failures: 1,
            skipped_jobs: 2,
            next_jobs: vec![next_job("Heartbeat", 10)],
        };
        let output = formatter.format_cron_summary(&summary);
        assert!(output.contains("cron: 1, every: 2"));
        assert!(output.contains("Skipped Entries"));
        assert!(output.contains("NEXT RUNS"));

        let runs = vec![RecentRun {
            id: "b".into(),
            name: "Briefing".into(),
            last_run: Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap(),
            last_status: Some("error".into()),
            duration_ms: Some(5300),
            enabled: false,
        }];
        let output = formatter.format_recent_runs(&runs);
        assert!(output.contains("5.3s"));
        assert!(output.contains("error"));
    }

    #[test]
    fn test_json_formatter() {
        let formatter = JsonFormatter;

        let today = TodayStats::new(date(2024, 5, 1), &totals(100, 50, 0.01, 1));
        let value: serde_json::Value =
            serde_json::from_str(&formatter.format_today(&today)).unwrap();
        assert_eq!(value["tokens_total"], 150);
        assert_eq!(value["api_calls"], 1);
        assert_eq!(value["date"], "2024-05-01");

        let value: serde_json::Value =
            serde_json::from_str(&formatter.format_daily(&[])).unwrap();
        assert_eq!(value, serde_json::json!([]));

        let value: serde_json::Value =
            serde_json::from_str(&formatter.format_next_jobs(&[next_job("Late", -2)])).unwrap();
        assert_eq!(value[0]["overdue"], true);
        assert_eq!(value[0]["minutes_until"], -2);
    }

    #[test]
    fn test_get_formatter() {
        let today = TodayStats::new(date(2024, 5, 1), &UsageTotals::default());
        assert!(get_formatter(true, Tz::UTC)
            .format_today(&today)
            .starts_with('{'));
        assert!(get_formatter(false, Tz::UTC)
            .format_today(&today)
            .contains("Metric"));
    }
}
