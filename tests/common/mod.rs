//! Common test utilities for clawstat integration tests
//!
//! [`MessageBuilder`] produces session log lines, [`Fixture`] lays out a
//! runtime state directory (session logs plus `cron/jobs.json`) in a temp dir.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use clawstat::aggregation::StatsAggregator;
use clawstat_core::config::DataPaths;
use clawstat_core::timezone::TimezoneConfig;
use clawstat_sessions::SessionParser;
use serde_json::{Value, json};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Providers and models used across tests
pub const TEST_MODELS: &[(&str, &str)] = &[
    ("anthropic", "claude-opus-4"),
    ("openai", "gpt-5"),
    ("google", "gemini-2.5-pro"),
];

/// Builder for one assistant `message` line with usage
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    timestamp: DateTime<Utc>,
    provider: String,
    model: String,
    input_tokens: u64,
    output_tokens: u64,
    cache_read_tokens: u64,
    cache_write_tokens: u64,
    cost: f64,
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBuilder {
    pub fn new() -> Self {
        let (provider, model) = TEST_MODELS[0];
        Self {
            timestamp: Utc::now(),
            provider: provider.to_string(),
            model: model.to_string(),
            input_tokens: 100,
            output_tokens: 50,
            cache_read_tokens: 0,
            cache_write_tokens: 0,
            cost: 0.01,
        }
    }

    pub fn with_timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.timestamp = ts;
        self
    }

    pub fn with_model(mut self, provider: &str, model: &str) -> Self {
        self.provider = provider.to_string();
        self.model = model.to_string();
        self
    }

    pub fn with_tokens(mut self, input: u64, output: u64) -> Self {
        self.input_tokens = input;
        self.output_tokens = output;
        self
    }

    pub fn with_cache_tokens(mut self, read: u64, write: u64) -> Self {
        self.cache_read_tokens = read;
        self.cache_write_tokens = write;
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens + self.cache_read_tokens + self.cache_write_tokens
    }

    /// Build as a JSONL line
    #[allow(clippy::wrong_self_convention)]
    pub fn to_jsonl(self) -> String {
        let total_tokens = self.total_tokens();
        json!({
            "type": "message",
            "timestamp": self.timestamp.to_rfc3339(),
            "message": {
                "role": "assistant",
                "provider": self.provider,
                "model": self.model,
                "usage": {
                    "input": self.input_tokens,
                    "output": self.output_tokens,
                    "cacheRead": self.cache_read_tokens,
                    "cacheWrite": self.cache_write_tokens,
                    "totalTokens": total_tokens,
                    "cost": {"total": self.cost}
                },
                "content": [{"type": "text", "text": "ok"}]
            }
        })
        .to_string()
    }
}

/// A `session` header line
pub fn session_line(id: &str, started_at: DateTime<Utc>) -> String {
    json!({
        "type": "session",
        "id": id,
        "timestamp": started_at.to_rfc3339(),
        "cwd": "/home/test/project"
    })
    .to_string()
}

/// A user message line without usage
pub fn user_line(ts: DateTime<Utc>, text: &str) -> String {
    json!({
        "type": "message",
        "timestamp": ts.to_rfc3339(),
        "message": {"role": "user", "content": [{"type": "text", "text": text}]}
    })
    .to_string()
}

/// Temporary runtime state directory
pub struct Fixture {
    pub dir: TempDir,
    pub paths: DataPaths,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let paths = DataPaths::from_base(dir.path());
        fs::create_dir_all(&paths.sessions_dir).unwrap();
        Self { dir, paths }
    }

    /// Write `<name>.jsonl` into the sessions directory
    pub fn write_session(&self, name: &str, lines: &[String]) -> PathBuf {
        let path = self.paths.sessions_dir.join(format!("{name}.jsonl"));
        let mut file = fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        path
    }

    /// Write `cron/jobs.json` with the given job values
    pub fn write_jobs(&self, jobs: Vec<Value>) -> PathBuf {
        let path = self.paths.cron_file.clone();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, json!({"version": 1, "jobs": jobs}).to_string()).unwrap();
        path
    }

    pub fn parser(&self) -> Arc<SessionParser> {
        Arc::new(SessionParser::new(
            &self.paths.sessions_dir,
            TimezoneConfig::utc(),
        ))
    }

    pub fn aggregator(&self, ttl: Duration) -> StatsAggregator {
        StatsAggregator::with_ttl(self.parser(), ttl)
    }
}

/// Assert two costs agree to the rounding precision of the views
pub fn assert_cost_eq(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "cost {actual} != expected {expected}"
    );
}
