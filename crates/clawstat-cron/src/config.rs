//! On-disk shape of `cron/jobs.json`
//!
//! Jobs are kept as raw values at the top level so a single malformed job
//! cannot take the rest of the list down with it. Inside a job every optional
//! field is decoded leniently: a null or mistyped value clears that field and
//! leaves the rest of the job intact.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawConfig {
    #[serde(default)]
    pub jobs: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawJob {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub schedule: Value,
    #[serde(default, deserialize_with = "lenient")]
    pub state: RawState,
    #[serde(default, deserialize_with = "lenient")]
    pub session_target: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub payload: RawPayload,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawState {
    #[serde(default, deserialize_with = "epoch_ms")]
    pub next_run_at_ms: Option<i64>,
    #[serde(default, deserialize_with = "epoch_ms")]
    pub last_run_at_ms: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub last_status: Option<String>,
    #[serde(default, deserialize_with = "duration_ms")]
    pub last_duration_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawPayload {
    #[serde(default, deserialize_with = "lenient")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<String>,
}

/// Decode `T`, falling back to its default when the value has another shape
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Any JSON number, as `f64`; anything else is absent
fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?
        .as_f64()
        .filter(|n| n.is_finite()))
}

/// Epoch milliseconds; fractions are truncated
fn epoch_ms<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(deserializer)?.map(|ms| ms.trunc() as i64))
}

/// Non-negative duration in milliseconds; fractions are rounded
fn duration_ms<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(deserializer)?
        .filter(|ms| *ms >= 0.0)
        .map(|ms| ms.round() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_minimal_job() {
        let job: RawJob = serde_json::from_str(r#"{"id":"j1"}"#).unwrap();
        assert_eq!(job.id.as_deref(), Some("j1"));
        assert!(job.name.is_none());
        assert!(job.schedule.is_null());
        assert!(job.state.next_run_at_ms.is_none());
        assert!(job.payload.kind.is_none());
    }

    #[test]
    fn test_decode_full_job() {
        let job: RawJob = serde_json::from_str(
            r#"{
                "id": "j2",
                "name": "Briefing",
                "enabled": false,
                "schedule": {"kind": "cron", "expr": "0 7 * * *"},
                "state": {"nextRunAtMs": 10, "lastRunAtMs": 5, "lastStatus": "error", "lastDurationMs": 1200},
                "sessionTarget": "isolated",
                "payload": {"kind": "agentTurn", "message": "Summarize the news"}
            }"#,
        )
        .unwrap();
        assert_eq!(job.enabled, Some(false));
        assert_eq!(job.state.next_run_at_ms, Some(10));
        assert_eq!(job.state.last_duration_ms, Some(1200));
        assert_eq!(job.session_target.as_deref(), Some("isolated"));
        assert_eq!(job.payload.message.as_deref(), Some("Summarize the news"));
    }

    #[test]
    fn test_null_and_mistyped_fields_are_cleared() {
        let job: RawJob = serde_json::from_str(
            r#"{
                "id": null,
                "name": 42,
                "enabled": "yes",
                "schedule": {"kind": "every", "everyMs": 60000},
                "state": {"nextRunAtMs": 1714564800000.7, "lastRunAtMs": "soon", "lastStatus": null, "lastDurationMs": 12.5},
                "payload": {"kind": "systemEvent", "text": ["not", "text"]}
            }"#,
        )
        .unwrap();
        assert!(job.id.is_none());
        assert!(job.name.is_none());
        assert!(job.enabled.is_none());
        assert_eq!(job.state.next_run_at_ms, Some(1_714_564_800_000));
        assert!(job.state.last_run_at_ms.is_none());
        assert!(job.state.last_status.is_none());
        assert_eq!(job.state.last_duration_ms, Some(13));
        assert_eq!(job.payload.kind.as_deref(), Some("systemEvent"));
        assert!(job.payload.text.is_none());
        assert!(job.schedule.is_object());
    }

    #[test]
    fn test_mistyped_state_and_payload_fall_back_to_defaults() {
        let job: RawJob =
            serde_json::from_str(r#"{"id": "j3", "state": null, "payload": "ping"}"#).unwrap();
        assert!(job.state.next_run_at_ms.is_none());
        assert!(job.payload.kind.is_none());

        let job: RawJob =
            serde_json::from_str(r#"{"id": "j4", "state": {"lastDurationMs": -5}}"#).unwrap();
        assert!(job.state.last_duration_ms.is_none());
    }
}
