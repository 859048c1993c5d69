//! Inbound message parsing and rendering.
//!
//! Payloads are parsed into [`serde_json::Value`] without any schema. In
//! [`RenderMode::Raw`] the log shows the compact JSON re-encoding; in
//! [`RenderMode::Summary`] queue watch events get a one-line description.

use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;

use super::command::WATCH;
use crate::error::ConsoleError;

/// How inbound messages are turned into log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Compact JSON re-encoding of the message.
    #[default]
    Raw,
    /// Human-readable line for watch events, raw for everything else.
    Summary,
}

impl FromStr for RenderMode {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "summary" => Ok(Self::Summary),
            other => Err(ConsoleError::Config(format!(
                "invalid render mode: {other} (expected raw or summary)"
            ))),
        }
    }
}

/// Parses an inbound text frame.
///
/// # Errors
///
/// Returns [`ConsoleError::Parse`] when `payload` is not valid JSON.
pub fn parse_message(payload: &str) -> Result<Value, ConsoleError> {
    serde_json::from_str(payload).map_err(ConsoleError::Parse)
}

/// Renders a parsed message as a log line (without the trailing `<br/>`).
#[must_use]
pub fn render_message(message: &Value, mode: RenderMode) -> String {
    match mode {
        RenderMode::Raw => message.to_string(),
        RenderMode::Summary => summarize_watch_event(message)
            .map_or_else(|| message.to_string(), |line| htmlescape::encode_minimal(&line)),
    }
}

/// Describes a watch event, or `None` if `message` is not one.
fn summarize_watch_event(message: &Value) -> Option<String> {
    if message.get("command").and_then(Value::as_str) != Some(WATCH) {
        return None;
    }
    let event = message.get("event").and_then(Value::as_str)?;

    let mut line = format!("event: {event}");

    let Some(job) = message.get("job").filter(|j| j.is_object()) else {
        return Some(line);
    };

    line.push_str(&format!(
        " Job {} (app={}) has {event} at ",
        field(job, "id"),
        field(job, "appid")
    ));
    match event {
        "started" => {
            line.push_str(&format!("{} cmd={}", field(job, "started"), field(job, "cmd")));
        }
        "scheduled" => {
            line.push_str(&format!(
                "{} cmd={}",
                field(job, "scheduled"),
                field(job, "cmd")
            ));
        }
        "finished" => {
            line.push_str(&format!(
                "{} result={} url={}",
                field(job, "finished"),
                field(job, "result"),
                field(job, "url")
            ));
        }
        _ => line.push_str("unknown event(error)"),
    }
    Some(line)
}

/// Plain-text form of a job field; strings lose their quotes, absent
/// fields read `null`.
fn field(job: &Value, key: &str) -> String {
    match job.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "null".to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_accepts_any_json_value() {
        for payload in [r#"{"status":"ok"}"#, "[1,2,3]", "42", "\"text\"", "null"] {
            assert!(parse_message(payload).is_ok(), "rejected {payload}");
        }
    }

    #[test]
    fn parse_rejects_malformed_payload() {
        let Err(err) = parse_message("{\"status\":") else {
            panic!("malformed payload accepted");
        };
        assert!(matches!(err, ConsoleError::Parse(_)));
    }

    #[test]
    fn raw_mode_reencodes_compactly() {
        let Ok(value) = parse_message("{ \"status\" :  \"ok\" }") else {
            panic!("parse failed");
        };
        assert_eq!(render_message(&value, RenderMode::Raw), r#"{"status":"ok"}"#);
    }

    #[test]
    fn raw_mode_keeps_member_order() {
        let payload = r#"{"status":"ok","command":"watch","event":"start","job":{"cmd":"ls","appid":"a","id":2}}"#;
        let Ok(value) = parse_message(payload) else {
            panic!("parse failed");
        };
        assert_eq!(render_message(&value, RenderMode::Raw), payload);
    }

    #[test]
    fn summary_of_start_event_without_job() {
        let msg = json!({"command": "watch", "status": "Start watching", "event": "start", "job": null});
        assert_eq!(render_message(&msg, RenderMode::Summary), "event: start");
    }

    #[test]
    fn summary_of_scheduled_job() {
        let msg = json!({
            "command": "watch",
            "status": "ok",
            "event": "scheduled",
            "job": {"id": 3, "appid": "batch", "cmd": "ls -l", "scheduled": "2016-09-01T00:00:00Z"}
        });
        assert_eq!(
            render_message(&msg, RenderMode::Summary),
            "event: scheduled Job 3 (app=batch) has scheduled at 2016-09-01T00:00:00Z cmd=ls -l"
        );
    }

    #[test]
    fn summary_of_finished_job() {
        let msg = json!({
            "command": "watch",
            "event": "finished",
            "job": {"id": 7, "appid": "a", "finished": "t1", "result": 0, "url": "http://h/7"}
        });
        assert_eq!(
            render_message(&msg, RenderMode::Summary),
            "event: finished Job 7 (app=a) has finished at t1 result=0 url=http://h/7"
        );
    }

    #[test]
    fn summary_of_unknown_event_marks_error() {
        let msg = json!({"command": "watch", "event": "killed", "job": {"id": 1, "appid": "a"}});
        assert_eq!(
            render_message(&msg, RenderMode::Summary),
            "event: killed Job 1 (app=a) has killed at unknown event(error)"
        );
    }

    #[test]
    fn summary_escapes_html() {
        let msg = json!({
            "command": "watch",
            "event": "started",
            "job": {"id": 1, "appid": "a", "started": "t", "cmd": "echo <b> && true"}
        });
        let line = render_message(&msg, RenderMode::Summary);
        assert!(line.ends_with("cmd=echo &lt;b&gt; &amp;&amp; true"), "{line}");
    }

    #[test]
    fn summary_falls_back_to_raw() {
        let msg = json!({"status": "ok"});
        assert_eq!(render_message(&msg, RenderMode::Summary), r#"{"status":"ok"}"#);
    }

    #[test]
    fn render_mode_parses_case_insensitively() {
        assert_eq!("RAW".parse::<RenderMode>().ok(), Some(RenderMode::Raw));
        assert_eq!(" summary ".parse::<RenderMode>().ok(), Some(RenderMode::Summary));
        assert!("fancy".parse::<RenderMode>().is_err());
    }
}
