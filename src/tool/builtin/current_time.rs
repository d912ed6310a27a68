use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::schema::SchemaBuilder;
use crate::tool::{Tool, ToolError};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Reports the current wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentTimeTool;

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "get_current_time"
    }

    fn description(&self) -> &str {
        "Get the current time in a timezone such as Asia/Shanghai, America/New_York, UTC or +08:00"
    }

    fn parameters_schema(&self) -> Value {
        SchemaBuilder::new()
            .string(
                "timezone",
                "Timezone to report in (optional, defaults to the local timezone)",
                false,
            )
            .build()
    }

    async fn execute(&self, args: Map<String, Value>) -> Result<String, ToolError> {
        let requested = args
            .get("timezone")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|tz| !tz.is_empty());

        let now = Utc::now();
        let reply = match requested.map(Zone::parse) {
            Some(Some(zone)) => zone.describe(now),
            Some(None) => {
                warn!(timezone = ?requested, "Unknown timezone, using local time");
                Zone::Local.describe(now)
            }
            None => Zone::Local.describe(now),
        };

        Ok(reply.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    Utc,
    Local,
    Fixed(FixedOffset),
    Named(Tz),
}

impl Zone {
    fn parse(text: &str) -> Option<Zone> {
        if text.eq_ignore_ascii_case("utc") || text == "Z" {
            return Some(Zone::Utc);
        }
        if text.eq_ignore_ascii_case("local") {
            return Some(Zone::Local);
        }

        let offset = text
            .strip_prefix("UTC")
            .or_else(|| text.strip_prefix("GMT"))
            .unwrap_or(text);
        if let Some(offset) = parse_offset(offset) {
            return Some(Zone::Fixed(offset));
        }

        text.parse::<Tz>().ok().map(Zone::Named)
    }

    fn describe(&self, now: DateTime<Utc>) -> Value {
        match self {
            Zone::Utc => render("UTC".to_string(), &now),
            Zone::Local => {
                let local = now.with_timezone(&Local);
                render(local.offset().to_string(), &local)
            }
            Zone::Fixed(offset) => {
                let fixed = offset.from_utc_datetime(&now.naive_utc());
                render(offset.to_string(), &fixed)
            }
            Zone::Named(tz) => render(tz.name().to_string(), &now.with_timezone(tz)),
        }
    }
}

fn render<Tz: TimeZone>(label: String, time: &DateTime<Tz>) -> Value
where
    Tz::Offset: std::fmt::Display,
{
    json!({
        "timezone": label,
        "time": time.format(TIME_FORMAT).to_string(),
        "timestamp": time.timestamp(),
    })
}

/// Parses `+HH:MM`, `-HH:MM` or `+HH`.
fn parse_offset(text: &str) -> Option<FixedOffset> {
    let (sign, rest) = match text.as_bytes().first()? {
        b'+' => (1, &text[1..]),
        b'-' => (-1, &text[1..]),
        _ => return None,
    };

    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?),
        None => (rest.parse::<i32>().ok()?, 0),
    };
    if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    async fn run(args: Value) -> Value {
        let output = CurrentTimeTool
            .execute(args.as_object().cloned().unwrap())
            .await
            .unwrap();
        serde_json::from_str(&output).unwrap()
    }

    #[test]
    fn test_parse_zone() {
        assert_eq!(Zone::parse("UTC"), Some(Zone::Utc));
        assert_eq!(Zone::parse("local"), Some(Zone::Local));
        assert_eq!(
            Zone::parse("+08:00"),
            Some(Zone::Fixed(FixedOffset::east_opt(8 * 3600).unwrap()))
        );
        assert_eq!(
            Zone::parse("UTC-05:30"),
            Some(Zone::Fixed(FixedOffset::west_opt(5 * 3600 + 30 * 60).unwrap()))
        );
        assert_eq!(
            Zone::parse("America/New_York"),
            Some(Zone::Named(chrono_tz::America::New_York))
        );
        assert_eq!(Zone::parse("Mars/Olympus"), None);
        assert_eq!(Zone::parse("+25:00"), None);
    }

    #[tokio::test]
    async fn test_utc_reply() {
        let reply = run(json!({"timezone": "UTC"})).await;

        assert_eq!(reply["timezone"], "UTC");
        let time = reply["time"].as_str().unwrap();
        assert!(NaiveDateTime::parse_from_str(time, TIME_FORMAT).is_ok());
        assert!(reply["timestamp"].as_i64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_fixed_offset_reply() {
        let reply = run(json!({"timezone": "+08:00"})).await;
        assert_eq!(reply["timezone"], "+08:00");
    }

    #[tokio::test]
    async fn test_named_zone_reply() {
        let reply = run(json!({"timezone": "Asia/Shanghai"})).await;

        assert_eq!(reply["timezone"], "Asia/Shanghai");
        let shown = NaiveDateTime::parse_from_str(reply["time"].as_str().unwrap(), TIME_FORMAT).unwrap();
        let utc = DateTime::from_timestamp(reply["timestamp"].as_i64().unwrap(), 0).unwrap();
        assert_eq!(shown - utc.naive_utc(), chrono::Duration::hours(8));
    }

    #[tokio::test]
    async fn test_unknown_zone_falls_back() {
        let reply = run(json!({"timezone": "Nowhere/Special"})).await;
        assert!(reply.get("error").is_none());
        assert!(reply["time"].is_string());
    }

    #[tokio::test]
    async fn test_no_arguments() {
        let reply = run(json!({})).await;
        assert!(reply["time"].is_string());
    }
}
