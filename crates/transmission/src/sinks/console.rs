//! Console transmission - one JSON line per event on stdout
//!
//! Debugging aid: every event is rendered the way it would appear inside
//! a batch body, tagged with its dataset. Sampling is bypassed, nothing
//! is buffered, and no outcomes are produced. Not meant for volume.

use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::SecondsFormat;
use serde_json::{Map, Value};
use tracing::warn;

use crate::event::ValidatedEvent;
use crate::transmission::Transmission;

/// Transmission that prints events instead of sending them
#[derive(Debug, Default)]
pub struct ConsoleTransmission {
    lines_written: AtomicU64,
}

impl ConsoleTransmission {
    /// Create a console transmission
    pub fn new() -> Self {
        Self::default()
    }

    /// How many event lines were written
    pub fn lines_written(&self) -> u64 {
        self.lines_written.load(Ordering::Relaxed)
    }

    fn write_event(&self, event: &ValidatedEvent) {
        let line = match render(event) {
            Ok(line) => line,
            Err(e) => {
                warn!(dataset = %event.dataset, error = %e, "failed to render event");
                return;
            }
        };

        let mut stdout = std::io::stdout().lock();
        if writeln!(stdout, "{line}").is_ok() {
            self.lines_written.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Render an event as a single JSON line
fn render(event: &ValidatedEvent) -> Result<String, serde_json::Error> {
    let mut line = Map::new();
    line.insert("dataset".into(), Value::String(event.dataset.clone()));
    line.insert(
        "time".into(),
        Value::String(event.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
    );
    if event.sample_rate > 1 {
        line.insert("samplerate".into(), event.sample_rate.into());
    }
    if let Some(data) = event.post_data.to_value()? {
        line.insert("data".into(), data);
    }
    serde_json::to_string(&Value::Object(line))
}

#[async_trait]
impl Transmission for ConsoleTransmission {
    fn send(&self, event: ValidatedEvent) {
        // Sampling is deliberately bypassed: what you submit is what you see
        self.write_event(&event);
    }

    fn send_presampled(&self, event: ValidatedEvent) {
        self.write_event(&event);
    }

    async fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Payload;
    use serde_json::json;

    fn event(sample_rate: u32) -> ValidatedEvent {
        let mut map = Map::new();
        map.insert("status".into(), json!(200));

        ValidatedEvent {
            timestamp: "2026-08-02T10:15:00Z".parse().unwrap(),
            api_host: "http://localhost:9999".into(),
            write_key: "key".into(),
            dataset: "d".into(),
            sample_rate,
            post_data: Payload::fields(map),
            metadata: Value::Null,
        }
    }

    #[test]
    fn test_render_includes_dataset_and_data() {
        let line = render(&event(1)).unwrap();
        let parsed: Value = serde_json::from_str(&line).unwrap();

        assert_eq!(parsed["dataset"], "d");
        assert_eq!(parsed["time"], "2026-08-02T10:15:00Z");
        assert_eq!(parsed["data"]["status"], 200);
        assert!(parsed.get("samplerate").is_none());
    }

    #[test]
    fn test_render_includes_samplerate_above_one() {
        let line = render(&event(8)).unwrap();
        let parsed: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["samplerate"], 8);
    }

    #[tokio::test]
    async fn test_counts_written_lines() {
        let console = ConsoleTransmission::new();
        console.send(event(1));
        console.send_presampled(event(1));
        console.flush().await;

        assert_eq!(console.lines_written(), 2);
    }
}
