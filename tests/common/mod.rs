#![allow(dead_code)]

pub use agentrun_test_utils::builders;
pub use agentrun_test_utils::{init_tracing, with_timeout};

use agentrun::event::OrchestrationEvent;

pub fn status(text: &str) -> OrchestrationEvent {
    OrchestrationEvent::Status(text.to_string())
}

pub fn log(text: &str) -> OrchestrationEvent {
    OrchestrationEvent::Log(text.to_string())
}

/// Minimal incremental reader for the event-stream wire format, the way a
/// browser client consumes it: frames end at a blank line, `data:` lines are
/// joined with `\n`.
pub fn parse_frames(body: &str) -> Vec<(String, String)> {
    body.split("\n\n")
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| {
            let mut event = "message".to_string();
            let mut data = Vec::new();
            for line in raw.lines() {
                if let Some(rest) = line.strip_prefix("event:") {
                    event = rest.trim().to_string();
                } else if let Some(rest) = line.strip_prefix("data:") {
                    data.push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
                }
            }
            (event, data.join("\n"))
        })
        .collect()
}
