//! Replays a fixed queue of responses, one per query.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::{AdapterError, ModelAdapter, ModelResponse};

/// One queued reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scripted {
    Reply { text: String, latency_ms: u64 },
    Fail(AdapterError),
}

impl Scripted {
    pub fn reply(text: impl Into<String>) -> Self {
        Scripted::Reply {
            text: text.into(),
            latency_ms: 0,
        }
    }

    pub fn slow(text: impl Into<String>, latency_ms: u64) -> Self {
        Scripted::Reply {
            text: text.into(),
            latency_ms,
        }
    }
}

/// Answers queries from a queue and errors once it runs dry.
///
/// ```
/// use std::time::Duration;
/// use arena_models::ModelAdapter;
/// use arena_models::scripted::{Scripted, ScriptedAdapter};
///
/// let model = ScriptedAdapter::new("replay", vec![Scripted::reply(r#"{"action":"call"}"#)]);
/// let first = model.query("prompt", 64, Duration::from_secs(1)).unwrap();
/// assert_eq!(first.text, r#"{"action":"call"}"#);
/// assert!(model.query("prompt", 64, Duration::from_secs(1)).is_err());
/// ```
#[derive(Debug)]
pub struct ScriptedAdapter {
    id: String,
    queue: Mutex<VecDeque<Scripted>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedAdapter {
    pub fn new(id: impl Into<String>, replies: Vec<Scripted>) -> Self {
        Self {
            id: id.into(),
            queue: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Load replies from a text file, one response per non-blank line.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AdapterError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| AdapterError::Script {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let replies = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(Scripted::reply)
            .collect();
        Ok(Self::new("scripted", replies))
    }

    pub fn remaining(&self) -> usize {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Every prompt received so far, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ModelAdapter for ScriptedAdapter {
    fn model_id(&self) -> &str {
        &self.id
    }

    fn query(
        &self,
        prompt: &str,
        _max_tokens: u32,
        _timeout: Duration,
    ) -> Result<ModelResponse, AdapterError> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.to_string());
        let next = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match next {
            Some(Scripted::Reply { text, latency_ms }) => Ok(ModelResponse::new(prompt, text, latency_ms)),
            Some(Scripted::Fail(e)) => Err(e),
            None => Err(AdapterError::Exhausted(self.id.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn replays_in_order_and_records_prompts() {
        let model = ScriptedAdapter::new(
            "m",
            vec![
                Scripted::slow("one", 250),
                Scripted::Fail(AdapterError::Timeout(30_000)),
                Scripted::reply("two"),
            ],
        );
        let t = Duration::from_secs(1);
        let first = model.query("p1", 8, t).unwrap();
        assert_eq!((first.text.as_str(), first.latency_ms), ("one", 250));
        assert_eq!(model.query("p2", 8, t), Err(AdapterError::Timeout(30_000)));
        assert_eq!(model.query("p3", 8, t).unwrap().text, "two");
        assert_eq!(model.remaining(), 0);
        assert_eq!(model.prompts(), vec!["p1", "p2", "p3"]);
        assert_eq!(model.query("p4", 8, t), Err(AdapterError::Exhausted("m".into())));
    }

    #[test]
    fn loads_non_blank_lines_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"action\": \"call\"}}").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "{{\"action\": \"fold\"}}").unwrap();
        let model = ScriptedAdapter::from_file(file.path()).unwrap();
        assert_eq!(model.model_id(), "scripted");
        assert_eq!(model.remaining(), 2);
    }
}
