//! Test doubles shared by the service unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use ads_copilot_llm::{
    LlmError, LlmProvider, LlmRequestOptions, LlmResponse, LlmResult, Message, StopReason,
    UsageStats,
};
use async_trait::async_trait;

enum Scripted {
    Reply(String),
    Fail(LlmError),
    Stall,
}

struct Route {
    marker: String,
    queue: Vec<Scripted>,
}

/// LLM provider that answers by matching a marker substring in the system
/// prompt. Each route replays its scripted responses in order and repeats the
/// last one once the queue runs dry. Unrouted prompts fail.
pub struct ScriptedLlm {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(Vec::new()),
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn reply(self, marker: &str, text: &str) -> Self {
        self.push(marker, Scripted::Reply(text.to_string()))
    }

    pub fn fail(self, marker: &str, err: LlmError) -> Self {
        self.push(marker, Scripted::Fail(err))
    }

    /// Never answer; the caller's timeout fires.
    pub fn stall(self, marker: &str) -> Self {
        self.push(marker, Scripted::Stall)
    }

    pub fn calls(&self, marker: &str) -> usize {
        self.calls.lock().unwrap().get(marker).copied().unwrap_or(0)
    }

    fn push(self, marker: &str, response: Scripted) -> Self {
        {
            let mut routes = self.routes.lock().unwrap();
            match routes.iter_mut().find(|r| r.marker == marker) {
                Some(route) => route.queue.push(response),
                None => routes.push(Route {
                    marker: marker.to_string(),
                    queue: vec![response],
                }),
            }
        }
        self
    }

    fn next_for(&self, system: &str) -> Option<Scripted> {
        let mut routes = self.routes.lock().unwrap();
        let route = routes.iter_mut().find(|r| system.contains(&r.marker))?;
        *self.calls.lock().unwrap().entry(route.marker.clone()).or_default() += 1;

        if route.queue.len() > 1 {
            return Some(route.queue.remove(0));
        }
        route.queue.first().map(|s| match s {
            Scripted::Reply(text) => Scripted::Reply(text.clone()),
            Scripted::Fail(err) => Scripted::Fail(err.clone()),
            Scripted::Stall => Scripted::Stall,
        })
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn send_message(
        &self,
        _messages: Vec<Message>,
        system: Option<String>,
        _request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        let system = system.unwrap_or_default();
        match self.next_for(&system) {
            Some(Scripted::Reply(text)) => Ok(LlmResponse {
                content: Some(text),
                stop_reason: StopReason::EndTurn,
                usage: UsageStats::default(),
                model: "scripted-model".to_string(),
            }),
            Some(Scripted::Fail(err)) => Err(err),
            Some(Scripted::Stall) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(LlmError::Timeout {
                    message: "stalled".to_string(),
                })
            }
            None => Err(LlmError::Other {
                message: "no scripted response for this prompt".to_string(),
            }),
        }
    }
}
