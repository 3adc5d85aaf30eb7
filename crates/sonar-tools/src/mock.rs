//! Mock Chat Backend
//!
//! For testing and demo purposes. Returns a canned answer (or error) and
//! records every request it receives.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use sonar_core::{ChatCompletion, ChatConfiguration, Message, Result, SonarError};

/// A request seen by [`MockChat`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
    pub messages: Vec<Message>,
    pub config: ChatConfiguration,
}

enum Reply {
    Answer(String),
    Status(u16, String),
}

/// Chat backend with a fixed reply
pub struct MockChat {
    reply: Reply,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockChat {
    /// Always answer with `answer`
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            reply: Reply::Answer(answer.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always fail with an upstream status error
    pub fn failing(status: u16, body: impl Into<String>) -> Self {
        Self {
            reply: Reply::Status(status, body.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.recorded().clone()
    }

    // A panicking test thread must not hide the requests recorded before it
    fn recorded(&self) -> MutexGuard<'_, Vec<RecordedRequest>> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ChatCompletion for MockChat {
    async fn complete(&self, messages: &[Message], config: &ChatConfiguration) -> Result<String> {
        self.recorded().push(RecordedRequest {
            messages: messages.to_vec(),
            config: config.clone(),
        });

        match &self.reply {
            Reply::Answer(answer) => Ok(answer.clone()),
            Reply::Status(status, body) => Err(SonarError::UpstreamStatus {
                status: *status,
                status_text: String::new(),
                body: body.clone(),
            }),
        }
    }
}
