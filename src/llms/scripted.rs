//! Scripted chat model for tests and demos.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::base_model::{ChatModel, ModelRequest, ModelResponse};
use crate::utilities::errors::BoxError;

/// A model that replays a fixed sequence of responses.
///
/// Each call pops the next scripted response and records the names of
/// the tools it was offered, so tests can assert on the exposure the
/// middleware produced at every step. Calling past the end of the
/// script is an error; that error propagates like any provider failure.
#[derive(Debug)]
pub struct ScriptedModel {
    model: String,
    script: Mutex<VecDeque<ModelResponse>>,
    offered: Mutex<Vec<Vec<String>>>,
}

impl ScriptedModel {
    /// Create a scripted model that will answer with `responses` in
    /// order.
    pub fn new(model: impl Into<String>, responses: Vec<ModelResponse>) -> Self {
        Self {
            model: model.into(),
            script: Mutex::new(responses.into()),
            offered: Mutex::new(Vec::new()),
        }
    }

    /// Tool names offered at each call so far, in call order.
    pub fn offered_tools(&self) -> Vec<Vec<String>> {
        self.offered.lock().clone()
    }

    /// Number of scripted responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn model(&self) -> &str {
        &self.model
    }

    fn call(&self, request: &ModelRequest) -> Result<ModelResponse, BoxError> {
        self.offered.lock().push(request.tool_names());
        self.script
            .lock()
            .pop_front()
            .ok_or_else(|| BoxError::from("scripted model has no responses left"))
    }
}
