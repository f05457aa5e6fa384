//! Conversation orchestrator with function calling
//!
//! One exchange turns a prompt into one model-authored reply:
//! 1. Appends the user turn and sends the history to the gateway
//! 2. Returns the text directly when the model answered in prose
//! 3. Otherwise runs the first requested memory function locally
//! 4. Sends the call echo plus its result back and returns the final text
//!
//! The orchestrator never mutates the caller's state. It hands back the
//! extended history and a staged copy of the memory; the caller commits
//! both only when the exchange succeeded.

use tokio::sync::watch;

use crate::config::prompts_builtin;
use crate::conversation::{ChatHistory, Content, FunctionResponse, Part};
use crate::plugins::memory::{self, UserData};

use super::gateway::{Gateway, ProxyError};

/// Client-observed progress of a single exchange
///
/// `Idle` only precedes the first exchange. `Done` and `Failed` are rest
/// states: nothing is in flight and the next exchange starts from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    /// No call in flight
    Idle,
    AwaitingFirstResponse,
    /// A function ran locally; the second gateway call is outstanding
    AwaitingFunctionResult,
    /// Reply obtained; idle until the next exchange
    Done,
    /// The exchange failed and nothing was committed; idle as well
    Failed,
}

impl ExchangeState {
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            ExchangeState::AwaitingFirstResponse | ExchangeState::AwaitingFunctionResult
        )
    }
}

/// Errors from an exchange, worded for display
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("{prefix}: {0}", prefix = prompts_builtin::EXCHANGE_FAILED)]
    Gateway(#[from] ProxyError),

    #[error("{prefix}: {hint}", prefix = prompts_builtin::EXCHANGE_FAILED, hint = prompts_builtin::TRY_AGAIN)]
    EmptyReply,
}

/// Result of a successful exchange, ready to be committed
#[derive(Debug, Clone)]
pub struct Exchange {
    pub reply_text: String,
    pub history: ChatHistory,
    /// Memory after any function side effect
    pub memory: UserData,
    /// Name of the function that ran, if any
    pub function_called: Option<String>,
}

pub struct Orchestrator<G> {
    gateway: G,
    state: watch::Sender<ExchangeState>,
}

impl<G: Gateway> Orchestrator<G> {
    pub fn new(gateway: G) -> Self {
        let (state, _) = watch::channel(ExchangeState::Idle);
        Self { gateway, state }
    }

    /// Watch exchange progress, e.g. to drive a typing indicator
    pub fn subscribe(&self) -> watch::Receiver<ExchangeState> {
        self.state.subscribe()
    }

    #[cfg(test)]
    pub fn state(&self) -> ExchangeState {
        *self.state.borrow()
    }

    fn transition(&self, next: ExchangeState) {
        let previous = self.state.send_replace(next);
        tracing::debug!(from = ?previous, to = ?next, "Exchange state");
    }

    /// Run one exchange on top of `history` and `memory`
    pub async fn exchange(
        &self,
        prompt: &str,
        history: &[Content],
        memory: &UserData,
    ) -> Result<Exchange, ExchangeError> {
        self.transition(ExchangeState::AwaitingFirstResponse);
        let result = self.run(prompt, history, memory).await;
        self.transition(match &result {
            Ok(_) => ExchangeState::Done,
            Err(_) => ExchangeState::Failed,
        });
        result
    }

    async fn run(
        &self,
        prompt: &str,
        history: &[Content],
        memory: &UserData,
    ) -> Result<Exchange, ExchangeError> {
        let mut history = history.to_vec();
        history.push(Content::user(prompt));

        let first = self.gateway.send(&history, None).await?;

        let Some(call) = first.first_call().cloned() else {
            let text = first.text.ok_or(ExchangeError::EmptyReply)?;
            history.push(Content::model(text.clone()));
            return Ok(Exchange {
                reply_text: text,
                history,
                memory: memory.clone(),
                function_called: None,
            });
        };

        if let Some(calls) = first.function_calls.as_ref().filter(|c| c.len() > 1) {
            let ignored: Vec<&str> = calls[1..].iter().map(|c| c.name.as_str()).collect();
            tracing::warn!(?ignored, "Only the first function call is executed");
        }

        self.transition(ExchangeState::AwaitingFunctionResult);

        let mut staged = memory.clone();
        let result = memory::dispatch(&call, &mut staged).unwrap_or_else(|e| {
            tracing::warn!(function = %call.name, error = %e, "Function call rejected");
            e.to_string()
        });
        tracing::debug!(function = %call.name, %result, "Function executed");

        let name = call.name.clone();
        history.push(Content::model_call(call));

        let response = vec![Part::FunctionResponse(FunctionResponse::new(&name, result))];
        let second = self.gateway.send(&history, Some(response.as_slice())).await?;
        let text = second.text.ok_or(ExchangeError::EmptyReply)?;

        history.push(Content::function(response));
        history.push(Content::model(text.clone()));

        Ok(Exchange {
            reply_text: text,
            history,
            memory: staged,
            function_called: Some(name),
        })
    }
}
