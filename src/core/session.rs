//! One user's chat session
//!
//! Owns everything that lives for the lifetime of the client process: the
//! protocol history, the user memory, the visible transcript and the daily
//! usage counter. Nothing here is persisted.
//!
//! `send` takes `&mut self`, so exchanges on one session are serialized.

use chrono::{Local, NaiveDate};
use tokio::sync::watch;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::client::SessionConfig;
use crate::config::prompts_builtin;
use crate::conversation::{ChatHistory, Message};
use crate::plugins::memory::UserData;

use super::chat::{Exchange, ExchangeState, Orchestrator};
use super::gateway::Gateway;
use super::usage::DailyUsage;

/// What happened to one user message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input; nothing was sent or counted
    Ignored,
    /// The daily budget is spent; the gateway was not contacted
    LimitReached,
    Replied(String),
    /// The exchange failed; history and memory are unchanged
    Failed(String),
}

pub struct Session<G> {
    id: Uuid,
    orchestrator: Orchestrator<G>,
    history: ChatHistory,
    memory: UserData,
    transcript: Vec<Message>,
    usage: DailyUsage,
}

impl<G: Gateway> Session<G> {
    pub fn new(gateway: G, config: &SessionConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            orchestrator: Orchestrator::new(gateway),
            history: Vec::new(),
            memory: UserData::with_capacity(config.memory_capacity),
            transcript: Vec::new(),
            usage: DailyUsage::new(config.daily_message_limit, Local::now().date_naive()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    fn commit(&mut self, exchange: Exchange) -> String {
        if let Some(function) = &exchange.function_called {
            tracing::info!(session = %self.id, %function, memory = exchange.memory.len(), "Committed exchange");
        }
        self.history = exchange.history;
        self.memory = exchange.memory;
        exchange.reply_text
    }

    /// Reset history and transcript and ask the model for a greeting.
    ///
    /// The bootstrap prompt goes out with an empty history and does not count
    /// against the daily budget. Failure still yields one displayable message.
    pub async fn start(&mut self) -> Message {
        self.history.clear();
        self.transcript.clear();

        let span = tracing::info_span!("session", id = %self.id);
        let result = self
            .orchestrator
            .exchange(prompts_builtin::INITIAL_PROMPT, &[], &self.memory)
            .instrument(span)
            .await;

        let message = match result {
            Ok(exchange) => Message::model(self.commit(exchange)),
            Err(e) => {
                tracing::error!(session = %self.id, error = %e, "Failed to start conversation");
                Message::model(e.to_string())
            }
        };

        self.transcript.push(message.clone());
        message
    }

    /// Send one user message
    pub async fn send(&mut self, text: &str) -> SendOutcome {
        self.send_on(text, Local::now().date_naive()).await
    }

    async fn send_on(&mut self, text: &str, today: NaiveDate) -> SendOutcome {
        if text.trim().is_empty() {
            return SendOutcome::Ignored;
        }
        if self.usage.is_exhausted(today) {
            tracing::info!(session = %self.id, "Daily message limit reached");
            return SendOutcome::LimitReached;
        }

        self.transcript.push(Message::user(text));
        let count = self.usage.record(today);

        let span = tracing::info_span!("session", id = %self.id, count);
        let result = self
            .orchestrator
            .exchange(text, &self.history, &self.memory)
            .instrument(span)
            .await;

        let outcome = match result {
            Ok(exchange) => {
                let reply = self.commit(exchange);
                self.transcript.push(Message::model(reply.clone()));
                SendOutcome::Replied(reply)
            }
            Err(e) => {
                tracing::error!(session = %self.id, error = %e, "Exchange failed");
                let message = e.to_string();
                self.transcript.push(Message::model(message.clone()));
                SendOutcome::Failed(message)
            }
        };

        if count == self.usage.limit() {
            self.transcript
                .push(Message::model(prompts_builtin::LIMIT_REACHED));
        }

        outcome
    }

    /// Remove a remembered fact. Returns whether it existed.
    pub fn forget(&mut self, key: &str) -> bool {
        self.memory.remove(key)
    }

    pub fn memory(&self) -> &UserData {
        &self.memory
    }

    #[cfg(test)]
    pub fn history(&self) -> &[crate::conversation::Content] {
        &self.history
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// `(count, limit)` for today
    pub fn usage(&self) -> (u32, u32) {
        (
            self.usage.count_on(Local::now().date_naive()),
            self.usage.limit(),
        )
    }

    pub fn limit_reached(&self) -> bool {
        self.usage.is_exhausted(Local::now().date_naive())
    }

    pub fn subscribe(&self) -> watch::Receiver<ExchangeState> {
        self.orchestrator.subscribe()
    }
}
