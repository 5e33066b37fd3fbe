//! Domain event system: decoupled observation of orchestration sessions.
//!
//! The orchestrator publishes events as sessions progress. Subscribers (the
//! CLI in verbose mode, tests, an external persistence layer) can react
//! without the loop knowing about them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A session began with the given entry agent
    SessionStarted {
        session_id: String,
        entry_agent: String,
        max_steps: u32,
        timestamp: DateTime<Utc>,
    },

    /// An agent produced a decision
    StepCompleted {
        session_id: String,
        step: u32,
        agent: String,
        action: String,
        timestamp: DateTime<Utc>,
    },

    /// A tool was executed
    ToolExecuted {
        session_id: String,
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// The loop rerouted to the entry agent after model non-compliance
    Recovered {
        session_id: String,
        step: u32,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// A session returned an answer (possibly the budget sentinel)
    SessionFinished {
        session_id: String,
        steps: u32,
        outcome: String,
        timestamp: DateTime<Utc>,
    },

    /// A session aborted
    ErrorOccurred {
        context: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
