use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use hearth_core::CalculatorState;

use crate::llm::ChatMessage;

/// One conversation: the calculator scratchpad plus the message history the
/// LLM sees on the next turn.
#[derive(Clone, Debug, Default)]
pub struct Session {
    pub state: CalculatorState,
    pub history: Vec<ChatMessage>,
}

/// Hands out one lock per session so concurrent requests within a session
/// serialize their state writes while different sessions proceed in
/// parallel. The outer map lock is held only for lookup.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<Session>>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&self, session_id: &str) -> Arc<tokio::sync::Mutex<Session>> {
        let mut sessions =
            self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(Session::default())))
            .clone()
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<tokio::sync::Mutex<Session>>> {
        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.get(session_id).cloned()
    }

    pub fn len(&self) -> usize {
        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
