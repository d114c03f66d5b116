//! Server application state shared across handlers

use crate::mediator::ChatMediator;
use std::sync::Arc;

/// Shared state for the server. The mediator is stateless across calls, so
/// concurrent requests share it without locking.
#[derive(Clone)]
pub struct ServerAppState {
    /// Chat turn orchestrator
    pub mediator: Arc<ChatMediator>,

    /// When true, 500 responses include error details
    pub dev_mode: bool,
}

impl ServerAppState {
    pub fn new(mediator: ChatMediator, dev_mode: bool) -> Self {
        Self {
            mediator: Arc::new(mediator),
            dev_mode,
        }
    }
}
