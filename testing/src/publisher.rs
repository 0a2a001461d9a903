//! Recording event publisher.

use crate::lock;
use async_trait::async_trait;
use bookshop_core::providers::EventPublisher;
use bookshop_core::{OrderPlaced, Result, ShopError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// [`EventPublisher`] that keeps every published event in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingEventPublisher {
    published: Arc<Mutex<Vec<OrderPlaced>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingEventPublisher {
    /// Create a publisher with nothing recorded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make publishing fail as if the broker were unreachable.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Events published so far, in order.
    #[must_use]
    pub fn published(&self) -> Vec<OrderPlaced> {
        lock(&self.published).clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingEventPublisher {
    async fn publish_order_placed(&self, event: &OrderPlaced) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ShopError::infrastructure("broker unavailable"));
        }
        lock(&self.published).push(event.clone());
        Ok(())
    }
}
