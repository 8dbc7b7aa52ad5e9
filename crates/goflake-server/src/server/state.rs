//! State shared by the gRPC and HTTP transports.
//!
//! Both hand out IDs from one [`Generator`]. Under [`OverflowPolicy::Block`] a
//! call can spin until the next tick, so it is moved onto the blocking pool
//! instead of stalling a runtime worker.

use crate::server::error::ApiError;
use goflake::{Decomposed, Generator, OverflowPolicy};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct AppState {
    generator: Arc<Generator>,
}

impl AppState {
    pub fn new(generator: Arc<Generator>) -> Self {
        Self { generator }
    }

    pub async fn next_id(&self) -> Result<u64, ApiError> {
        match self.generator.overflow_policy() {
            OverflowPolicy::Reject => Ok(self.generator.next_id()?),
            OverflowPolicy::Block => {
                let generator = Arc::clone(&self.generator);
                Ok(tokio::task::spawn_blocking(move || generator.next_id()).await??)
            }
        }
    }

    pub fn decompose(&self, uuid: u64) -> Decomposed {
        self.generator.decompose(uuid)
    }
}
