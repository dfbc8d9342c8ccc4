//! Core encoding engine module
//!
//! Hosts the encoding pipeline, the compression retry loop and the
//! preview renderer. Encoder subprocesses across all sessions share one
//! process-wide slot pool so a burst of concurrent sessions cannot
//! oversubscribe the host.

use std::sync::{Arc, OnceLock};

use tokio::sync::Semaphore;

pub mod compress;
pub mod pipeline;
pub mod preview;

static ENCODE_SLOTS: OnceLock<Arc<Semaphore>> = OnceLock::new();

/// Process-wide pool bounding concurrent encoder subprocesses, sized by
/// the host's CPU count.
pub(crate) fn encode_slots() -> &'static Arc<Semaphore> {
    ENCODE_SLOTS.get_or_init(|| Arc::new(Semaphore::new(num_cpus::get().max(1))))
}
