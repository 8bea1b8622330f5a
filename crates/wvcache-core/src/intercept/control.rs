//! Cancellation for in-flight interceptions.
//!
//! The host registers each intercepted request under its own task id and gets
//! a [`CancelToken`]; when the renderer stops the request, the host calls
//! [`TaskControl::request_cancel`]. The interceptor checks the token before
//! every delivery step and stops delivering once it is set.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Shared stop flag for one intercepted request.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Registry of host task id -> cancel token.
#[derive(Debug, Default)]
pub struct TaskControl {
    tasks: RwLock<HashMap<u64, CancelToken>>,
}

impl TaskControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an intercepted request; returns the token to pass to the interceptor.
    pub fn register(&self, task_id: u64) -> CancelToken {
        let token = CancelToken::new();
        self.tasks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(task_id, token.clone());
        token
    }

    /// Unregister a request (call when it finishes, success or failure).
    pub fn unregister(&self, task_id: u64) {
        self.tasks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&task_id);
    }

    /// Host signalled stop. Returns false if the task is not (or no longer) registered.
    pub fn request_cancel(&self, task_id: u64) -> bool {
        match self
            .tasks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&task_id)
        {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.tasks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
