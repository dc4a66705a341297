//! Session lifecycle state and concurrency guards.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use crate::engine::EngineHandle;
use crate::SessionError;

/// Lifecycle: `Uninitialized -> Ready -> Released`. No way back.
pub(super) enum SessionState {
    Uninitialized,
    Ready(Box<dyn EngineHandle>),
    Released,
}

impl SessionState {
    pub(super) fn status(&self) -> SessionStatus {
        match self {
            Self::Uninitialized => SessionStatus::Uninitialized,
            Self::Ready(_) => SessionStatus::Ready,
            Self::Released => SessionStatus::Released,
        }
    }

    pub(super) fn handle(&self) -> Result<&dyn EngineHandle, SessionError> {
        match self {
            Self::Ready(handle) => Ok(handle.as_ref()),
            _ => Err(SessionError::NotInitialized),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Uninitialized,
    Ready,
    Released,
}

/// Clears the `busy` flag on drop, so early returns and cancelled futures
/// never leave the session stuck.
pub(super) struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    pub(super) fn acquire(flag: &'a AtomicBool) -> Result<Self, SessionError> {
        if flag
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(SessionError::Busy);
        }
        Ok(Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
