//! In-process audio-focus arbitration.
//!
//! Holders form a stack. The top holder owns output; a newcomer displaces it
//! either permanently (`Gain`) or transiently. When the top holder abandons,
//! a transiently displaced holder below it gets focus back.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::controller::{FocusArbiter, FocusChange, FocusRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusKind {
    Gain,
    GainTransient,
    GainTransientMayDuck,
}

struct Holder {
    id: u64,
    changes: UnboundedSender<FocusChange>,
}

#[derive(Default)]
struct FocusStack {
    holders: Vec<Holder>,
    next_id: u64,
    call_active: bool,
}

#[derive(Clone, Default)]
pub struct FocusManager {
    inner: Arc<Mutex<FocusStack>>,
}

impl FocusManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// New participant; focus changes for it arrive on the returned receiver
    pub fn register(&self) -> (FocusHandle, UnboundedReceiver<FocusChange>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut stack = self.lock();
        stack.next_id += 1;
        let handle = FocusHandle {
            id: stack.next_id,
            changes: tx,
            manager: self.clone(),
        };
        (handle, rx)
    }

    /// While a call is active every request is denied
    pub fn set_call_active(&self, active: bool) {
        self.lock().call_active = active;
    }

    /// Id of the current focus owner
    pub fn owner(&self) -> Option<u64> {
        self.lock().holders.last().map(|h| h.id)
    }

    fn lock(&self) -> MutexGuard<'_, FocusStack> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct FocusHandle {
    id: u64,
    changes: UnboundedSender<FocusChange>,
    manager: FocusManager,
}

impl FocusHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn request_kind(&self, kind: FocusKind) -> FocusRequest {
        let mut stack = self.manager.lock();
        if stack.call_active {
            tracing::debug!(holder = self.id, "Focus denied, call in progress");
            return FocusRequest::Denied;
        }
        if stack.holders.last().is_some_and(|h| h.id == self.id) {
            return FocusRequest::Granted;
        }

        stack.holders.retain(|h| h.id != self.id);
        if let Some(previous) = stack.holders.last() {
            let change = match kind {
                FocusKind::Gain => FocusChange::Lost,
                FocusKind::GainTransient => FocusChange::LostTransient,
                FocusKind::GainTransientMayDuck => FocusChange::LostTransientCanDuck,
            };
            tracing::debug!(from = previous.id, to = self.id, ?change, "Focus displaced");
            let _ = previous.changes.send(change);
            if kind == FocusKind::Gain {
                stack.holders.pop();
            }
        }

        stack.holders.push(Holder {
            id: self.id,
            changes: self.changes.clone(),
        });
        FocusRequest::Granted
    }

    pub fn release(&self) {
        let mut stack = self.manager.lock();
        let was_owner = stack.holders.last().is_some_and(|h| h.id == self.id);
        stack.holders.retain(|h| h.id != self.id);

        if was_owner {
            if let Some(next) = stack.holders.last() {
                tracing::debug!(holder = next.id, "Focus returned");
                let _ = next.changes.send(FocusChange::Gained);
            }
        }
    }
}

impl FocusArbiter for FocusHandle {
    fn request(&mut self) -> FocusRequest {
        self.request_kind(FocusKind::Gain)
    }

    fn abandon(&mut self) {
        self.release();
    }
}

impl Drop for FocusHandle {
    fn drop(&mut self) {
        self.release();
    }
}
