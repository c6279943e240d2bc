// SPDX-License-Identifier: GPL-3.0-only

//! Ordered log of calls made into the virtual hardware

use crate::backends::camera::{CaptureRequest, OutputTarget, RecorderConfig, SessionId};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One call accepted by the virtual camera or recorder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HardwareCall {
    Open(String),
    CloseDevice,
    CreateSession {
        id: SessionId,
        targets: Vec<OutputTarget>,
    },
    SetRepeating {
        id: SessionId,
        request: CaptureRequest,
    },
    Capture {
        id: SessionId,
        request: CaptureRequest,
    },
    StopRepeating(SessionId),
    CloseSession(SessionId),
    RecorderConfigure(RecorderConfig),
    RecorderStart,
    RecorderStop,
    /// A still image buffer was handed back
    StillReleased,
}

/// Shared, cloneable call journal
#[derive(Debug, Clone, Default)]
pub struct Journal {
    calls: Arc<Mutex<Vec<HardwareCall>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<HardwareCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record(&self, call: HardwareCall) {
        self.lock().push(call);
    }

    /// Snapshot of every call so far
    pub fn calls(&self) -> Vec<HardwareCall> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Index of the first call matching `pred`
    pub fn position(&self, pred: impl Fn(&HardwareCall) -> bool) -> Option<usize> {
        self.lock().iter().position(pred)
    }

    /// Index of the last call matching `pred`
    pub fn last_position(&self, pred: impl Fn(&HardwareCall) -> bool) -> Option<usize> {
        self.lock().iter().rposition(pred)
    }

    pub fn count(&self, pred: impl Fn(&HardwareCall) -> bool) -> usize {
        self.lock().iter().filter(|call| pred(call)).count()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_calls() {
        let journal = Journal::new();
        let other = journal.clone();
        journal.record(HardwareCall::Open("0".into()));
        other.record(HardwareCall::CloseDevice);

        assert_eq!(
            journal.calls(),
            vec![HardwareCall::Open("0".into()), HardwareCall::CloseDevice]
        );
        assert_eq!(other.position(|c| *c == HardwareCall::CloseDevice), Some(1));
        assert_eq!(journal.count(|c| matches!(c, HardwareCall::Open(_))), 1);

        other.clear();
        assert!(journal.is_empty());
    }
}
