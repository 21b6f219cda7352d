//! Timer scheduling for the session's single-threaded context.
//!
//! Windows never own timers directly. They ask the session's scheduler for a
//! deferred callback and get a handle back; the fire is delivered to the
//! session loop as an event carrying that handle.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::session::SessionEvent;

/// Identifies one arming of a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Deferred callback registration
pub trait Scheduler {
    /// Arrange for a `TimerFired` for `wid` after `delay`
    fn schedule_after(&mut self, delay: Duration, wid: u32) -> TimerHandle;

    /// Cancel a pending timer. A fire that is already queued still arrives
    /// and must be ignored by the owner.
    fn cancel(&mut self, handle: TimerHandle);

    /// The fire for `handle` has been dispatched
    fn retire(&mut self, _handle: TimerHandle) {}
}

/// Scheduler backed by tokio timers, firing into the session event channel
pub struct TokioScheduler {
    next_id: u64,
    timers: HashMap<TimerHandle, JoinHandle<()>>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl TokioScheduler {
    pub fn new(events: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self {
            next_id: 0,
            timers: HashMap::new(),
            events,
        }
    }

    /// Timers scheduled and not yet retired or cancelled
    pub fn pending(&self) -> usize {
        self.timers.len()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_after(&mut self, delay: Duration, wid: u32) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle::new(self.next_id);
        let events = self.events.clone();

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if events.send(SessionEvent::TimerFired { wid, handle }).is_err() {
                debug!("Session gone before timer {:?} fired", handle);
            }
        });

        self.timers.insert(handle, task);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(task) = self.timers.remove(&handle) {
            task.abort();
        }
    }

    fn retire(&mut self, handle: TimerHandle) {
        self.timers.remove(&handle);
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, task) in self.timers.drain() {
            task.abort();
        }
    }
}
