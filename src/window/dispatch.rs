//! Update Dispatcher
//!
//! Owns the window's backing surface and serializes draws against it. A draw
//! moves the backing into a `DrawJob`, which can run on any thread; the
//! resulting `DrawCompletion` hands the backing back on the scheduling
//! context. Draws that arrive in between wait in a queue.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, warn};

use crate::error::{Result, WindowError};
use crate::platform::{Backing, DrawOutcome, DrawRegion};

/// Called on the scheduling context with the draw's success flag
pub type DrawCallback = Box<dyn FnOnce(bool) + Send>;

/// A pixel update plus the callbacks waiting on it
pub struct DrawCommand {
    pub region: DrawRegion,
    pub callbacks: Vec<DrawCallback>,
}

impl DrawCommand {
    pub fn new(region: DrawRegion, callbacks: Vec<DrawCallback>) -> Self {
        Self { region, callbacks }
    }
}

impl std::fmt::Debug for DrawCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawCommand")
            .field("sequence", &self.region.sequence)
            .field("geometry", &self.region.geometry)
            .field("encoding", &self.region.encoding)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

/// Decode work detached from the window
pub struct DrawJob {
    wid: u32,
    command: DrawCommand,
    backing: Box<dyn Backing>,
}

impl DrawJob {
    pub fn wid(&self) -> u32 {
        self.wid
    }

    pub fn sequence(&self) -> u64 {
        self.command.region.sequence
    }

    /// Decode and paint. May block; run it off the scheduling context.
    ///
    /// A decoder panic is reported as a failed draw so the backing still
    /// returns to the window.
    pub fn run(mut self) -> DrawCompletion {
        let region = &self.command.region;
        let backing = &mut self.backing;
        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| backing.draw_region(region))) {
            Ok(outcome) => outcome,
            Err(_) => {
                error!("Window {}: decoder panicked on draw {}", self.wid, region.sequence);
                DrawOutcome::failed()
            }
        };
        DrawCompletion {
            wid: self.wid,
            command: self.command,
            backing: self.backing,
            outcome,
        }
    }
}

impl std::fmt::Debug for DrawJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawJob")
            .field("wid", &self.wid)
            .field("command", &self.command)
            .finish()
    }
}

/// Finished draw travelling back to the scheduling context
pub struct DrawCompletion {
    wid: u32,
    command: DrawCommand,
    backing: Box<dyn Backing>,
    outcome: DrawOutcome,
}

impl DrawCompletion {
    pub fn wid(&self) -> u32 {
        self.wid
    }

    pub fn outcome(&self) -> DrawOutcome {
        self.outcome
    }
}

enum BackingSlot {
    /// Not initialized, or released
    Missing,
    Ready(Box<dyn Backing>),
    /// Lent to a running `DrawJob`
    Applying,
}

/// Per-window draw serialization
pub struct UpdateDispatcher {
    wid: u32,
    slot: BackingSlot,
    queue: VecDeque<DrawCommand>,
    pending_size: Option<(u32, u32)>,
}

impl UpdateDispatcher {
    pub fn new(wid: u32) -> Self {
        Self {
            wid,
            slot: BackingSlot::Missing,
            queue: VecDeque::new(),
            pending_size: None,
        }
    }

    pub fn install(&mut self, backing: Box<dyn Backing>) {
        self.slot = BackingSlot::Ready(backing);
    }

    pub fn has_backing(&self) -> bool {
        !matches!(self.slot, BackingSlot::Missing)
    }

    pub fn is_applying(&self) -> bool {
        matches!(self.slot, BackingSlot::Applying)
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Start the draw now, or queue it behind the one in flight
    pub fn submit(&mut self, command: DrawCommand) -> Result<Option<DrawJob>> {
        match std::mem::replace(&mut self.slot, BackingSlot::Applying) {
            BackingSlot::Missing => {
                self.slot = BackingSlot::Missing;
                Err(WindowError::InvalidState {
                    wid: self.wid,
                    reason: "no backing surface",
                })
            }
            BackingSlot::Applying => {
                debug!(
                    "Window {}: draw {} queued behind in-flight draw",
                    self.wid, command.region.sequence
                );
                self.queue.push_back(command);
                Ok(None)
            }
            BackingSlot::Ready(backing) => Ok(Some(DrawJob {
                wid: self.wid,
                command,
                backing,
            })),
        }
    }

    /// Take the backing back from a finished job
    pub fn finish(&mut self, completion: DrawCompletion) -> (DrawCommand, DrawOutcome) {
        let DrawCompletion {
            command,
            mut backing,
            outcome,
            ..
        } = completion;

        if self.is_applying() {
            if let Some((width, height)) = self.pending_size.take() {
                resize_backing(self.wid, backing.as_mut(), width, height);
            }
            self.slot = BackingSlot::Ready(backing);
        }

        (command, outcome)
    }

    /// Start the next queued draw, if the backing is free
    pub fn next_job(&mut self) -> Option<DrawJob> {
        if !matches!(self.slot, BackingSlot::Ready(_)) {
            return None;
        }
        let command = self.queue.pop_front()?;
        self.submit(command).ok().flatten()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        match &mut self.slot {
            BackingSlot::Ready(backing) => resize_backing(self.wid, backing.as_mut(), width, height),
            BackingSlot::Applying => self.pending_size = Some((width, height)),
            BackingSlot::Missing => {}
        }
    }


    /// Drop the backing and anything still queued
    pub fn release(&mut self) {
        if !self.queue.is_empty() {
            debug!("Window {}: dropping {} queued draws", self.wid, self.queue.len());
        }
        self.queue.clear();
        self.pending_size = None;
        self.slot = BackingSlot::Missing;
    }
}

fn resize_backing(wid: u32, backing: &mut dyn Backing, width: u32, height: u32) {
    if let Err(e) = backing.resize(width, height) {
        warn!(
            "Window {}: keeping old surface, resize to {}x{} failed: {}",
            wid, width, height, e
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeBacking, draw_region};

    fn command(sequence: u64) -> DrawCommand {
        DrawCommand::new(draw_region(sequence, 10, 10, "rgb24", None), Vec::new())
    }

    #[test]
    fn test_missing_backing_is_invalid_state() {
        let mut dispatcher = UpdateDispatcher::new(9);
        let err = dispatcher.submit(command(1)).unwrap_err();
        assert!(matches!(err, WindowError::InvalidState { wid: 9, .. }));
        assert!(!dispatcher.has_backing());

        // still usable afterwards
        dispatcher.install(Box::new(FakeBacking::default()));
        assert!(dispatcher.submit(command(2)).unwrap().is_some());
    }

    #[test]
    fn test_second_draw_waits_for_completion() {
        let mut dispatcher = UpdateDispatcher::new(1);
        dispatcher.install(Box::new(FakeBacking::default()));

        let job = dispatcher.submit(command(1)).unwrap().unwrap();
        assert!(dispatcher.submit(command(2)).unwrap().is_none());
        assert!(dispatcher.submit(command(3)).unwrap().is_none());
        assert_eq!(dispatcher.queued(), 2);
        assert!(dispatcher.next_job().is_none());

        let (done, outcome) = dispatcher.finish(job.run());
        assert_eq!(done.region.sequence, 1);
        assert!(outcome.success);

        let next = dispatcher.next_job().unwrap();
        assert_eq!(next.sequence(), 2);
        assert!(dispatcher.is_applying());
        assert_eq!(dispatcher.queued(), 1);
    }

    #[test]
    fn test_resize_deferred_while_applying() {
        let mut dispatcher = UpdateDispatcher::new(1);
        let backing = FakeBacking::default();
        let sizes = backing.sizes.clone();
        dispatcher.install(Box::new(backing));

        let job = dispatcher.submit(command(1)).unwrap().unwrap();
        dispatcher.resize(640, 480);
        assert!(sizes.lock().unwrap().is_empty());

        dispatcher.finish(job.run());
        assert_eq!(*sizes.lock().unwrap(), vec![(640, 480)]);
    }

    #[test]
    fn test_failed_resize_keeps_surface() {
        let mut dispatcher = UpdateDispatcher::new(1);
        let backing = FakeBacking {
            fail_resize: true,
            ..FakeBacking::default()
        };
        let sizes = backing.sizes.clone();
        dispatcher.install(Box::new(backing));

        dispatcher.resize(u32::MAX, u32::MAX);
        let job = dispatcher.submit(command(1)).unwrap().unwrap();
        dispatcher.resize(u32::MAX, 1);
        let (_, outcome) = dispatcher.finish(job.run());

        assert!(outcome.success);
        assert!(sizes.lock().unwrap().is_empty());
        assert!(dispatcher.submit(command(2)).unwrap().is_some());
    }

    #[test]
    fn test_decoder_panic_is_a_failed_draw() {
        let mut dispatcher = UpdateDispatcher::new(3);
        let backing = FakeBacking {
            panics: true,
            ..FakeBacking::default()
        };
        dispatcher.install(Box::new(backing));

        let job = dispatcher.submit(command(1)).unwrap().unwrap();
        assert!(dispatcher.submit(command(2)).unwrap().is_none());

        let completion = job.run();
        assert_eq!(completion.outcome(), DrawOutcome::failed());
        dispatcher.finish(completion);

        // backing came back, the queued draw can start
        assert_eq!(dispatcher.next_job().unwrap().sequence(), 2);
    }

    #[test]
    fn test_release_drops_returning_backing() {
        let mut dispatcher = UpdateDispatcher::new(1);
        dispatcher.install(Box::new(FakeBacking::default()));

        let job = dispatcher.submit(command(1)).unwrap().unwrap();
        dispatcher.release();
        dispatcher.finish(job.run());

        assert!(!dispatcher.has_backing());
    }
}
