//! Repair Scheduler
//!
//! Lossy encodings leave artifacts on screen. After a low quality update the
//! window arms a single deferred refresh; a later update covering at least as
//! many pixels cancels it, otherwise it fires and asks the server for a
//! lossless refresh of the whole window.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, WindowError};
use crate::platform::DrawRegion;
use crate::scheduler::{Scheduler, TimerHandle};
use crate::shared::Geometry;
use crate::window::sequence::SequenceGuard;

/// Encodings that may leave artifacts
pub const DEFAULT_LOSSY: [&str; 3] = ["jpeg", "vpx", "x264"];

/// Encodings known to be pixel exact
pub const DEFAULT_LOSSLESS: [&str; 6] = ["rgb24", "rgb32", "png", "png/P", "png/L", "mmap"];

/// Quality at or above this is treated as already repaired
pub const DEFAULT_HIGH_QUALITY: i64 = 95;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingClass {
    Lossy,
    Lossless,
}

/// Fixed lossy/lossless classification
#[derive(Debug, Clone)]
pub struct EncodingPolicy {
    lossy: HashSet<String>,
    lossless: HashSet<String>,
    high_quality: i64,
}

impl EncodingPolicy {
    pub fn new<S: AsRef<str>>(lossy: &[S], lossless: &[S], high_quality: i64) -> Self {
        Self {
            lossy: lossy.iter().map(|s| s.as_ref().to_string()).collect(),
            lossless: lossless.iter().map(|s| s.as_ref().to_string()).collect(),
            high_quality,
        }
    }

    pub fn classify(&self, encoding: &str) -> Result<EncodingClass> {
        if self.lossy.contains(encoding) {
            Ok(EncodingClass::Lossy)
        } else if self.lossless.contains(encoding) {
            Ok(EncodingClass::Lossless)
        } else {
            Err(WindowError::UnknownEncoding(encoding.to_string()))
        }
    }

    /// Unknown encodings are never lossy
    pub fn is_lossy(&self, encoding: &str) -> bool {
        match self.classify(encoding) {
            Ok(class) => class == EncodingClass::Lossy,
            Err(e) => {
                debug!("{}, treating as lossless", e);
                false
            }
        }
    }

    pub fn is_high_quality(&self, quality: i64) -> bool {
        quality >= self.high_quality
    }

    /// Would an update like this leave artifacts worth repairing?
    pub fn needs_repair(&self, encoding: &str, quality: i64) -> bool {
        self.is_lossy(encoding) && !self.is_high_quality(quality)
    }
}

impl Default for EncodingPolicy {
    fn default() -> Self {
        Self::new(&DEFAULT_LOSSY, &DEFAULT_LOSSLESS, DEFAULT_HIGH_QUALITY)
    }
}

/// What the repair logic needs to know about a finished draw
#[derive(Debug, Clone, Copy)]
pub struct DrawReport<'a> {
    pub sequence: u64,
    pub geometry: Geometry,
    pub encoding: &'a str,
    pub quality: i64,
    pub success: bool,
}

impl<'a> DrawReport<'a> {
    pub fn new(region: &'a DrawRegion, success: bool) -> Self {
        Self {
            sequence: region.sequence,
            geometry: region.geometry,
            encoding: &region.encoding,
            quality: region.options.quality(),
            success,
        }
    }

    pub fn pixels(&self) -> u64 {
        self.geometry.area()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RepairState {
    Idle,
    Armed(TimerHandle),
}

/// Per-window repair timer state machine
#[derive(Debug)]
pub struct RepairScheduler {
    wid: u32,
    delay: Duration,
    policy: Arc<EncodingPolicy>,
    guard: SequenceGuard,
    state: RepairState,
}

impl RepairScheduler {
    /// A zero `delay` disables repairs
    pub fn new(wid: u32, delay: Duration, policy: Arc<EncodingPolicy>) -> Self {
        Self {
            wid,
            delay,
            policy,
            guard: SequenceGuard::new(),
            state: RepairState::Idle,
        }
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, RepairState::Armed(_))
    }

    pub fn guard(&self) -> &SequenceGuard {
        &self.guard
    }

    /// Run after every draw completion, on the scheduling context
    pub fn on_draw_complete(&mut self, report: &DrawReport<'_>, scheduler: &mut dyn Scheduler) {
        // a failed paint is no evidence of lossy pixels on screen
        if !report.success {
            return;
        }

        let pixels = report.pixels();

        if let RepairState::Armed(handle) = self.state {
            if self.guard.satisfies(pixels) {
                debug!(
                    "Window {}: update {} ({} pixels) supersedes pending repair",
                    self.wid, report.sequence, pixels
                );
                scheduler.cancel(handle);
                self.state = RepairState::Idle;
                self.guard.reset();
            }
        }

        if self.is_armed() || self.delay.is_zero() {
            return;
        }
        if !self.policy.needs_repair(report.encoding, report.quality) {
            return;
        }
        if self.guard.should_suppress(report.sequence) {
            debug!(
                "Window {}: update {} is our own refresh, not re-arming",
                self.wid, report.sequence
            );
            return;
        }

        let handle = scheduler.schedule_after(self.delay, self.wid);
        self.state = RepairState::Armed(handle);
        self.guard.arm(report.sequence, pixels);
        debug!(
            "Window {}: repair armed after {} update {} (quality {}), {:?}",
            self.wid, report.encoding, report.sequence, report.quality, self.delay
        );
    }

    /// Timer fired. Returns true when a refresh should be requested.
    pub fn on_timer(&mut self, handle: TimerHandle) -> bool {
        match self.state {
            RepairState::Armed(armed) if armed == handle => {
                self.state = RepairState::Idle;
                self.guard.retire();
                true
            }
            _ => {
                debug!("Window {}: ignoring stale repair timer {:?}", self.wid, handle);
                false
            }
        }
    }

    /// Drop any pending repair (window going away)
    pub fn cancel(&mut self, scheduler: &mut dyn Scheduler) {
        if let RepairState::Armed(handle) = self.state {
            scheduler.cancel(handle);
            self.state = RepairState::Idle;
            self.guard.reset();
        }
    }
}
