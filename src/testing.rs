//! Test doubles shared by the unit tests.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use area_remote_proto::DrawOptions;

use crate::platform::{Backing, DrawOutcome, DrawRegion, WindowPlatform};
use crate::scheduler::{Scheduler, TimerHandle};
use crate::shared::Geometry;
use crate::window::hints::GeometryHints;
use crate::window::metadata::WindowIcon;
use crate::window::window_type::WindowTypeHint;

pub fn draw_region(sequence: u64, width: u32, height: u32, encoding: &str, quality: Option<i64>) -> DrawRegion {
    DrawRegion {
        geometry: Geometry::new(0, 0, width, height),
        encoding: encoding.to_string(),
        data: Vec::new(),
        rowstride: 0,
        sequence,
        options: DrawOptions {
            quality,
            ..DrawOptions::default()
        },
    }
}

/// Scheduler whose timers only fire when the test says so
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pending: Vec<(TimerHandle, u32, Duration)>,
    scheduled: usize,
    cancelled: usize,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn scheduled(&self) -> usize {
        self.scheduled
    }

    pub fn cancelled(&self) -> usize {
        self.cancelled
    }

    pub fn last_delay(&self) -> Option<Duration> {
        self.pending.last().map(|(_, _, delay)| *delay)
    }

    /// Pop the oldest pending timer as if it had fired
    pub fn fire_next(&mut self) -> Option<(TimerHandle, u32)> {
        if self.pending.is_empty() {
            return None;
        }
        let (handle, wid, _) = self.pending.remove(0);
        Some((handle, wid))
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_after(&mut self, delay: Duration, wid: u32) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle::new(self.next_id);
        self.pending.push((handle, wid, delay));
        self.scheduled += 1;
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.cancelled += 1;
        self.pending.retain(|(h, _, _)| *h != handle);
    }
}

/// Backing that paints nothing and reports a fixed outcome
#[derive(Debug, Clone)]
pub struct FakeBacking {
    pub outcome: DrawOutcome,
    /// Panic inside `draw_region`, like a crashing decoder
    pub panics: bool,
    pub fail_resize: bool,
    pub sizes: Arc<Mutex<Vec<(u32, u32)>>>,
    pub draws: Arc<Mutex<Vec<u64>>>,
}

impl Default for FakeBacking {
    fn default() -> Self {
        Self {
            outcome: DrawOutcome::painted(false),
            panics: false,
            fail_resize: false,
            sizes: Arc::default(),
            draws: Arc::default(),
        }
    }
}

impl Backing for FakeBacking {
    fn draw_region(&mut self, region: &DrawRegion) -> DrawOutcome {
        self.draws.lock().unwrap().push(region.sequence);
        if self.panics {
            panic!("decoder blew up on draw {}", region.sequence);
        }
        self.outcome
    }

    fn resize(&mut self, width: u32, height: u32) -> anyhow::Result<()> {
        if self.fail_resize {
            anyhow::bail!("no memory for {}x{}", width, height);
        }
        self.sizes.lock().unwrap().push((width, height));
        Ok(())
    }
}

/// Everything the core asked the platform to do
#[derive(Debug, Default)]
pub struct PlatformLog {
    pub titles: Vec<String>,
    pub hints: Vec<GeometryHints>,
    pub modal: Vec<bool>,
    pub icons: Vec<WindowIcon>,
    pub transient_for: Vec<u32>,
    pub type_hints: Vec<WindowTypeHint>,
    pub wm_classes: Vec<(String, String)>,
    pub redraws: Vec<Geometry>,
    pub workspaces: Vec<u32>,
    pub backings: usize,
}

/// Platform that records calls into a shared log
#[derive(Debug, Clone)]
pub struct RecordingPlatform {
    pub log: Rc<RefCell<PlatformLog>>,
    pub backing: FakeBacking,
    pub realized: bool,
    pub fail_hints: bool,
    pub workspace: Option<u32>,
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self {
            log: Rc::default(),
            backing: FakeBacking::default(),
            realized: false,
            fail_hints: false,
            workspace: None,
        }
    }
}

impl WindowPlatform for RecordingPlatform {
    fn new_backing(&mut self, _width: u32, _height: u32) -> anyhow::Result<Box<dyn Backing>> {
        self.log.borrow_mut().backings += 1;
        Ok(Box::new(self.backing.clone()))
    }

    fn set_title(&mut self, title: &str) {
        self.log.borrow_mut().titles.push(title.to_string());
    }

    fn apply_geometry_hints(&mut self, hints: &GeometryHints) -> anyhow::Result<()> {
        if self.fail_hints {
            anyhow::bail!("hints rejected");
        }
        self.log.borrow_mut().hints.push(hints.clone());
        Ok(())
    }

    fn set_modal(&mut self, modal: bool) {
        self.log.borrow_mut().modal.push(modal);
    }

    fn update_icon(&mut self, icon: &WindowIcon) -> anyhow::Result<()> {
        self.log.borrow_mut().icons.push(icon.clone());
        Ok(())
    }

    fn apply_transient_for(&mut self, parent: u32) {
        self.log.borrow_mut().transient_for.push(parent);
    }

    fn set_type_hint(&mut self, hint: WindowTypeHint) {
        self.log.borrow_mut().type_hints.push(hint);
    }

    fn set_wm_class(&mut self, instance: &str, class: &str) {
        self.log
            .borrow_mut()
            .wm_classes
            .push((instance.to_string(), class.to_string()));
    }

    fn is_realized(&self) -> bool {
        self.realized
    }

    fn queue_draw(&mut self, region: Geometry) {
        self.log.borrow_mut().redraws.push(region);
    }

    fn can_set_workspace(&self) -> bool {
        self.workspace.is_some()
    }

    fn current_workspace(&self) -> Option<u32> {
        self.workspace
    }

    fn set_workspace(&mut self, workspace: u32) -> anyhow::Result<u32> {
        self.log.borrow_mut().workspaces.push(workspace);
        Ok(workspace)
    }
}
