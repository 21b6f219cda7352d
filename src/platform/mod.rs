//! Platform capability interface
//!
//! The window core never talks to a toolkit directly. Each target provides a
//! `WindowPlatform` for the platform window and a `Backing` for the pixel
//! surface the decoder paints into.

pub mod headless;

use anyhow::Result;
use area_remote_proto::DrawOptions;

use crate::shared::Geometry;
use crate::window::hints::GeometryHints;
use crate::window::metadata::WindowIcon;
use crate::window::window_type::WindowTypeHint;

/// One pixel update, as handed to the backing
#[derive(Debug, Clone)]
pub struct DrawRegion {
    /// Window-relative region
    pub geometry: Geometry,
    pub encoding: String,
    pub data: Vec<u8>,
    pub rowstride: u32,
    pub sequence: u64,
    pub options: DrawOptions,
}

/// Result of decoding and painting one update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawOutcome {
    pub success: bool,
    /// The painted pixels are not on screen yet; the region must be repainted
    pub needs_followup_repaint: bool,
}

impl DrawOutcome {
    pub fn painted(needs_followup_repaint: bool) -> Self {
        Self {
            success: true,
            needs_followup_repaint,
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            needs_followup_repaint: false,
        }
    }
}

/// Pixel surface owned by one window
///
/// `draw_region` may run on a worker thread, hence `Send`.
pub trait Backing: Send {
    /// Decode `region` and paint it into the surface
    fn draw_region(&mut self, region: &DrawRegion) -> DrawOutcome;

    /// Resize the surface, keeping the overlapping pixels. On error the
    /// old surface stays in place.
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;
}

/// Platform window operations the core depends on
///
/// Always called from the session's scheduling context.
pub trait WindowPlatform {
    fn new_backing(&mut self, width: u32, height: u32) -> Result<Box<dyn Backing>>;

    fn set_title(&mut self, title: &str);

    fn apply_geometry_hints(&mut self, hints: &GeometryHints) -> Result<()>;

    fn set_modal(&mut self, modal: bool);

    fn update_icon(&mut self, icon: &WindowIcon) -> Result<()>;

    fn apply_transient_for(&mut self, parent: u32);

    fn set_type_hint(&mut self, hint: WindowTypeHint);

    fn set_wm_class(&mut self, instance: &str, class: &str);

    /// Has the native window been created yet?
    fn is_realized(&self) -> bool;

    /// Schedule a repaint of a window-relative region
    fn queue_draw(&mut self, region: Geometry);

    fn can_set_workspace(&self) -> bool {
        false
    }

    fn current_workspace(&self) -> Option<u32> {
        None
    }

    fn set_workspace(&mut self, workspace: u32) -> Result<u32> {
        anyhow::bail!("cannot move window to workspace {}: not supported", workspace)
    }
}
