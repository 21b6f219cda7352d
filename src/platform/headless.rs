//! Headless platform
//!
//! Keeps window state and pixels in memory. Used by the `area-remote` binary
//! when no toolkit is attached, and handy for inspecting what the core did.

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::{Backing, DrawOutcome, DrawRegion, WindowPlatform};
use crate::shared::Geometry;
use crate::window::hints::GeometryHints;
use crate::window::metadata::WindowIcon;
use crate::window::window_type::WindowTypeHint;

/// In-memory platform window
#[derive(Debug, Default)]
pub struct HeadlessPlatform {
    pub wid: u32,
    pub title: String,
    pub hints: Option<GeometryHints>,
    pub modal: bool,
    pub icon: Option<WindowIcon>,
    pub transient_for: Option<u32>,
    pub type_hint: Option<WindowTypeHint>,
    pub wm_class: Option<(String, String)>,
    /// Damage waiting to be presented, coalesced into one rectangle
    pub pending_redraw: Option<Geometry>,
}

impl HeadlessPlatform {
    pub fn new(wid: u32) -> Self {
        Self {
            wid,
            ..Self::default()
        }
    }

    /// Hand the accumulated damage to whoever presents the window
    pub fn take_redraw(&mut self) -> Option<Geometry> {
        self.pending_redraw.take()
    }
}

impl WindowPlatform for HeadlessPlatform {
    fn new_backing(&mut self, width: u32, height: u32) -> Result<Box<dyn Backing>> {
        debug!("Window {}: new {}x{} memory backing", self.wid, width, height);
        Ok(Box::new(MemoryBacking::new(width, height)?))
    }

    fn set_title(&mut self, title: &str) {
        if self.title != title {
            debug!("Window {} title: {}", self.wid, title);
            self.title = title.to_string();
        }
    }

    fn apply_geometry_hints(&mut self, hints: &GeometryHints) -> Result<()> {
        if let (Some(min_w), Some(max_w)) = (hints.min_width, hints.max_width) {
            if min_w > max_w {
                anyhow::bail!("minimum width {} exceeds maximum {}", min_w, max_w);
            }
        }
        if let (Some(min_h), Some(max_h)) = (hints.min_height, hints.max_height) {
            if min_h > max_h {
                anyhow::bail!("minimum height {} exceeds maximum {}", min_h, max_h);
            }
        }
        self.hints = Some(hints.clone());
        Ok(())
    }

    fn set_modal(&mut self, modal: bool) {
        self.modal = modal;
    }

    fn update_icon(&mut self, icon: &WindowIcon) -> Result<()> {
        let pixel_count = (icon.width as usize)
            .checked_mul(icon.height as usize)
            .context("Icon size overflow")?;
        // Sanity check: max 1MP icon
        if pixel_count == 0 || pixel_count > 1024 * 1024 {
            anyhow::bail!("unreasonable icon size {}x{}", icon.width, icon.height);
        }
        debug!(
            "Window {}: icon {}x{} ({}, {} bytes)",
            self.wid,
            icon.width,
            icon.height,
            icon.encoding,
            icon.data.len()
        );
        self.icon = Some(icon.clone());
        Ok(())
    }

    fn apply_transient_for(&mut self, parent: u32) {
        debug!("Window {} is transient for {}", self.wid, parent);
        self.transient_for = Some(parent);
    }

    fn set_type_hint(&mut self, hint: WindowTypeHint) {
        self.type_hint = Some(hint);
    }

    fn set_wm_class(&mut self, instance: &str, class: &str) {
        self.wm_class = Some((instance.to_string(), class.to_string()));
    }

    fn is_realized(&self) -> bool {
        // the class is fixed once the first one is applied
        self.wm_class.is_some()
    }

    fn queue_draw(&mut self, region: Geometry) {
        self.pending_redraw = Some(match self.pending_redraw {
            Some(pending) => pending.union(&region),
            None => region,
        });
    }
}

/// Largest surface a window may have (8192x8192)
const MAX_SURFACE_PIXELS: usize = 8192 * 8192;

fn surface_len(width: u32, height: u32) -> Result<usize> {
    let len = (width as usize)
        .checked_mul(height as usize)
        .context("Surface size overflow")?;
    if len > MAX_SURFACE_PIXELS {
        anyhow::bail!("unreasonable surface size {}x{}", width, height);
    }
    Ok(len)
}

/// Raw pixel surface (0xAARRGGBB per pixel)
#[derive(Debug, Clone)]
pub struct MemoryBacking {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl MemoryBacking {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Ok(Self {
            width,
            height,
            pixels: vec![0; surface_len(width, height)?],
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    fn paint_raw(&mut self, region: &DrawRegion, bytes_per_pixel: usize) -> Result<()> {
        let Geometry { x, y, width, height } = region.geometry;
        if x < 0 || y < 0 {
            anyhow::bail!("region origin {},{} is outside the surface", x, y);
        }
        let (x, y) = (x as u32, y as u32);
        if x.saturating_add(width) > self.width || y.saturating_add(height) > self.height {
            anyhow::bail!(
                "region {}x{}+{}+{} exceeds {}x{} surface",
                width,
                height,
                x,
                y,
                self.width,
                self.height
            );
        }

        let row_bytes = width as usize * bytes_per_pixel;
        let stride = match region.rowstride as usize {
            0 => row_bytes,
            s if s < row_bytes => anyhow::bail!("rowstride {} shorter than a row ({})", s, row_bytes),
            s => s,
        };
        if height > 0 && region.data.len() < stride * (height as usize - 1) + row_bytes {
            anyhow::bail!("{} bytes is too short for {}x{}", region.data.len(), width, height);
        }

        for row in 0..height as usize {
            let src = &region.data[row * stride..row * stride + row_bytes];
            let dst_start = (y as usize + row) * self.width as usize + x as usize;
            let dst = &mut self.pixels[dst_start..dst_start + width as usize];
            for (out, px) in dst.iter_mut().zip(src.chunks_exact(bytes_per_pixel)) {
                let alpha = if bytes_per_pixel == 4 { px[3] } else { 0xff };
                *out = u32::from_be_bytes([alpha, px[0], px[1], px[2]]);
            }
        }
        Ok(())
    }
}

impl Backing for MemoryBacking {
    fn draw_region(&mut self, region: &DrawRegion) -> DrawOutcome {
        let result = match region.encoding.as_str() {
            "rgb24" => self.paint_raw(region, 3),
            "rgb32" => self.paint_raw(region, 4),
            other => Err(anyhow::anyhow!("no decoder for {}", other)),
        };

        match result {
            // off-screen buffer: the window must be repainted to show it
            Ok(()) => DrawOutcome::painted(true),
            Err(e) => {
                warn!("Draw {} failed: {}", region.sequence, e);
                DrawOutcome::failed()
            }
        }
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        let mut pixels = vec![0; surface_len(width, height)?];
        let copy_w = width.min(self.width) as usize;
        for row in 0..height.min(self.height) as usize {
            let src = row * self.width as usize;
            let dst = row * width as usize;
            pixels[dst..dst + copy_w].copy_from_slice(&self.pixels[src..src + copy_w]);
        }
        self.width = width;
        self.height = height;
        self.pixels = pixels;
        Ok(())
    }
}
