//! Client Window
//!
//! One `ClientWindow` per remote window. It merges metadata into the platform
//! window, routes pixel updates through the dispatcher and drives the repair
//! timer from their completions. Everything here runs on the session's
//! scheduling context except `DrawJob::run`.

pub mod dispatch;
pub mod hints;
pub mod metadata;
pub mod repair;
pub mod sequence;
pub mod window_type;

use std::sync::Arc;
use std::time::Duration;

use area_remote_proto::{ClientRequest, Metadata, MetadataValue};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::platform::{DrawRegion, WindowPlatform};
use crate::scheduler::{Scheduler, TimerHandle};
use crate::shared::Geometry;
use dispatch::{DrawCallback, DrawCommand, DrawCompletion, DrawJob, UpdateDispatcher};
use metadata::MetadataStore;
use repair::{DrawReport, EncodingPolicy, RepairScheduler};
use window_type::WindowTypeHint;

/// Session-wide settings every window reads
#[derive(Debug, Clone)]
pub struct WindowSettings {
    /// Title template with `@token@` placeholders
    pub title_template: String,
    pub readonly: bool,
    /// Zero disables repairs
    pub auto_refresh_delay: Duration,
    pub encodings: Arc<EncodingPolicy>,
}

impl WindowSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            title_template: config.client.title.clone(),
            readonly: config.client.readonly,
            auto_refresh_delay: Duration::from_millis(config.client.auto_refresh_delay_ms),
            encodings: Arc::new(config.encoding.policy()),
        }
    }
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Client-side state of one remote window
pub struct ClientWindow {
    id: u32,
    geometry: Geometry,
    override_redirect: bool,
    mapped: bool,
    metadata: MetadataStore,
    /// Per-session properties from the server (e.g. requested workspace)
    client_properties: Metadata,
    settings: Arc<WindowSettings>,
    platform: Box<dyn WindowPlatform>,
    dispatcher: UpdateDispatcher,
    repair: RepairScheduler,
    requests: mpsc::UnboundedSender<ClientRequest>,
}

impl ClientWindow {
    pub fn new(
        id: u32,
        geometry: Geometry,
        override_redirect: bool,
        client_properties: Metadata,
        settings: Arc<WindowSettings>,
        platform: Box<dyn WindowPlatform>,
        requests: mpsc::UnboundedSender<ClientRequest>,
    ) -> Self {
        let repair = RepairScheduler::new(id, settings.auto_refresh_delay, settings.encodings.clone());
        Self {
            id,
            geometry,
            override_redirect,
            mapped: false,
            metadata: MetadataStore::new(),
            client_properties,
            settings,
            platform,
            dispatcher: UpdateDispatcher::new(id),
            repair,
            requests,
        }
    }

    /// Create the backing and apply the initial metadata
    ///
    /// Without a backing the window still exists, but every draw is rejected.
    pub fn init(&mut self, metadata: Metadata) {
        let Geometry { width, height, .. } = self.geometry;
        match self.platform.new_backing(width, height) {
            Ok(backing) => self.dispatcher.install(backing),
            Err(e) => error!("Window {}: failed to create {}x{} backing: {}", self.id, width, height, e),
        }
        self.update_metadata(metadata);
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn is_override_redirect(&self) -> bool {
        self.override_redirect
    }

    pub fn is_mapped(&self) -> bool {
        self.mapped
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    pub fn is_repair_armed(&self) -> bool {
        self.repair.is_armed()
    }

    pub(crate) fn is_readonly(&self) -> bool {
        self.settings.readonly
    }

    pub(crate) fn send(&self, request: ClientRequest) {
        if self.requests.send(request).is_err() {
            debug!("Window {}: request channel closed", self.id);
        }
    }

    // ------------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------------

    /// Merge a metadata update and re-derive every property
    pub fn update_metadata(&mut self, update: Metadata) {
        self.metadata.merge(update);
        self.apply_metadata();
    }

    /// Each derivation is independent; a failure is logged and the previous
    /// platform value stays in effect.
    fn apply_metadata(&mut self) {
        let title = self.metadata.derive_title(&self.settings.title_template);
        self.platform.set_title(&title);

        match self.metadata.derive_size_hints() {
            Ok(Some(hints)) => {
                if let Err(e) = self.platform.apply_geometry_hints(&hints) {
                    error!("Window {}: failed to apply geometry hints {:?}: {}", self.id, hints, e);
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Window {}: {}", self.id, e),
        }

        if !self.platform.is_realized() {
            match self.metadata.derive_wm_class() {
                Ok((instance, class)) => self.platform.set_wm_class(&instance, &class),
                Err(e) => warn!("Window {}: {}", self.id, e),
            }
        }

        self.platform.set_modal(self.metadata.derive_modal());

        match self.metadata.derive_icon() {
            Ok(Some(icon)) => {
                if let Err(e) = self.platform.update_icon(&icon) {
                    warn!("Window {}: failed to update icon: {}", self.id, e);
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Window {}: {}", self.id, e),
        }

        match self.metadata.derive_transient_parent() {
            Ok(Some(parent)) => self.platform.apply_transient_for(parent),
            Ok(None) => {}
            Err(e) => warn!("Window {}: {}", self.id, e),
        }

        match self.metadata.derive_window_type(self.mapped) {
            Ok(Some(hint)) => {
                debug!("Window {}: setting window type to {:?}", self.id, hint);
                self.platform.set_type_hint(hint);
            }
            Ok(None) => {}
            Err(e) => warn!("Window {}: {}", self.id, e),
        }
    }

    // ------------------------------------------------------------------------
    // Geometry and mapping
    // ------------------------------------------------------------------------

    pub fn move_to(&mut self, x: i32, y: i32) {
        self.geometry.x = x;
        self.geometry.y = y;
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) == (self.geometry.width, self.geometry.height) {
            return;
        }
        debug!("Window {}: resize to {}x{}", self.id, width, height);
        self.geometry.width = width;
        self.geometry.height = height;
        self.dispatcher.resize(width, height);
    }

    /// Map the window, moving it to the requested workspace first
    pub fn show(&mut self) {
        if self.mapped {
            return;
        }
        if let Some(workspace) = self.set_workspace() {
            info!("Window {} placed on workspace {}", self.id, workspace);
        }
        self.mapped = true;
    }

    /// Only before the first map, and only if it differs from the current one
    fn set_workspace(&mut self) -> Option<u32> {
        if !self.platform.can_set_workspace() || self.mapped {
            return None;
        }
        let workspace = self
            .client_properties
            .get("workspace")
            .and_then(MetadataValue::as_int)
            .unwrap_or(-1);
        debug!("Window {}: requested workspace {}", self.id, workspace);

        let workspace = u32::try_from(workspace).ok()?;
        if self.platform.current_workspace() == Some(workspace) {
            return None;
        }
        match self.platform.set_workspace(workspace) {
            Ok(workspace) => Some(workspace),
            Err(e) => {
                error!("Window {}: failed to set workspace: {}", self.id, e);
                None
            }
        }
    }

    /// Tear down: no repair may fire and no draw may start afterwards
    pub fn destroy(&mut self, scheduler: &mut dyn Scheduler) {
        self.repair.cancel(scheduler);
        self.dispatcher.release();
    }

    // ------------------------------------------------------------------------
    // Pixel updates
    // ------------------------------------------------------------------------

    /// Accept a pixel update
    ///
    /// Returns the job to run now, or `None` when it was queued behind a
    /// draw still in flight. The result is delivered through
    /// [`ClientWindow::on_draw_complete`].
    pub fn draw_region(&mut self, region: DrawRegion, callbacks: Vec<DrawCallback>) -> Result<Option<DrawJob>> {
        self.dispatcher.submit(DrawCommand::new(region, callbacks))
    }

    /// Finish a draw on the scheduling context
    ///
    /// Runs the caller's callbacks, then the repair logic, then hands back
    /// the next queued draw if there is one.
    pub fn on_draw_complete(
        &mut self,
        completion: DrawCompletion,
        scheduler: &mut dyn Scheduler,
    ) -> Option<DrawJob> {
        let (command, outcome) = self.dispatcher.finish(completion);
        let DrawCommand { region, callbacks } = command;

        for callback in callbacks {
            callback(outcome.success);
        }

        if outcome.success && outcome.needs_followup_repaint {
            self.platform.queue_draw(region.geometry);
        }

        self.repair
            .on_draw_complete(&DrawReport::new(&region, outcome.success), scheduler);

        self.dispatcher.next_job()
    }

    /// Repair timer fired
    pub fn on_refresh_timer(&mut self, handle: TimerHandle) {
        if self.repair.on_timer(handle) {
            self.refresh_window();
        }
    }

    pub fn refresh_window(&self) {
        debug!("Window {}: requesting refresh", self.id);
        self.send(ClientRequest::RefreshWindow { wid: self.id });
    }

    pub fn refresh_all_windows(&self) {
        self.send(ClientRequest::RefreshAll);
    }

    // ------------------------------------------------------------------------
    // Spinner
    // ------------------------------------------------------------------------

    /// Server responsiveness changed: repaint so the platform can draw or
    /// clear its busy overlay
    pub fn spinner(&mut self, ok: bool) {
        if !self.can_have_spinner() {
            return;
        }
        debug!("Window {}: spinner ok={}", self.id, ok);
        self.platform.queue_draw(self.geometry.local());
    }

    pub fn can_have_spinner(&self) -> bool {
        match self.metadata.window_types() {
            Ok(names) => names
                .into_iter()
                .filter_map(WindowTypeHint::from_name)
                .any(|hint| hint.can_have_spinner()),
            Err(_) => false,
        }
    }
}

impl std::fmt::Debug for ClientWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientWindow")
            .field("id", &self.id)
            .field("geometry", &self.geometry)
            .field("override_redirect", &self.override_redirect)
            .field("mapped", &self.mapped)
            .field("repair", &self.repair)
            .finish()
    }
}
