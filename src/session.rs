//! Client session
//!
//! The session task is the single-threaded scheduling context: it owns every
//! window, every repair timer and the request channel. Decoding runs on
//! blocking worker threads and comes back as `SessionEvent::DrawComplete`.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use area_remote_proto::{ClientRequest, ServerPacket};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::platform::{DrawRegion, WindowPlatform};
use crate::scheduler::{Scheduler, TimerHandle, TokioScheduler};
use crate::shared::Geometry;
use crate::window::dispatch::{DrawCallback, DrawCompletion, DrawJob};
use crate::window::{ClientWindow, WindowSettings};

/// Creates the platform side of a new window
pub type PlatformFactory = Box<dyn FnMut(u32) -> Box<dyn WindowPlatform>>;

/// Work handed back to the scheduling context
pub enum SessionEvent {
    DrawComplete(DrawCompletion),
    TimerFired { wid: u32, handle: TimerHandle },
}

impl std::fmt::Debug for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DrawComplete(completion) => f
                .debug_struct("DrawComplete")
                .field("wid", &completion.wid())
                .field("outcome", &completion.outcome())
                .finish(),
            Self::TimerFired { wid, handle } => f
                .debug_struct("TimerFired")
                .field("wid", wid)
                .field("handle", handle)
                .finish(),
        }
    }
}

pub struct Session {
    settings: Arc<WindowSettings>,
    windows: HashMap<u32, ClientWindow>,
    scheduler: TokioScheduler,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    requests: mpsc::UnboundedSender<ClientRequest>,
    platforms: PlatformFactory,
}

impl Session {
    pub fn new(
        settings: WindowSettings,
        requests: mpsc::UnboundedSender<ClientRequest>,
        platforms: PlatformFactory,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            settings: Arc::new(settings),
            windows: HashMap::new(),
            scheduler: TokioScheduler::new(events_tx.clone()),
            events_tx,
            events_rx,
            requests,
            platforms,
        }
    }

    pub fn window(&self, wid: u32) -> Option<&ClientWindow> {
        self.windows.get(&wid)
    }

    pub fn window_mut(&mut self, wid: u32) -> Option<&mut ClientWindow> {
        self.windows.get_mut(&wid)
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    /// Process packets until the stream closes
    pub async fn run(mut self, mut packets: mpsc::Receiver<ServerPacket>) -> Result<()> {
        info!("Session started");
        loop {
            tokio::select! {
                packet = packets.recv() => match packet {
                    Some(packet) => self.handle_packet(packet),
                    None => {
                        info!("Server packet stream closed");
                        break;
                    }
                },
                Some(event) = self.events_rx.recv() => self.handle_event(event),
            }
        }
        self.shutdown();
        Ok(())
    }

    /// Wait for one internal event (draw completion or timer) and handle it
    pub async fn process_next_event(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    pub fn handle_packet(&mut self, packet: ServerPacket) {
        match packet {
            ServerPacket::NewWindow {
                wid,
                x,
                y,
                width,
                height,
                metadata,
                override_redirect,
                client_properties,
            } => {
                if self.windows.contains_key(&wid) {
                    warn!("Window {} announced twice, ignoring", wid);
                    return;
                }
                let platform = (self.platforms)(wid);
                let mut window = ClientWindow::new(
                    wid,
                    Geometry::new(x, y, width, height),
                    override_redirect,
                    client_properties,
                    self.settings.clone(),
                    platform,
                    self.requests.clone(),
                );
                window.init(metadata);
                window.show();
                info!("New window {} ({}x{} at {},{})", wid, width, height, x, y);
                self.windows.insert(wid, window);
            }

            ServerPacket::WindowMetadata { wid, metadata } => match self.windows.get_mut(&wid) {
                Some(window) => window.update_metadata(metadata),
                None => debug!("Metadata for unknown window {}, dropped", wid),
            },

            ServerPacket::Draw {
                wid,
                x,
                y,
                width,
                height,
                encoding,
                data,
                rowstride,
                sequence,
                options,
            } => {
                let region = DrawRegion {
                    geometry: Geometry::new(x, y, width, height),
                    encoding,
                    data,
                    rowstride,
                    sequence,
                    options,
                };
                self.draw(wid, region);
            }

            ServerPacket::MoveWindow { wid, x, y } => match self.windows.get_mut(&wid) {
                Some(window) => window.move_to(x, y),
                None => debug!("Move for unknown window {}, dropped", wid),
            },

            ServerPacket::ResizeWindow { wid, width, height } => match self.windows.get_mut(&wid) {
                Some(window) => window.resize(width, height),
                None => debug!("Resize for unknown window {}, dropped", wid),
            },

            ServerPacket::LostWindow { wid } => match self.windows.remove(&wid) {
                Some(mut window) => {
                    window.destroy(&mut self.scheduler);
                    info!("Window {} destroyed", wid);
                }
                None => debug!("Lost unknown window {}", wid),
            },
        }
    }

    fn draw(&mut self, wid: u32, region: DrawRegion) {
        let Some(window) = self.windows.get_mut(&wid) else {
            debug!("Draw {} for unknown window {}, dropped", region.sequence, wid);
            return;
        };

        let ack = damage_ack(self.requests.clone(), wid, &region);
        match window.draw_region(region, vec![ack]) {
            Ok(Some(job)) => self.spawn_draw(job),
            Ok(None) => {}
            Err(e) => warn!("Draw rejected: {}", e),
        }
    }

    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::DrawComplete(completion) => {
                let wid = completion.wid();
                let Some(window) = self.windows.get_mut(&wid) else {
                    debug!("Draw completed for destroyed window {}, dropped", wid);
                    return;
                };
                if let Some(next) = window.on_draw_complete(completion, &mut self.scheduler) {
                    self.spawn_draw(next);
                }
            }
            SessionEvent::TimerFired { wid, handle } => {
                self.scheduler.retire(handle);
                match self.windows.get_mut(&wid) {
                    Some(window) => window.on_refresh_timer(handle),
                    None => debug!("Timer fired for destroyed window {}", wid),
                }
            }
        }
    }

    fn spawn_draw(&self, job: DrawJob) {
        let events = self.events_tx.clone();
        tokio::task::spawn_blocking(move || {
            let completion = job.run();
            if events.send(SessionEvent::DrawComplete(completion)).is_err() {
                debug!("Session gone before draw completed");
            }
        });
    }

    fn shutdown(&mut self) {
        for (_, mut window) in self.windows.drain() {
            window.destroy(&mut self.scheduler);
        }
        info!("Session stopped");
    }
}

/// Acknowledge the draw to the server once it has been processed
fn damage_ack(
    requests: mpsc::UnboundedSender<ClientRequest>,
    wid: u32,
    region: &DrawRegion,
) -> DrawCallback {
    let sequence = region.sequence;
    let Geometry { width, height, .. } = region.geometry;
    Box::new(move |success| {
        let ack = ClientRequest::DamageSequence {
            sequence,
            wid,
            width,
            height,
            success,
        };
        if requests.send(ack).is_err() {
            debug!("Window {}: request channel closed, draw {} not acked", wid, sequence);
        }
    })
}
