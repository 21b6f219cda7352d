//! Pointer input forwarding
//!
//! Translates local pointer activity over a client window into requests for
//! the server. Readonly sessions forward nothing.

use area_remote_proto::ClientRequest;
use tracing::debug;

use crate::window::ClientWindow;

/// Pointer state captured with an event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointerEvent {
    /// Root-relative position
    pub position: (i32, i32),
    /// Active modifier names ("shift", "control", ...)
    pub modifiers: Vec<String>,
    /// Buttons held down
    pub buttons: Vec<u32>,
}

/// Scroll direction, forwarded as an X11 button click
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    pub fn button(self) -> u32 {
        match self {
            Self::Up => 4,
            Self::Down => 5,
            Self::Left => 6,
            Self::Right => 7,
        }
    }
}

impl ClientWindow {
    pub fn pointer_motion(&self, event: &PointerEvent) {
        if self.is_readonly() {
            return;
        }
        self.send(ClientRequest::PointerPosition {
            wid: self.id(),
            pointer: event.position,
            modifiers: event.modifiers.clone(),
            buttons: event.buttons.clone(),
        });
    }

    pub fn button_action(&self, button: u32, pressed: bool, event: &PointerEvent) {
        if self.is_readonly() {
            debug!("Window {}: readonly, dropping button {}", self.id(), button);
            return;
        }
        self.send(ClientRequest::ButtonAction {
            wid: self.id(),
            button,
            pressed,
            pointer: event.position,
            modifiers: event.modifiers.clone(),
            buttons: event.buttons.clone(),
        });
    }

    /// One scroll step is a press and a release of the mapped button
    pub fn scroll(&self, direction: ScrollDirection, event: &PointerEvent) {
        self.button_action(direction.button(), true, event);
        self.button_action(direction.button(), false, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use area_remote_proto::Metadata;
    use tokio::sync::mpsc;

    use crate::shared::Geometry;
    use crate::testing::RecordingPlatform;
    use crate::window::WindowSettings;

    fn window(readonly: bool) -> (ClientWindow, mpsc::UnboundedReceiver<ClientRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let settings = WindowSettings {
            readonly,
            ..WindowSettings::default()
        };
        let window = ClientWindow::new(
            2,
            Geometry::new(0, 0, 50, 50),
            false,
            Metadata::new(),
            Arc::new(settings),
            Box::new(RecordingPlatform::new()),
            tx,
        );
        (window, rx)
    }

    fn event() -> PointerEvent {
        PointerEvent {
            position: (12, 34),
            modifiers: vec!["shift".into()],
            buttons: vec![1],
        }
    }

    #[test]
    fn test_motion_forwarded() {
        let (window, mut rx) = window(false);
        window.pointer_motion(&event());

        assert_eq!(
            rx.try_recv().unwrap(),
            ClientRequest::PointerPosition {
                wid: 2,
                pointer: (12, 34),
                modifiers: vec!["shift".into()],
                buttons: vec![1],
            }
        );
    }

    #[test]
    fn test_scroll_is_press_then_release() {
        let (window, mut rx) = window(false);
        window.scroll(ScrollDirection::Down, &event());

        let pressed: Vec<(u32, bool)> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|req| match req {
                ClientRequest::ButtonAction { button, pressed, .. } => (button, pressed),
                other => panic!("unexpected request {:?}", other),
            })
            .collect();
        assert_eq!(pressed, vec![(5, true), (5, false)]);
    }

    #[test]
    fn test_readonly_forwards_nothing() {
        let (window, mut rx) = window(true);
        window.pointer_motion(&event());
        window.button_action(1, true, &event());
        window.scroll(ScrollDirection::Up, &event());

        assert!(rx.try_recv().is_err());
    }
}
