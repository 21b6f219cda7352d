//! Area Remote Protocol
//!
//! Message types exchanged between a remote display server and the
//! `area-remote` client, plus the length-prefixed framing used on the socket.

pub mod metadata;

pub use metadata::{Metadata, MetadataValue};

use serde::{Deserialize, Serialize};

/// Default socket path for the display server endpoint
pub fn socket_path() -> std::path::PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR")
        .unwrap_or_else(|_| format!("/run/user/{}", unsafe { libc::getuid() }));
    std::path::PathBuf::from(runtime_dir).join("area-remote.sock")
}

/// Per-draw encoder options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawOptions {
    /// Encoder quality (0-100), absent for lossless encodings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<i64>,

    /// Anything else the encoder attached
    #[serde(flatten)]
    pub extra: Metadata,
}

impl DrawOptions {
    pub fn with_quality(quality: i64) -> Self {
        Self {
            quality: Some(quality),
            extra: Metadata::new(),
        }
    }

    /// Declared quality, 0 when the encoder did not report one
    pub fn quality(&self) -> i64 {
        self.quality.unwrap_or(0)
    }
}

// ============================================================================
// Server → Client Packets
// ============================================================================

/// Packets sent from the display server to the client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerPacket {
    /// A new remote window was announced
    NewWindow {
        wid: u32,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        #[serde(default)]
        metadata: Metadata,
        #[serde(default)]
        override_redirect: bool,
        #[serde(default)]
        client_properties: Metadata,
    },

    /// Incremental metadata update
    WindowMetadata { wid: u32, metadata: Metadata },

    /// Pixel update for a window region
    Draw {
        wid: u32,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        encoding: String,
        data: Vec<u8>,
        rowstride: u32,
        sequence: u64,
        #[serde(default)]
        options: DrawOptions,
    },

    /// Window was moved on the server
    MoveWindow { wid: u32, x: i32, y: i32 },

    /// Window was resized on the server
    ResizeWindow { wid: u32, width: u32, height: u32 },

    /// Window is gone
    LostWindow { wid: u32 },
}

impl ServerPacket {
    /// Target window of this packet
    pub fn wid(&self) -> u32 {
        match self {
            Self::NewWindow { wid, .. }
            | Self::WindowMetadata { wid, .. }
            | Self::Draw { wid, .. }
            | Self::MoveWindow { wid, .. }
            | Self::ResizeWindow { wid, .. }
            | Self::LostWindow { wid } => *wid,
        }
    }
}

// ============================================================================
// Client → Server Requests
// ============================================================================

/// Requests sent from the client to the display server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientRequest {
    /// Ask for a fresh (ideally lossless) full update of one window
    RefreshWindow { wid: u32 },

    /// Ask for a fresh update of every window
    RefreshAll,

    /// Pointer moved over a window
    PointerPosition {
        wid: u32,
        pointer: (i32, i32),
        modifiers: Vec<String>,
        buttons: Vec<u32>,
    },

    /// Button pressed or released over a window
    ButtonAction {
        wid: u32,
        button: u32,
        pressed: bool,
        pointer: (i32, i32),
        modifiers: Vec<String>,
        buttons: Vec<u32>,
    },

    /// Acknowledge a processed draw packet
    DamageSequence {
        sequence: u64,
        wid: u32,
        width: u32,
        height: u32,
        success: bool,
    },
}

// ============================================================================
// Message Framing
// ============================================================================

/// A framed message with length prefix for reliable socket reads
#[derive(Debug)]
pub struct FramedMessage {
    pub data: Vec<u8>,
}

impl FramedMessage {
    /// Create a new framed message from serializable data
    pub fn new<T: Serialize>(msg: &T) -> anyhow::Result<Self> {
        let data = serde_json::to_vec(msg)?;
        Ok(Self { data })
    }

    /// Encode message with length prefix (4 bytes, big-endian)
    pub fn encode(&self) -> Vec<u8> {
        let len = self.data.len() as u32;
        let mut buf = Vec::with_capacity(4 + self.data.len());
        buf.extend_from_slice(&len.to_be_bytes());
        buf.extend_from_slice(&self.data);
        buf
    }

    /// Decode a server packet from bytes
    pub fn decode_server_packet(data: &[u8]) -> anyhow::Result<ServerPacket> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Decode a client request from bytes
    pub fn decode_client_request(data: &[u8]) -> anyhow::Result<ClientRequest> {
        Ok(serde_json::from_slice(data)?)
    }
}
