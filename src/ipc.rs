//! Connection to the remote display server
//!
//! Frames are a 4-byte big-endian length followed by a JSON body. The socket
//! is split into a reader task feeding `ServerPacket`s to the session and a
//! writer task draining the session's `ClientRequest`s.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use area_remote_proto::{ClientRequest, FramedMessage, ServerPacket};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Draw packets carry whole frames
const MAX_FRAME: usize = 64 * 1024 * 1024;

const CONNECT_RETRIES: u32 = 100;

pub struct ServerConnection {
    pub packets: mpsc::Receiver<ServerPacket>,
    pub requests: mpsc::UnboundedSender<ClientRequest>,
}

impl ServerConnection {
    /// Connect to the server socket, waiting for it to appear
    pub async fn connect(path: &Path) -> Result<Self> {
        info!("Connecting to server at {:?}", path);

        let mut retries = CONNECT_RETRIES;
        while !path.exists() && retries > 0 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            retries -= 1;
        }

        if !path.exists() {
            return Err(anyhow::anyhow!("Server socket not found: {:?}", path));
        }

        let stream = UnixStream::connect(path)
            .await
            .context("Failed to connect to server socket")?;

        info!("Connected to server");
        Ok(Self::from_stream(stream))
    }

    pub fn from_stream(stream: UnixStream) -> Self {
        let (reader, writer) = stream.into_split();
        let (packet_tx, packet_rx) = mpsc::channel(256);
        let (request_tx, request_rx) = mpsc::unbounded_channel();

        tokio::spawn(read_packets(reader, packet_tx));
        tokio::spawn(write_requests(writer, request_rx));

        Self {
            packets: packet_rx,
            requests: request_tx,
        }
    }
}

async fn read_packets<R: AsyncRead + Unpin>(mut reader: R, packets: mpsc::Sender<ServerPacket>) {
    let mut len_buf = [0u8; 4];
    loop {
        if reader.read_exact(&mut len_buf).await.is_err() {
            debug!("Server reader task ended");
            break;
        }
        let len = u32::from_be_bytes(len_buf) as usize;

        if len > MAX_FRAME {
            warn!("Packet too large: {} bytes", len);
            break;
        }

        let mut msg_buf = vec![0u8; len];
        if reader.read_exact(&mut msg_buf).await.is_err() {
            break;
        }

        match FramedMessage::decode_server_packet(&msg_buf) {
            Ok(packet) => {
                debug!("Received packet for window {}", packet.wid());
                if packets.send(packet).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!("Failed to decode server packet: {}", e);
            }
        }
    }
}

async fn write_requests<W: AsyncWrite + Unpin>(
    mut writer: W,
    mut requests: mpsc::UnboundedReceiver<ClientRequest>,
) {
    while let Some(request) = requests.recv().await {
        debug!("Sending request: {:?}", request);
        match FramedMessage::new(&request) {
            Ok(msg) => {
                if writer.write_all(&msg.encode()).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                error!("Failed to encode request: {}", e);
            }
        }
    }
    debug!("Server writer task ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use area_remote_proto::Metadata;

    #[tokio::test]
    async fn test_packets_and_requests_cross_the_socket() {
        let (client, mut server) = UnixStream::pair().unwrap();
        let mut conn = ServerConnection::from_stream(client);

        let packet = ServerPacket::WindowMetadata { wid: 9, metadata: Metadata::new() };
        let frame = FramedMessage::new(&packet).unwrap().encode();
        server.write_all(&frame).await.unwrap();

        match conn.packets.recv().await.unwrap() {
            ServerPacket::WindowMetadata { wid, .. } => assert_eq!(wid, 9),
            other => panic!("unexpected packet {:?}", other),
        }

        conn.requests.send(ClientRequest::RefreshWindow { wid: 9 }).unwrap();
        let mut len_buf = [0u8; 4];
        server.read_exact(&mut len_buf).await.unwrap();
        let mut body = vec![0u8; u32::from_be_bytes(len_buf) as usize];
        server.read_exact(&mut body).await.unwrap();
        assert_eq!(
            FramedMessage::decode_client_request(&body).unwrap(),
            ClientRequest::RefreshWindow { wid: 9 }
        );
    }

    #[tokio::test]
    async fn test_garbage_frame_is_skipped() {
        let (client, mut server) = UnixStream::pair().unwrap();
        let mut conn = ServerConnection::from_stream(client);

        let garbage = FramedMessage { data: b"not json".to_vec() }.encode();
        server.write_all(&garbage).await.unwrap();
        let frame = FramedMessage::new(&ServerPacket::LostWindow { wid: 4 }).unwrap().encode();
        server.write_all(&frame).await.unwrap();

        assert_eq!(conn.packets.recv().await.unwrap().wid(), 4);
    }

    #[tokio::test]
    async fn test_stream_closes_with_socket() {
        let (client, server) = UnixStream::pair().unwrap();
        let mut conn = ServerConnection::from_stream(client);
        drop(server);

        assert!(conn.packets.recv().await.is_none());
    }
}
