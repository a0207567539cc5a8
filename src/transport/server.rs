//! Event socket server
//!
//! Line-delimited JSON over TCP. Each connection receives the current
//! readings on connect, then every broadcast from the engine; each line it
//! sends is decoded as an inbound event and forwarded to the engine.
//!
//! A connection only ever blocks itself. If it falls behind, its broadcast
//! receiver lags and the skipped readings are dropped.

use std::net::SocketAddr;

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn, Instrument};

use crate::core::config::ServerSettings;
use crate::core::error::Result;
use crate::core::types::ConnectionId;
use crate::simulation::engine::SimulationHandle;
use crate::simulation::events::{InboundMessage, ServerMessage};
use crate::transport::lines::{InboundLine, LineReader};

pub struct EventServer {
    listener: TcpListener,
    handle: SimulationHandle,
    max_line_bytes: usize,
}

impl EventServer {
    pub async fn bind(addr: &str, handle: SimulationHandle) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            handle,
            max_line_bytes: ServerSettings::default().max_line_bytes,
        })
    }

    /// Cap on inbound line length; longer lines are dropped
    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the simulation is stopped
    pub async fn serve(self) -> Result<()> {
        info!(addr = %self.local_addr()?, "Event server listening");

        loop {
            tokio::select! {
                _ = self.handle.stopped() => break,
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            warn!(error = %e, "Accept failed");
                            continue;
                        }
                    };
                    let id = ConnectionId::new();
                    let handle = self.handle.clone();
                    let max_line_bytes = self.max_line_bytes;
                    let span = tracing::info_span!("connection", %id, %peer);
                    tokio::spawn(
                        async move {
                            info!("Client connected");
                            if let Err(e) = serve_connection(stream, handle, max_line_bytes).await {
                                debug!(error = %e, "Connection ended with error");
                            }
                            info!("Client disconnected");
                        }
                        .instrument(span),
                    );
                }
            }
        }

        info!("Event server stopped");
        Ok(())
    }
}

async fn serve_connection(
    stream: TcpStream,
    handle: SimulationHandle,
    max_line_bytes: usize,
) -> Result<()> {
    let (read_half, mut writer) = stream.into_split();
    let mut lines = LineReader::new(read_half, max_line_bytes);

    // Subscribe before the initial push so nothing published in between is missed
    let mut updates = handle.subscribe();
    for message in handle.readings().await?.into_messages() {
        write_message(&mut writer, &message).await?;
    }

    loop {
        tokio::select! {
            _ = handle.stopped() => break,
            update = updates.recv() => match update {
                Ok(message) => write_message(&mut writer, &message).await?,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Observer lagging, readings dropped");
                }
                Err(RecvError::Closed) => break,
            },
            line = lines.next_line() => match line? {
                Some(InboundLine::Text(line)) => handle_line(&line, &handle, &mut writer).await?,
                Some(InboundLine::InvalidUtf8) => warn!("Non UTF-8 inbound line ignored"),
                Some(InboundLine::TooLong) => {
                    warn!(max_line_bytes, "Oversized inbound line dropped");
                }
                None => break,
            },
        }
    }

    Ok(())
}

async fn handle_line(
    line: &str,
    handle: &SimulationHandle,
    writer: &mut OwnedWriteHalf,
) -> Result<()> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(());
    }

    match InboundMessage::parse(line) {
        Ok(Some(InboundMessage::Control(event))) => handle.send(event)?,
        Ok(Some(InboundMessage::StatusQuery)) => {
            write_message(writer, &ServerMessage::Status(handle.status())).await?;
        }
        Ok(None) => debug!(line, "Event without usable payload ignored"),
        Err(e) => warn!(error = %e, "Malformed inbound message ignored"),
    }
    Ok(())
}

async fn write_message(writer: &mut OwnedWriteHalf, message: &ServerMessage) -> Result<()> {
    let mut line = message.to_line()?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    Ok(())
}
