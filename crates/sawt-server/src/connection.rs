use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use sawt_core::control::ControlMessage;
use sawt_core::errors::{AppError, TransportError};
use sawt_core::ids::ConnectionId;
use sawt_core::stages::Stages;

use crate::registry::ConnectionRegistry;
use crate::session::Session;
use crate::transport::{ChannelTransport, FrameSource, InboundFrame, Outbound, Transport, WsFrameSource};

/// Per-connection tuning taken from the server config.
#[derive(Clone, Copy, Debug)]
pub struct ConnectionOptions {
    pub max_send_queue: usize,
    pub heartbeat_interval: Duration,
}

/// Drive one WebSocket connection until the client goes away.
pub async fn handle_ws_connection(
    socket: WebSocket,
    registry: Arc<ConnectionRegistry>,
    stages: Stages,
    options: ConnectionOptions,
) {
    let (ws_tx, ws_rx) = socket.split();
    let (transport, rx) = ChannelTransport::channel(options.max_send_queue);
    let heartbeat = options.heartbeat_interval;

    run_connection(
        WsFrameSource::new(ws_rx),
        Arc::new(transport),
        move |connection_id| write_loop(ws_tx, rx, heartbeat, connection_id),
        &registry,
        stages,
    )
    .await;
}

/// Register the connection, then supervise its reader and writer tasks.
///
/// The reader buffers audio and dispatches control frames; the writer drains
/// the outbound queue. Whichever finishes first ends the connection, and the
/// entry is unregistered either way, including when the reader panics.
pub(crate) async fn run_connection<S, F, W>(
    source: S,
    transport: Arc<dyn Transport>,
    spawn_writer: F,
    registry: &ConnectionRegistry,
    stages: Stages,
) where
    S: FrameSource + 'static,
    F: FnOnce(ConnectionId) -> W,
    W: Future<Output = ()> + Send + 'static,
{
    let connection_id = registry.register(Arc::clone(&transport));
    tracing::info!(connection_id = %connection_id, "WebSocket client connected");

    let session = Arc::new(Session::new(connection_id.clone(), transport, stages));

    let mut writer = tokio::spawn(spawn_writer(connection_id.clone()));
    let mut reader = tokio::spawn({
        let session = Arc::clone(&session);
        let mut source = source;
        async move { read_loop(&mut source, &session).await }
    });

    tokio::select! {
        result = &mut reader => {
            match result {
                Ok(Ok(())) => tracing::info!(connection_id = %connection_id, "client closed connection"),
                Ok(Err(e)) => tracing::warn!(connection_id = %connection_id, error = %e, "connection read failed"),
                Err(e) => tracing::error!(connection_id = %connection_id, error = %e, "frame dispatch aborted"),
            }
            writer.abort();
        }
        _ = &mut writer => {
            tracing::info!(connection_id = %connection_id, "connection writer stopped");
            reader.abort();
        }
    }

    let _ = registry.unregister(&connection_id);
    tracing::info!(
        connection_id = %connection_id,
        turns = session.turns_started(),
        unprocessed_bytes = session.buffered_bytes(),
        "WebSocket client disconnected"
    );
}

/// Dispatch inbound frames until the client closes the channel.
///
/// Binary frames are buffered. A stop signal claims the turn and takes the
/// buffered audio before the next frame is read, then runs the pipeline on
/// its own task so the next utterance keeps buffering meanwhile. Malformed
/// control frames are answered with an error envelope and the connection
/// stays open.
pub async fn read_loop<S: FrameSource>(
    source: &mut S,
    session: &Arc<Session>,
) -> Result<(), TransportError> {
    loop {
        match source.receive().await? {
            InboundFrame::Binary(data) => session.append_audio(data),
            InboundFrame::Text(text) => match ControlMessage::parse(&text) {
                Ok(ControlMessage::Stop) => {
                    if let Ok(turn) = session.begin_turn() {
                        tracing::debug!(
                            connection_id = %session.id(),
                            turn_id = %turn.turn_id(),
                            "turn dispatched"
                        );
                        tokio::spawn(turn.run());
                    }
                }
                Err(e) => {
                    tracing::warn!(connection_id = %session.id(), error = %e, "rejected control frame");
                    let _ = session.send_error(&AppError::from(e)).await;
                }
            },
            InboundFrame::Close => return Ok(()),
        }
    }
}

async fn write_loop(
    mut ws_tx: SplitSink<WebSocket, WsMessage>,
    mut rx: mpsc::Receiver<Outbound>,
    heartbeat: Duration,
    connection_id: ConnectionId,
) {
    let mut ping_interval = tokio::time::interval(heartbeat);
    ping_interval.tick().await; // first tick is immediate

    loop {
        tokio::select! {
            msg = rx.recv() => {
                let Some(msg) = msg else { break };
                let frame = match msg {
                    Outbound::Text(text) => WsMessage::Text(text.into()),
                    Outbound::Binary(data) => WsMessage::Binary(data),
                    Outbound::Close => {
                        let _ = ws_tx.send(WsMessage::Close(None)).await;
                        break;
                    }
                };
                if let Err(e) = ws_tx.send(frame).await {
                    tracing::debug!(connection_id = %connection_id, error = %e, "socket write failed");
                    break;
                }
            }
            _ = ping_interval.tick() => {
                if ws_tx.send(WsMessage::Ping(Default::default())).await.is_err() {
                    break;
                }
                tracing::trace!(connection_id = %connection_id, "sent ping");
            }
        }
    }
}
