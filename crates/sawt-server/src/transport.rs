//! The bidirectional client channel as seen by a session.
//!
//! Outbound traffic goes through [`Transport`]; the production adapter is a
//! bounded queue drained by the connection's writer task, so concurrent sends
//! from one turn are safe. Inbound traffic is read through [`FrameSource`].

use async_trait::async_trait;
use axum::extract::ws::{Message as WsMessage, WebSocket};
use bytes::Bytes;
use futures::stream::SplitStream;
use futures::StreamExt;
use tokio::sync::mpsc;

use sawt_core::errors::TransportError;

/// A frame queued for the client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    Binary(Bytes),
    /// Ask the writer to send a close frame and stop.
    Close,
}

/// A frame received from the client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundFrame {
    Binary(Bytes),
    Text(String),
    Close,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a JSON envelope as a text frame.
    async fn send_text(&self, text: String) -> Result<(), TransportError>;

    async fn send_binary(&self, data: Bytes) -> Result<(), TransportError>;

    /// Close the channel from the server side.
    async fn close(&self) -> Result<(), TransportError>;
}

#[async_trait]
pub trait FrameSource: Send {
    /// Next inbound frame. A finished stream reports `Close`.
    async fn receive(&mut self) -> Result<InboundFrame, TransportError>;
}

/// Transport backed by the connection's outbound queue.
#[derive(Clone)]
pub struct ChannelTransport {
    tx: mpsc::Sender<Outbound>,
}

impl ChannelTransport {
    pub fn new(tx: mpsc::Sender<Outbound>) -> Self {
        Self { tx }
    }

    /// A transport plus the receiving end of its queue.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send_text(&self, text: String) -> Result<(), TransportError> {
        self.tx
            .send(Outbound::Text(text))
            .await
            .map_err(|_| TransportError::Closed)
    }

    async fn send_binary(&self, data: Bytes) -> Result<(), TransportError> {
        self.tx
            .send(Outbound::Binary(data))
            .await
            .map_err(|_| TransportError::Closed)
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.tx
            .send(Outbound::Close)
            .await
            .map_err(|_| TransportError::Closed)
    }
}

/// Read half of an axum WebSocket.
pub struct WsFrameSource {
    inner: SplitStream<WebSocket>,
}

impl WsFrameSource {
    pub fn new(inner: SplitStream<WebSocket>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl FrameSource for WsFrameSource {
    async fn receive(&mut self) -> Result<InboundFrame, TransportError> {
        loop {
            match self.inner.next().await {
                Some(Ok(WsMessage::Binary(data))) => return Ok(InboundFrame::Binary(data)),
                Some(Ok(WsMessage::Text(text))) => {
                    return Ok(InboundFrame::Text(text.as_str().to_owned()));
                }
                Some(Ok(WsMessage::Close(_))) | None => return Ok(InboundFrame::Close),
                // axum answers pings itself
                Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_))) => {}
                Some(Err(e)) => return Err(TransportError::Receive(e.to_string())),
            }
        }
    }
}
