//! WebSocket voice-chat server: per-connection audio buffering, the
//! transcribe/respond/synthesize turn pipeline, and connection bookkeeping.

pub mod buffer;
pub mod connection;
pub mod registry;
pub mod server;
pub mod session;
pub mod transport;

pub use buffer::FrameBuffer;
pub use connection::ConnectionOptions;
pub use registry::ConnectionRegistry;
pub use server::{build_router, start, ApiError, AppState, ServerConfig, ServerHandle};
pub use session::{Session, TurnOutcome, TurnState};
pub use transport::{ChannelTransport, FrameSource, InboundFrame, Outbound, Transport, WsFrameSource};
