//! The publishing side of an RTMP conversation once the handshake is done.
//!
//! A [`Session`] holds what must survive across connections (where to publish and how far into
//! the container the stream has got) along with the per-connection values the server hands
//! out.  [`CommandSession`] walks a fresh connection through `connect`, `createStream` and
//! `publish`.

mod command_session;
mod errors;
mod session;

pub use self::command_session::CommandSession;
pub use self::errors::CommandError;
pub use self::session::{Session, DEFAULT_STREAM_ID};
