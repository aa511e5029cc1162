//! Everything that talks to the external scanning engine
//!
//! The engine is opaque: requests are single text commands, replies are one
//! JSON array each, and at most one request may be in flight per session.
//! This module provides the command/reply codecs, the framed transport, the
//! single-flight serializer, and the match page streamer.

mod command;
mod conn;
mod response;
mod serializer;
mod stream;

pub mod transport;

pub use command::Command;
pub use conn::EngineConn;
pub use response::{AttachInfo, DumpReply, InfoReply, RawMatch, ReplyFrame};
pub use serializer::{CommandSerializer, EngineGuard};
pub use stream::fetch_matches;
pub use transport::EngineTransport;
