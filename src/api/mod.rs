pub mod client;
pub mod models;
pub mod response;
pub mod sse;
pub mod streaming;

pub use client::{ByteStream, ChatReply, ChatTransport, HttpTransport};
pub use models::{ChatRequest, ReplyMessage};
pub use sse::{frame_stream, SseFrame, SseParser};
