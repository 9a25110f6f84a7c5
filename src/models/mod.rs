mod message;
mod session;
mod trace;

pub use message::{Author, Message};
pub use session::{Agent, Session};
pub use trace::{ToolPhase, ToolTrace, TraceEvent};
