//! JMAP WebSocket push (RFC 8887) with ticket authentication.
//!
//! # Architecture
//!
//! ```text
//! start() ─► ticket POST ─► ws(s)://push?ticket=… ─► reader task
//!                                                        │ StateChange
//!                                 ┌──────────────────────┼──────────────────┐
//!                                 ▼                      ▼                  ▼
//!                          mailbox() stream        email() stream   email_submission()
//! ```
//!
//! - One connection per [`PushMultiplexer`]; concurrent `start()` calls share it.
//! - The first poll of a stream for a new entity type re-sends the
//!   cumulative `WebSocketPushEnable` frame.
//! - Close completes every stream; an error is yielded to every stream, then
//!   they complete. The subscription set is cleared in both cases.
//! - `stop()` resets to Idle immediately; a following `start()` opens a new
//!   socket even while the old one is still closing.

mod error;
mod fsm;
mod multiplexer;

pub use error::{PushError, PushResult};
pub use fsm::{push_machine, PushMachine, PushMachineInput, PushMachineState, PushState};
pub use multiplexer::{EntityStream, PushEvent, PushMultiplexer};

#[cfg(test)]
mod tests;
