//! Push connection state machine using rust-fsm.
//!
//! ```text
//!   ┌──────┐  StartRequested   ┌────────────┐  SocketOpened  ┌──────┐
//!   │ Idle │ ────────────────► │ Connecting │ ─────────────► │ Open │
//!   └──────┘                   └────────────┘                └──────┘
//!      ▲   ◄──── ConnectFailed ──────┘                          │
//!      └───────────────── SocketClosed / SocketErrored ─────────┘
//! ```

use rust_fsm::*;

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub push_machine(Idle)

    Idle => {
        StartRequested => Connecting
    },
    Connecting => {
        SocketOpened => Open,
        ConnectFailed => Idle
    },
    Open => {
        SocketClosed => Idle,
        SocketErrored => Idle
    }
}

pub use push_machine::Input as PushMachineInput;
pub use push_machine::State as PushMachineState;
pub use push_machine::StateMachine as PushMachine;

/// Connection state as seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushState {
    /// No connection and no attempt in flight.
    Idle,
    /// Ticket exchange or WebSocket handshake in progress.
    Connecting,
    /// Socket open, state changes flowing.
    Open,
}

impl From<&PushMachineState> for PushState {
    fn from(state: &PushMachineState) -> Self {
        match state {
            PushMachineState::Idle => PushState::Idle,
            PushMachineState::Connecting => PushState::Connecting,
            PushMachineState::Open => PushState::Open,
        }
    }
}
