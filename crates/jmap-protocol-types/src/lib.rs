//! JMAP wire types used by the client.
//!
//! This crate contains only data types and serialization — no I/O, no async,
//! no transport. Method argument and response shapes follow RFC 8620/8621;
//! push frames follow RFC 8887.

mod arguments;
mod invocation;
mod method_error;
mod push;
mod session;

pub use arguments::{
    ChangesArguments, ChangesResponse, Comparator, EmailImport, EmailImportArguments,
    EmailImportResponse, GetArguments, GetResponse, QueryArguments, QueryResponse, SetArguments,
    SetResponse, UploadResponse,
};
pub use invocation::{Invocation, MethodName, Request, Response, DEFAULT_CALL_ID, ERROR_MARKER};
pub use method_error::{ErrorType, MethodError, SetError};
pub use push::{AccountStates, EntityType, OutboundFrame, StateChange, STATE_CHANGE_TYPE};
pub use session::{
    Account, Capabilities, CoreCapability, Session, WebSocketCapability, WsTicketCapability,
    CORE_CAPABILITY, DEFAULT_USING, MAIL_CAPABILITY, SUBMISSION_CAPABILITY, WEBSOCKET_CAPABILITY,
    WS_TICKET_CAPABILITY,
};
