//! Push multiplexer tests against a local WebSocket server.
//!
//! - `harness.rs`      - mock push server, ticket transport, test harness
//! - `connection.rs`   - shared start, tickets, stop and restart
//! - `subscription.rs` - initial and cumulative enable frames, reset
//! - `fanout.rs`       - per-entity-type delivery, ordering, termination

mod connection;
pub(crate) mod harness;
