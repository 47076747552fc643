//! Service layer: business logic shared by the websocket dispatcher and
//! REST routes. Handlers validate and call into here; services own the
//! database queries and the live in-memory state transitions.

pub mod message;
pub mod presence;
pub mod room;
pub mod session;
pub mod typing;
