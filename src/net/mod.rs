//! TCP transport, wire protocol, and broadcast fan-out

pub mod broadcast;
pub mod protocol;
pub mod session;
