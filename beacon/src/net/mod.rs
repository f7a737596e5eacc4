//! Transport plumbing for the guidance protocol: buffering, framing, the
//! per-connection channel and the listener.

pub mod buffer;
pub mod channel;
pub mod endpoint;
pub mod frame;
