pub mod protocol;
pub mod framing;
pub mod outbox;
pub mod room_session;
pub mod tls;
pub mod transport;
