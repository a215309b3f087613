//! Test utilities for `adminport`.
//!
//! A recording [`MockTransport`] for driving a
//! [`Session`](adminport::session::Session) without sockets, builders for
//! wire bytes, helpers for splitting a byte stream into arbitrary chunks,
//! a scripted TCP [`FakeServer`] and a shared `logtest` logger fixture.
//!
//! ```rust
//! use adminport::{packet::ServerDate, session::Session};
//! use adminport_testing::{MockTransport, frame};
//!
//! let transport = MockTransport::new();
//! let mut session: Session<MockTransport> = Session::builder().build();
//! session.connect(transport.clone()).expect("connect");
//! assert_eq!(session.receive(&frame(ServerDate { date: 1 })).expect("receive"), 1);
//! assert!(transport.sent_packets().is_empty());
//! ```

pub mod chunks;
pub mod frames;
pub mod logging;
pub mod server;
pub mod transport;

pub use chunks::{chunk_by, single_bytes};
pub use frames::{concat_frames, frame, raw_frame};
pub use logging::{LoggerHandle, logger};
pub use server::FakeServer;
pub use transport::MockTransport;
