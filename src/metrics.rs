//! Metric helpers for `adminport`.
//!
//! Metric names and thin wrappers around the
//! [`metrics`](https://docs.rs/metrics) macros. With the `metrics` feature
//! disabled every helper compiles to a no-op.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Name of the gauge tracking sessions with an attached transport.
pub const SESSIONS_ACTIVE: &str = "adminport_sessions_active";
/// Name of the counter tracking routed and sent packets.
pub const PACKETS_PROCESSED: &str = "adminport_packets_processed_total";
/// Name of the counter tracking session failures.
pub const ERRORS_TOTAL: &str = "adminport_errors_total";

/// Direction of packet processing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Packets received from the server.
    Inbound,
    /// Packets sent to the server.
    Outbound,
}

impl Direction {
    /// Label value used for this direction.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Increment the active sessions gauge.
pub fn inc_sessions() {
    #[cfg(feature = "metrics")]
    gauge!(SESSIONS_ACTIVE).increment(1.0);
}

/// Decrement the active sessions gauge.
pub fn dec_sessions() {
    #[cfg(feature = "metrics")]
    gauge!(SESSIONS_ACTIVE).decrement(1.0);
}

/// Record a processed packet for the given direction.
pub fn inc_packets(direction: Direction) {
    #[cfg(feature = "metrics")]
    counter!(PACKETS_PROCESSED, "direction" => direction.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = direction;
}

/// Record an error of the given kind.
pub fn inc_errors(kind: &'static str) {
    #[cfg(feature = "metrics")]
    counter!(ERRORS_TOTAL, "kind" => kind).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = kind;
}
