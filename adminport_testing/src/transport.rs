//! Recording transport for driving sessions in tests.

use std::{
    io,
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard},
};

use adminport::{
    codec::PacketCodec,
    packet::Packet,
    transport::{CloseProgress, Transport},
};
use bytes::Bytes;

#[derive(Debug, Default)]
struct Recorded {
    sent: Vec<Bytes>,
    close_calls: usize,
}

/// [`Transport`] that records everything a session writes.
///
/// Clones share their recording, so a test keeps one clone for assertions
/// and hands the other to the session.
#[derive(Clone, Debug)]
pub struct MockTransport {
    recorded: Arc<Mutex<Recorded>>,
    peer_addr: Option<SocketAddr>,
    close_progress: CloseProgress,
    fail_sends: bool,
}

impl MockTransport {
    /// Address reported by default.
    pub const DEFAULT_PEER: SocketAddr =
        SocketAddr::V4(std::net::SocketAddrV4::new(std::net::Ipv4Addr::LOCALHOST, 3977));

    /// A transport that accepts every send and closes synchronously.
    #[must_use]
    pub fn new() -> Self {
        Self {
            recorded: Arc::default(),
            peer_addr: Some(Self::DEFAULT_PEER),
            close_progress: CloseProgress::Closed,
            fail_sends: false,
        }
    }

    /// Report `progress` from every close request.
    #[must_use]
    pub fn with_close_progress(mut self, progress: CloseProgress) -> Self {
        self.close_progress = progress;
        self
    }

    /// Report `addr` as the peer address.
    #[must_use]
    pub fn with_peer_addr(mut self, addr: Option<SocketAddr>) -> Self {
        self.peer_addr = addr;
        self
    }

    /// Fail every send with `BrokenPipe`.
    #[must_use]
    pub fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    /// Raw byte chunks handed to [`Transport::send`], in order.
    #[must_use]
    pub fn sent_bytes(&self) -> Vec<Bytes> { self.recorded().sent.clone() }

    /// Sent chunks decoded as packets.
    ///
    /// # Panics
    ///
    /// Panics if a sent chunk is not exactly one valid packet.
    #[must_use]
    pub fn sent_packets(&self) -> Vec<Packet> {
        let codec = PacketCodec::default();
        self.recorded()
            .sent
            .iter()
            .map(|bytes| {
                let extracted = codec
                    .extract(bytes)
                    .expect("sent bytes decode")
                    .expect("sent bytes hold a complete packet");
                assert_eq!(extracted.consumed, bytes.len(), "one packet per send");
                extracted.packet
            })
            .collect()
    }

    /// Number of close requests received.
    #[must_use]
    pub fn close_calls(&self) -> usize { self.recorded().close_calls }

    fn recorded(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().expect("mock transport poisoned")
    }
}

impl Default for MockTransport {
    fn default() -> Self { Self::new() }
}

impl Transport for MockTransport {
    fn peer_addr(&self) -> Option<SocketAddr> { self.peer_addr }

    fn send(&mut self, bytes: Bytes) -> io::Result<()> {
        if self.fail_sends {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock send failure"));
        }
        self.recorded().sent.push(bytes);
        Ok(())
    }

    fn close(&mut self) -> io::Result<CloseProgress> {
        self.recorded().close_calls += 1;
        Ok(self.close_progress)
    }
}
