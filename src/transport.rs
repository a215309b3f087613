//! Capability interface a session needs from its connection.
//!
//! The session never performs I/O itself. It hands encoded packets to a
//! [`Transport`] and is told about incoming bytes and closure through
//! [`Session::receive`](crate::session::Session::receive) and
//! [`Session::on_transport_closed`](crate::session::Session::on_transport_closed).

use std::{io, net::SocketAddr};

use bytes::Bytes;

/// Whether a transport finished closing synchronously.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseProgress {
    /// The transport is closed; no closure event will follow.
    Closed,
    /// Closing has started; the owner reports completion through
    /// [`Session::on_transport_closed`](crate::session::Session::on_transport_closed).
    Pending,
}

/// Byte-level connection used by a [`Session`](crate::session::Session).
pub trait Transport {
    /// Address of the remote end, if the transport has one.
    fn peer_addr(&self) -> Option<SocketAddr>;

    /// Queue `bytes` for transmission.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport can no longer send.
    fn send(&mut self, bytes: Bytes) -> io::Result<()>;

    /// Begin closing the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the close request could not be issued.
    fn close(&mut self) -> io::Result<CloseProgress>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn peer_addr(&self) -> Option<SocketAddr> { (**self).peer_addr() }

    fn send(&mut self, bytes: Bytes) -> io::Result<()> { (**self).send(bytes) }

    fn close(&mut self) -> io::Result<CloseProgress> { (**self).close() }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn peer_addr(&self) -> Option<SocketAddr> { (**self).peer_addr() }

    fn send(&mut self, bytes: Bytes) -> io::Result<()> { (**self).send(bytes) }

    fn close(&mut self) -> io::Result<CloseProgress> { (**self).close() }
}
