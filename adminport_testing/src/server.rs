//! Scripted admin port server for client runtime tests.

use std::{io, net::SocketAddr};

use adminport::{
    codec::PacketCodec,
    packet::{Packet, ServerProtocol, ServerWelcome},
};
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;

/// A TCP listener that accepts one client and speaks admin packets.
#[derive(Debug)]
pub struct FakeServer {
    listener: TcpListener,
    conn: Option<Framed<TcpStream, PacketCodec>>,
}

impl FakeServer {
    /// Bind to an ephemeral loopback port.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot bind.
    pub async fn bind() -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        Ok(Self {
            listener,
            conn: None,
        })
    }

    /// Address clients should connect to.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener has no local address.
    pub fn addr(&self) -> io::Result<SocketAddr> { self.listener.local_addr() }

    /// Accept the next client.
    ///
    /// # Errors
    ///
    /// Returns an error if accepting fails.
    pub async fn accept(&mut self) -> io::Result<()> {
        let (stream, _) = self.listener.accept().await?;
        self.conn = Some(Framed::new(stream, PacketCodec::default()));
        Ok(())
    }

    /// Read the next packet, or `None` once the client closed its side.
    ///
    /// # Errors
    ///
    /// Returns an error if no client is connected or the bytes do not decode.
    pub async fn recv(&mut self) -> io::Result<Option<Packet>> {
        self.conn_mut()?.next().await.transpose()
    }

    /// Send `packet` to the client.
    ///
    /// # Errors
    ///
    /// Returns an error if no client is connected or the write fails.
    pub async fn send(&mut self, packet: impl Into<Packet>) -> io::Result<()> {
        self.conn_mut()?.send(packet.into()).await
    }

    /// Send the protocol and welcome packets that complete authentication.
    ///
    /// # Errors
    ///
    /// Returns an error if either write fails.
    pub async fn welcome(&mut self, server_name: &str) -> io::Result<()> {
        self.send(ServerProtocol::default()).await?;
        self.send(ServerWelcome {
            server_name: server_name.to_owned(),
            ..ServerWelcome::default()
        })
        .await
    }

    /// Write raw bytes, bypassing the codec.
    ///
    /// # Errors
    ///
    /// Returns an error if no client is connected or the write fails.
    pub async fn send_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        use tokio::io::AsyncWriteExt;

        let stream = self.conn_mut()?.get_mut();
        stream.write_all(bytes).await?;
        stream.flush().await
    }

    /// Drop the client connection.
    pub fn hang_up(&mut self) { self.conn = None; }

    fn conn_mut(&mut self) -> io::Result<&mut Framed<TcpStream, PacketCodec>> {
        self.conn
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "no client accepted"))
    }
}
