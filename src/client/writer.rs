//! Socket writer task and the channel transport that feeds it.

use std::{io, net::SocketAddr};

use bytes::Bytes;
use futures::SinkExt;
use tokio::{io::AsyncWrite, sync::mpsc};
use tokio_util::codec::{BytesCodec, FramedWrite};

use crate::transport::{CloseProgress, Transport};

#[derive(Debug)]
pub(crate) enum WriterCommand {
    Frame(Bytes),
    Shutdown,
}

/// [`Transport`] that hands encoded packets to a writer task.
///
/// Sends never block. Closing queues a write-side shutdown behind any
/// frames already queued and reports [`CloseProgress::Pending`]; the read
/// side observes the server closing in response.
#[derive(Debug)]
pub struct ChannelTransport {
    peer_addr: SocketAddr,
    tx: mpsc::UnboundedSender<WriterCommand>,
}

impl ChannelTransport {
    pub(crate) fn new(peer_addr: SocketAddr, tx: mpsc::UnboundedSender<WriterCommand>) -> Self {
        Self { peer_addr, tx }
    }
}

impl Transport for ChannelTransport {
    fn peer_addr(&self) -> Option<SocketAddr> { Some(self.peer_addr) }

    fn send(&mut self, bytes: Bytes) -> io::Result<()> {
        self.tx
            .send(WriterCommand::Frame(bytes))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "socket writer has stopped"))
    }

    fn close(&mut self) -> io::Result<CloseProgress> {
        if self.tx.send(WriterCommand::Shutdown).is_err() {
            return Ok(CloseProgress::Closed);
        }
        Ok(CloseProgress::Pending)
    }
}

/// Write queued frames until shutdown is requested or every sender is
/// gone, then flush and shut down the write half.
pub(crate) async fn write_frames<W>(
    writer: W,
    mut rx: mpsc::UnboundedReceiver<WriterCommand>,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut sink = FramedWrite::new(writer, BytesCodec::new());
    while let Some(command) = rx.recv().await {
        match command {
            WriterCommand::Frame(bytes) => {
                if let Err(err) = sink.send(bytes).await {
                    log::warn!("failed to write frame: {err}");
                    return Err(err);
                }
            }
            WriterCommand::Shutdown => break,
        }
    }
    SinkExt::<Bytes>::close(&mut sink).await?;
    log::debug!("socket writer finished");
    Ok(())
}
