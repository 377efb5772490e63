use crate::gossip::message::UpdateMessage;
use crate::gossip::propagator::PropagationError;
use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::Duration;

/// PeerClient is a one-shot connection to a neighbor: connect, write one `UPDATE`, close.
/// The receiving side never replies.
pub(crate) struct PeerClient {
    addr: SocketAddr,
    stream: TcpStream,
}

impl PeerClient {
    pub(crate) async fn connect(addr: SocketAddr, connect_timeout: Duration) -> Result<Self, PropagationError> {
        let stream = tokio::time::timeout(connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| PropagationError::ConnectTimeout(addr))?
            .map_err(|e| PropagationError::Connect(addr, e))?;

        Ok(PeerClient { addr, stream })
    }

    pub(crate) async fn send_update(mut self, message: &UpdateMessage) -> Result<(), PropagationError> {
        let addr = self.addr;
        self.stream
            .write_all(&message.encode())
            .await
            .map_err(|e| PropagationError::Send(addr, e))?;
        self.stream
            .shutdown()
            .await
            .map_err(|e| PropagationError::Send(addr, e))?;

        Ok(())
    }
}
