use crate::actor::DirectoryError;
use crate::gossip::Propagator;
use crate::server::dispatcher::Dispatcher;
use crate::server::ServerShutdownSignal;
use futures::StreamExt;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::Duration;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};

#[derive(Clone, Copy, Debug)]
pub(crate) struct ConnectionLimits {
    pub(crate) read_timeout: Duration,
    pub(crate) max_line_length: usize,
}

#[derive(Debug, thiserror::Error)]
enum ConnectionError {
    #[error("Timed out waiting for a request line")]
    ReadTimeout,
    #[error("Request line longer than {0} bytes")]
    LineTooLong(usize),
    #[error("Socket failure: {0}")]
    Io(io::Error),
    #[error("Server fault: {0}")]
    Directory(DirectoryError),
}

/// HerdTcpServer accepts connections and serves exactly one request line on each.
pub(crate) struct HerdTcpServer {
    logger: slog::Logger,
    dispatcher: Arc<Dispatcher>,
    propagator: Propagator,
    limits: ConnectionLimits,
}

impl HerdTcpServer {
    pub(crate) fn new(
        logger: slog::Logger,
        dispatcher: Dispatcher,
        propagator: Propagator,
        limits: ConnectionLimits,
    ) -> Self {
        HerdTcpServer {
            logger,
            dispatcher: Arc::new(dispatcher),
            propagator,
            limits,
        }
    }

    pub(crate) async fn run(self, listener: TcpListener, mut shutdown_signal: ServerShutdownSignal) {
        match listener.local_addr() {
            Ok(addr) => slog::info!(self.logger, "Listening on '{}'", addr),
            Err(e) => slog::warn!(self.logger, "Listening on unknown address: {}", e),
        }

        loop {
            tokio::select! {
                _ = &mut shutdown_signal => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer_addr)) => self.spawn_connection(stream, peer_addr),
                    // One bad accept (e.g. the peer reset before we got to it) must not take the
                    // server down.
                    Err(e) => slog::warn!(self.logger, "Failed to accept connection: {}", e),
                },
            }
        }

        slog::info!(self.logger, "Server run() has exited");
    }

    fn spawn_connection(&self, stream: TcpStream, peer_addr: SocketAddr) {
        let handler = ConnectionHandler {
            logger: self.logger.new(slog::o!("remote" => peer_addr.to_string())),
            dispatcher: self.dispatcher.clone(),
            propagator: self.propagator.clone(),
            limits: self.limits,
        };

        tokio::spawn(async move {
            if let Err(e) = handler.handle(stream).await {
                slog::warn!(handler.logger, "Connection closed with error: {}", e);
            }
        });
    }
}

struct ConnectionHandler {
    logger: slog::Logger,
    dispatcher: Arc<Dispatcher>,
    propagator: Propagator,
    limits: ConnectionLimits,
}

impl ConnectionHandler {
    // AWAIT_LINE -> PARSE/DISPATCH -> RESPOND -> CLOSE, then flood if the request produced an
    // accepted update. Propagation happens even if the reply could not be written.
    async fn handle(&self, stream: TcpStream) -> Result<(), ConnectionError> {
        let (reader, writer) = stream.into_split();
        let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(self.limits.max_line_length));

        let line = match tokio::time::timeout(self.limits.read_timeout, lines.next()).await {
            Err(_) => return Err(ConnectionError::ReadTimeout),
            Ok(None) => {
                slog::debug!(self.logger, "Connection closed before sending a request");
                return Ok(());
            }
            Ok(Some(Err(LinesCodecError::MaxLineLengthExceeded))) => {
                return Err(ConnectionError::LineTooLong(self.limits.max_line_length))
            }
            Ok(Some(Err(LinesCodecError::Io(e)))) => return Err(ConnectionError::Io(e)),
            Ok(Some(Ok(line))) => line,
        };
        slog::debug!(self.logger, "Received request"; "line" => &line);

        let outcome = self
            .dispatcher
            .dispatch(&line)
            .await
            .map_err(ConnectionError::Directory)?;

        let write_result = Self::respond(writer, outcome.response.as_deref()).await;
        drop(lines);

        if let Some((record, visited)) = outcome.propagate {
            self.propagator.propagate(record, visited).await;
        }

        write_result
    }

    async fn respond(mut writer: OwnedWriteHalf, response: Option<&str>) -> Result<(), ConnectionError> {
        if let Some(response) = response {
            writer
                .write_all(response.as_bytes())
                .await
                .map_err(ConnectionError::Io)?;
        }
        writer.shutdown().await.map_err(ConnectionError::Io)
    }
}
