//! This mod is responsible for configuring and starting one `HerdServer`.

use crate::actor;
use crate::api::handle::HerdServer;
use crate::api::options::{HerdOptions, HerdOptionsValidated};
use crate::directory::VolatileDirectory;
use crate::gossip::{Propagator, RetryPolicy};
use crate::places::PlacesProvider;
use crate::protocol::{SystemClock, WallClock};
use crate::server::{self, ConnectionLimits, Dispatcher, HerdTcpServer};
use crate::topology::{MeshTopology, ServerId};
use std::convert::TryFrom;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct HerdServerConfig {
    pub my_server_id: String,
    pub topology: MeshTopology,
    pub places: Arc<dyn PlacesProvider>,
    pub info_logger: slog::Logger,
    pub options: HerdOptions,
}

#[derive(Debug, thiserror::Error)]
pub enum HerdServerCreationError {
    #[error("Illegal options for configuring server: {0}")]
    IllegalServerOptions(String),
    #[error("Server {0:?} is not in the mesh topology")]
    MeNotInMesh(String),
    #[error("Failed to bind {0}: {1}")]
    Bind(SocketAddr, io::Error),
}

/// Bind the listener, start the directory actor and the accept loop. Failing to bind is fatal
/// for the caller; everything after that is served best-effort.
pub async fn try_create_herd_server(config: HerdServerConfig) -> Result<HerdServer, HerdServerCreationError> {
    try_create_herd_server_with_clock(config, Arc::new(SystemClock)).await
}

pub(crate) async fn try_create_herd_server_with_clock(
    config: HerdServerConfig,
    clock: Arc<dyn WallClock>,
) -> Result<HerdServer, HerdServerCreationError> {
    let my_server_id = ServerId::new(config.my_server_id);
    let root_logger = config.info_logger;

    let options = HerdOptionsValidated::try_from(config.options)
        .map_err(|e| HerdServerCreationError::IllegalServerOptions(e.to_string()))?;

    let my_addr = config
        .topology
        .addr_of(&my_server_id)
        .ok_or_else(|| HerdServerCreationError::MeNotInMesh(my_server_id.to_string()))?;

    let listener = TcpListener::bind(my_addr)
        .await
        .map_err(|e| HerdServerCreationError::Bind(my_addr, e))?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| HerdServerCreationError::Bind(my_addr, e))?;

    let (directory_client, directory_actor) = actor::create(
        root_logger.clone(),
        options.directory_queue_size,
        VolatileDirectory::new(options.seen_update_capacity),
    );
    tokio::spawn(directory_actor.run_event_loop());

    let propagator = Propagator::new(
        root_logger.clone(),
        my_server_id.clone(),
        Arc::new(config.topology),
        RetryPolicy {
            connect_timeout: options.propagation_connect_timeout,
            attempts: options.propagation_attempts,
            initial_backoff: options.propagation_initial_backoff,
            max_backoff: options.propagation_max_backoff,
        },
    );
    let dispatcher = Dispatcher::new(
        root_logger.clone(),
        my_server_id.clone(),
        directory_client.clone(),
        config.places,
        clock,
    );
    let limits = ConnectionLimits {
        read_timeout: options.request_read_timeout,
        max_line_length: options.max_request_line_length,
    };

    let (shutdown_handle, shutdown_signal) = server::shutdown_signal();
    let tcp_server = HerdTcpServer::new(root_logger, dispatcher, propagator, limits);
    tokio::spawn(tcp_server.run(listener, shutdown_signal));

    Ok(HerdServer {
        server_id: my_server_id,
        local_addr,
        directory: directory_client,
        shutdown_handle,
    })
}
