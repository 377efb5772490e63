use crate::actor::{DirectoryClient, DirectoryError};
use crate::directory::LocationRecord;
use crate::server::ServerShutdownHandle;
use crate::topology::ServerId;
use std::net::SocketAddr;

/// HerdServer is the running server. Dropping it stops the accept loop; connections already
/// being served run to completion.
pub struct HerdServer {
    pub(super) server_id: ServerId,
    pub(super) local_addr: SocketAddr,
    pub(super) directory: DirectoryClient,
    pub(super) shutdown_handle: ServerShutdownHandle,
}

impl HerdServer {
    pub fn server_id(&self) -> &ServerId {
        &self.server_id
    }

    /// Address the listener is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Latest location this server knows for `client_id`.
    pub async fn lookup(&self, client_id: &str) -> Result<Option<LocationRecord>, DirectoryError> {
        self.directory.lookup(client_id).await
    }

    pub fn shutdown(self) {
        self.shutdown_handle.shutdown();
    }
}
