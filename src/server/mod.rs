mod dispatcher;
mod server;
mod shutdown;

pub(crate) use dispatcher::Dispatcher;
pub(crate) use server::ConnectionLimits;
pub(crate) use server::HerdTcpServer;
pub(crate) use shutdown::shutdown_signal;
pub(crate) use shutdown::ServerShutdownHandle;
pub(crate) use shutdown::ServerShutdownSignal;
