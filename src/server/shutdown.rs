use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// The accept loop stops once the handle is dropped or `shutdown()` is called.
pub(crate) fn shutdown_signal() -> (ServerShutdownHandle, ServerShutdownSignal) {
    let (tx, rx) = oneshot::channel();

    (ServerShutdownHandle { tx }, ServerShutdownSignal { rx })
}

pub(crate) struct ServerShutdownHandle {
    tx: oneshot::Sender<()>,
}

impl ServerShutdownHandle {
    pub(crate) fn shutdown(self) {
        let _ = self.tx.send(());
    }
}

pub(crate) struct ServerShutdownSignal {
    rx: oneshot::Receiver<()>,
}

impl Future for ServerShutdownSignal {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let rx = Pin::new(&mut self.rx);

        match rx.poll(cx) {
            Poll::Pending => Poll::Pending,
            // We don't care if oneshot Sender sent value or dropped
            Poll::Ready(_) => Poll::Ready(()),
        }
    }
}
