use crate::directory::{LocationDirectory, LocationRecord, StoreOutcome};
use std::fmt::Debug;
use tokio::sync::{mpsc, oneshot};

pub(crate) fn create<D>(logger: slog::Logger, buffer_size: usize, directory: D) -> (DirectoryClient, DirectoryActor<D>)
where
    D: LocationDirectory,
{
    let (tx, rx) = mpsc::channel(buffer_size);
    let client = DirectoryClient { sender: tx };
    let actor = DirectoryActor {
        logger,
        receiver: rx,
        directory,
    };

    (client, actor)
}

// The directory is owned by exactly one task. Every read-check-write on it is a single event,
// so concurrent connections can't interleave inside the monotonic update rule.
#[derive(Debug)]
enum Event {
    Lookup(String, Callback<Option<LocationRecord>>),
    ClientReport(LocationRecord, Callback<()>),
    PeerUpdate(LocationRecord, Callback<StoreOutcome>),
}

#[derive(Debug)]
struct Callback<O: Debug>(oneshot::Sender<O>);

impl<O: Debug> Callback<O> {
    fn send(self, message: O) {
        // Requester may have gone away (e.g. connection dropped). Nothing to do.
        let _ = self.0.send(message);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Directory actor is dead RIP")]
    ActorExited,
}

#[derive(Clone)]
pub(crate) struct DirectoryClient {
    sender: mpsc::Sender<Event>,
}

impl DirectoryClient {
    pub(crate) async fn lookup(&self, client_id: &str) -> Result<Option<LocationRecord>, DirectoryError> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::Lookup(client_id.to_string(), Callback(tx))).await?;

        rx.await.map_err(|_| DirectoryError::ActorExited)
    }

    pub(crate) async fn record_client_report(&self, record: LocationRecord) -> Result<(), DirectoryError> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::ClientReport(record, Callback(tx))).await?;

        rx.await.map_err(|_| DirectoryError::ActorExited)
    }

    pub(crate) async fn apply_peer_update(&self, record: LocationRecord) -> Result<StoreOutcome, DirectoryError> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::PeerUpdate(record, Callback(tx))).await?;

        rx.await.map_err(|_| DirectoryError::ActorExited)
    }

    async fn send(&self, event: Event) -> Result<(), DirectoryError> {
        self.sender.send(event).await.map_err(|_| DirectoryError::ActorExited)
    }
}

/// DirectoryActor is the directory store in actor model.
pub(crate) struct DirectoryActor<D: LocationDirectory> {
    logger: slog::Logger,
    receiver: mpsc::Receiver<Event>,
    directory: D,
}

impl<D: LocationDirectory> DirectoryActor<D> {
    pub(crate) async fn run_event_loop(mut self) {
        while let Some(event) = self.receiver.recv().await {
            self.handle_event(event);
        }
        slog::debug!(self.logger, "All directory clients dropped. Actor exiting.");
    }

    // This must NOT be async.
    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Lookup(client_id, callback) => {
                callback.send(self.directory.lookup(&client_id));
            }
            Event::ClientReport(record, callback) => {
                slog::debug!(
                    self.logger,
                    "Client report";
                    "client" => &record.client_id,
                    "reported_at" => %record.reported_at
                );
                self.directory.store_client_report(record);
                callback.send(());
            }
            Event::PeerUpdate(record, callback) => {
                let client_id = record.client_id.clone();
                let outcome = self.directory.store_if_newer(record);
                slog::debug!(self.logger, "Peer update"; "client" => client_id, "outcome" => ?outcome);
                callback.send(outcome);
            }
        }
    }
}
