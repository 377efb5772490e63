use crate::actor::{DirectoryClient, DirectoryError};
use crate::directory::LocationRecord;
use crate::gossip::{VisitedSet, UPDATE_KEYWORD};
use crate::places::{PlacesProvider, PlacesQuery};
use crate::protocol::{self, NearbyQuery, Request, WallClock};
use crate::topology::ServerId;
use std::sync::Arc;

/// What the connection handler must do after a request has been processed: write `response`
/// (if any), close, then flood `propagate` (if any).
#[derive(Debug, PartialEq)]
pub(crate) struct Outcome {
    pub(crate) response: Option<String>,
    pub(crate) propagate: Option<(LocationRecord, VisitedSet)>,
}

impl Outcome {
    fn reply(response: String) -> Self {
        Outcome {
            response: Some(response),
            propagate: None,
        }
    }

    fn silent() -> Self {
        Outcome {
            response: None,
            propagate: None,
        }
    }
}

/// Dispatcher turns one request line into a reply and, for accepted updates, a propagation job.
pub(crate) struct Dispatcher {
    logger: slog::Logger,
    my_server_id: ServerId,
    directory: DirectoryClient,
    places: Arc<dyn PlacesProvider>,
    clock: Arc<dyn WallClock>,
}

impl Dispatcher {
    pub(crate) fn new(
        logger: slog::Logger,
        my_server_id: ServerId,
        directory: DirectoryClient,
        places: Arc<dyn PlacesProvider>,
        clock: Arc<dyn WallClock>,
    ) -> Self {
        Dispatcher {
            logger,
            my_server_id,
            directory,
            places,
            clock,
        }
    }

    /// Only fails if the directory actor is gone, which the caller treats as a server fault.
    pub(crate) async fn dispatch(&self, line: &str) -> Result<Outcome, DirectoryError> {
        let request = match Request::parse(line) {
            Ok(request) => request,
            Err(e) => {
                // Peers never get a reply, not even for garbage.
                if line.split_whitespace().next() == Some(UPDATE_KEYWORD) {
                    slog::warn!(self.logger, "Dropping malformed update"; "line" => line, "error" => %e);
                    return Ok(Outcome::silent());
                }
                slog::info!(self.logger, "Rejecting request"; "line" => line, "error" => %e);
                return Ok(Outcome::reply(protocol::rejection(line)));
            }
        };

        match request {
            Request::ReportLocation(record) => self.handle_report_location(record).await,
            Request::QueryNearby(query) => self.handle_query_nearby(line, query).await,
            Request::PropagatedUpdate(message) => self.handle_propagated_update(message.record, message.visited).await,
        }
    }

    async fn handle_report_location(&self, record: LocationRecord) -> Result<Outcome, DirectoryError> {
        self.directory.record_client_report(record.clone()).await?;

        let header = protocol::location_header(&self.my_server_id, self.clock.now_epoch_seconds(), &record);
        slog::info!(self.logger, "Accepted location report"; "client" => &record.client_id);

        Ok(Outcome {
            response: Some(header),
            propagate: Some((record, VisitedSet::new())),
        })
    }

    async fn handle_query_nearby(&self, line: &str, query: NearbyQuery) -> Result<Outcome, DirectoryError> {
        let record = match self.directory.lookup(&query.client_id).await? {
            Some(record) => record,
            None => {
                slog::info!(self.logger, "Query for unknown client"; "client" => &query.client_id);
                return Ok(Outcome::reply(protocol::rejection(line)));
            }
        };

        let places_query = PlacesQuery {
            latitude: record.coordinates.latitude(),
            longitude: record.coordinates.longitude(),
            radius_km: query.radius_km,
            max_results: query.max_results,
        };
        let payload = match self.places.nearby(places_query).await {
            Ok(mut places) => {
                places.truncate(query.max_results);
                places.to_wire()
            }
            Err(e) => Err(e),
        };
        let payload = match payload {
            Ok(payload) => payload,
            Err(e) => {
                slog::warn!(self.logger, "Places query failed"; "client" => &query.client_id, "error" => %e);
                return Ok(Outcome::reply(protocol::rejection(line)));
            }
        };

        let header = protocol::location_header(&self.my_server_id, self.clock.now_epoch_seconds(), &record);
        Ok(Outcome::reply(protocol::nearby_reply(&header, &payload)))
    }

    async fn handle_propagated_update(
        &self,
        record: LocationRecord,
        visited: VisitedSet,
    ) -> Result<Outcome, DirectoryError> {
        let outcome = self.directory.apply_peer_update(record.clone()).await?;
        if !outcome.is_applied() {
            slog::debug!(self.logger, "Ignoring update"; "client" => &record.client_id, "outcome" => ?outcome);
            return Ok(Outcome::silent());
        }

        slog::info!(
            self.logger,
            "Applied propagated update";
            "client" => &record.client_id,
            "visited" => visited.encode()
        );
        Ok(Outcome {
            response: None,
            propagate: Some((record, visited)),
        })
    }
}
