use crate::directory::LocationRecord;
use crate::gossip::message::UpdateMessage;
use crate::gossip::peer_client::PeerClient;
use crate::gossip::visited::VisitedSet;
use crate::topology::{MeshTopology, ServerId};
use rand::Rng;
use std::cmp;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum PropagationError {
    #[error("Timed out connecting to {0}")]
    ConnectTimeout(SocketAddr),
    #[error("Failed to connect to {0}: {1}")]
    Connect(SocketAddr, io::Error),
    #[error("Failed to send update to {0}: {1}")]
    Send(SocketAddr, io::Error),
}

/// How hard we try to reach one neighbor for one update.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RetryPolicy {
    pub(crate) connect_timeout: Duration,
    /// Total attempts, including the first. At least 1.
    pub(crate) attempts: usize,
    pub(crate) initial_backoff: Duration,
    pub(crate) max_backoff: Duration,
}

/// Which neighbors one fan-out reached. Both lists are sorted.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct PropagationSummary {
    pub(crate) delivered: Vec<ServerId>,
    pub(crate) failed: Vec<ServerId>,
}

/// Propagator floods accepted updates to this server's neighbors.
///
/// An update is never sent to a server already in its visited set, and every hop adds the
/// sender to that set. The set grows on each hop and the mesh is finite, so flooding
/// terminates and each server forwards a given update at most once.
#[derive(Clone)]
pub(crate) struct Propagator {
    logger: slog::Logger,
    my_server_id: ServerId,
    topology: Arc<MeshTopology>,
    retry: RetryPolicy,
}

impl Propagator {
    pub(crate) fn new(
        logger: slog::Logger,
        my_server_id: ServerId,
        topology: Arc<MeshTopology>,
        retry: RetryPolicy,
    ) -> Self {
        Propagator {
            logger,
            my_server_id,
            topology,
            retry,
        }
    }

    /// Neighbors of this server that haven't seen the update yet.
    pub(crate) fn targets(&self, visited: &VisitedSet) -> Vec<(ServerId, SocketAddr)> {
        self.topology
            .neighbors_of(&self.my_server_id)
            .filter(|neighbor| !visited.contains(neighbor))
            .filter_map(|neighbor| self.topology.addr_of(neighbor).map(|addr| (neighbor.clone(), addr)))
            .collect()
    }

    /// Forward `record` to every target concurrently and wait for all attempts to finish.
    /// Failures are logged per neighbor and never returned to the caller.
    pub(crate) async fn propagate(&self, record: LocationRecord, visited: VisitedSet) -> PropagationSummary {
        let mut summary = PropagationSummary::default();

        let targets = self.targets(&visited);
        if targets.is_empty() {
            slog::debug!(self.logger, "No neighbors left to notify"; "client" => &record.client_id);
            return summary;
        }

        let message = Arc::new(UpdateMessage {
            record,
            visited: visited.with(&self.my_server_id),
        });
        slog::debug!(
            self.logger,
            "Propagating update";
            "client" => &message.record.client_id,
            "visited" => message.visited.encode(),
            "fan_out" => targets.len()
        );

        let mut tasks = JoinSet::new();
        for (peer_id, addr) in targets {
            let message = message.clone();
            let retry = self.retry;
            let logger = self.logger.new(slog::o!("peer" => peer_id.to_string()));
            tasks.spawn(async move {
                let result = forward_with_retry(&logger, addr, &message, retry).await;
                (peer_id, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((peer_id, Ok(()))) => {
                    slog::debug!(self.logger, "Neighbor notified"; "peer" => %peer_id);
                    summary.delivered.push(peer_id);
                }
                Ok((peer_id, Err(e))) => {
                    slog::warn!(self.logger, "Failed to propagate update"; "peer" => %peer_id, "error" => %e);
                    summary.failed.push(peer_id);
                }
                Err(e) => {
                    slog::error!(self.logger, "Propagation task died: {}", e);
                }
            }
        }

        summary.delivered.sort();
        summary.failed.sort();
        summary
    }
}

async fn forward_with_retry(
    logger: &slog::Logger,
    addr: SocketAddr,
    message: &UpdateMessage,
    retry: RetryPolicy,
) -> Result<(), PropagationError> {
    let mut backoff = retry.initial_backoff;
    let mut attempt = 1;

    loop {
        let result = match PeerClient::connect(addr, retry.connect_timeout).await {
            Ok(peer) => peer.send_update(message).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => return Ok(()),
            Err(e) if attempt >= retry.attempts => return Err(e),
            Err(e) => {
                slog::debug!(logger, "Propagation attempt failed"; "attempt" => attempt, "error" => %e);
                let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..50));
                tokio::time::sleep(backoff + jitter).await;
                backoff = cmp::min(backoff * 2, retry.max_backoff);
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{Coordinates, Timestamp};
    use crate::topology::MemberInfo;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn test_logger() -> slog::Logger {
        slog::Logger::root(slog::Discard, slog::o!())
    }

    fn retry() -> RetryPolicy {
        RetryPolicy {
            connect_timeout: Duration::from_millis(500),
            attempts: 2,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
        }
    }

    fn record() -> LocationRecord {
        LocationRecord {
            client_id: "kiwi.cs.ucla.edu".to_string(),
            coordinates: Coordinates::parse("+34.068930-118.445127").unwrap(),
            reported_at: Timestamp::parse("1621464827.959498503").unwrap(),
        }
    }

    // Star topology with "A" at the center.
    fn star(addrs: &[(&str, SocketAddr)]) -> Arc<MeshTopology> {
        let mut members = vec![MemberInfo {
            id: "A".into(),
            addr: SocketAddr::from(([127, 0, 0, 1], 1)),
        }];
        let mut neighbors = vec![(ServerId::new("A"), Vec::new())];
        for (id, addr) in addrs {
            members.push(MemberInfo { id: (*id).into(), addr: *addr });
            neighbors[0].1.push(ServerId::new(*id));
            neighbors.push((ServerId::new(*id), vec![ServerId::new("A")]));
        }

        Arc::new(MeshTopology::new(members, neighbors).unwrap())
    }

    async fn unreachable_addr() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    }

    async fn listen_once() -> (SocketAddr, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut received = String::new();
            stream.read_to_string(&mut received).await.unwrap();
            received
        });

        (addr, handle)
    }

    #[test]
    fn targets_skip_visited() {
        let addr = SocketAddr::from(([127, 0, 0, 1], 2));
        let topology = star(&[
            ("B", addr),
            ("C", SocketAddr::from(([127, 0, 0, 1], 3))),
            ("Cc", SocketAddr::from(([127, 0, 0, 1], 4))),
        ]);
        let propagator = Propagator::new(test_logger(), "A".into(), topology, retry());

        let targets = propagator.targets(&VisitedSet::decode("C,Z").unwrap());
        let names: Vec<&str> = targets.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(names, vec!["B", "Cc"]);
        assert_eq!(targets[0].1, addr);
    }

    #[tokio::test]
    async fn forwards_to_unvisited_neighbors_only() {
        let (b_addr, b_received) = listen_once().await;
        let (c_addr, c_received) = listen_once().await;
        let d_addr = unreachable_addr().await;
        let e_addr = unreachable_addr().await;
        let topology = star(&[("B", b_addr), ("C", c_addr), ("D", d_addr), ("E", e_addr)]);
        let propagator = Propagator::new(test_logger(), "A".into(), topology, retry());

        let summary = propagator.propagate(record(), VisitedSet::decode("E").unwrap()).await;

        assert_eq!(summary.delivered, vec![ServerId::new("B"), ServerId::new("C")]);
        assert_eq!(summary.failed, vec![ServerId::new("D")]);

        let expected = "UPDATE kiwi.cs.ucla.edu +34.068930-118.445127 1621464827.959498503 A,E\n";
        assert_eq!(b_received.await.unwrap(), expected);
        assert_eq!(c_received.await.unwrap(), expected);
    }

    #[tokio::test]
    async fn nothing_to_do_when_all_neighbors_visited() {
        let topology = star(&[("B", SocketAddr::from(([127, 0, 0, 1], 2)))]);
        let propagator = Propagator::new(test_logger(), "A".into(), topology, retry());

        let summary = propagator.propagate(record(), VisitedSet::decode("B").unwrap()).await;
        assert_eq!(summary, PropagationSummary::default());
    }
}
