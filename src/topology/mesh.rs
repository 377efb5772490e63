use crate::topology::peers::{MemberInfo, ServerId};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::net::SocketAddr;
use std::path::Path;
use std::{fs, io};

/// MeshTopology is the static description of the herd: every member's address and the
/// undirected neighbor graph used for flooding. It is built once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct MeshTopology {
    members: HashMap<ServerId, SocketAddr>,
    neighbors: HashMap<ServerId, BTreeSet<ServerId>>,
}

#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error("Failed to read topology file: {0}")]
    Io(io::Error),
    #[error("Malformed topology file: {0}")]
    Json(serde_json::Error),
    #[error("Server ID {0:?} must be non-empty and free of whitespace and commas")]
    IllegalServerId(String),
    #[error("Server {0} is declared more than once")]
    DuplicateMember(ServerId),
    #[error("Servers {0} and {1} are both bound to {2}")]
    DuplicateAddress(ServerId, ServerId, SocketAddr),
    #[error("Server {0} is not a mesh member")]
    UnknownMember(ServerId),
    #[error("Server {0} lists itself as a neighbor")]
    SelfNeighbor(ServerId),
    #[error("{0} lists {1} as a neighbor, but {1} does not list {0}")]
    AsymmetricNeighbors(ServerId, ServerId),
}

// On-disk format.
#[derive(Deserialize)]
struct TopologyFile {
    members: Vec<MemberEntry>,
    #[serde(default)]
    neighbors: HashMap<String, Vec<String>>,
}

#[derive(Deserialize)]
struct MemberEntry {
    id: String,
    addr: SocketAddr,
}

impl MeshTopology {
    /// Validate and build the topology. The neighbor graph must be symmetric: one-directional
    /// gossip is rejected here rather than silently tolerated at runtime.
    pub fn new<I>(members: Vec<MemberInfo>, neighbors: I) -> Result<Self, TopologyError>
    where
        I: IntoIterator<Item = (ServerId, Vec<ServerId>)>,
    {
        let mut member_addrs: HashMap<ServerId, SocketAddr> = HashMap::with_capacity(members.len());
        let mut addr_owners: HashMap<SocketAddr, ServerId> = HashMap::with_capacity(members.len());
        for member in members {
            if !member.id.is_wire_safe() {
                return Err(TopologyError::IllegalServerId(member.id.into_inner()));
            }
            if member_addrs.contains_key(&member.id) {
                return Err(TopologyError::DuplicateMember(member.id));
            }
            if let Some(owner) = addr_owners.get(&member.addr) {
                return Err(TopologyError::DuplicateAddress(owner.clone(), member.id, member.addr));
            }
            addr_owners.insert(member.addr, member.id.clone());
            member_addrs.insert(member.id, member.addr);
        }

        let mut graph: HashMap<ServerId, BTreeSet<ServerId>> =
            member_addrs.keys().map(|id| (id.clone(), BTreeSet::new())).collect();
        for (server_id, server_neighbors) in neighbors {
            let entry = graph
                .get_mut(&server_id)
                .ok_or_else(|| TopologyError::UnknownMember(server_id.clone()))?;
            for neighbor in server_neighbors {
                if neighbor == server_id {
                    return Err(TopologyError::SelfNeighbor(server_id));
                }
                if !member_addrs.contains_key(&neighbor) {
                    return Err(TopologyError::UnknownMember(neighbor));
                }
                entry.insert(neighbor);
            }
        }

        for (server_id, server_neighbors) in graph.iter() {
            for neighbor in server_neighbors {
                let lists_back = graph.get(neighbor).map_or(false, |back| back.contains(server_id));
                if !lists_back {
                    return Err(TopologyError::AsymmetricNeighbors(server_id.clone(), neighbor.clone()));
                }
            }
        }

        Ok(MeshTopology {
            members: member_addrs,
            neighbors: graph,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, TopologyError> {
        let file: TopologyFile = serde_json::from_str(json).map_err(TopologyError::Json)?;

        let members = file
            .members
            .into_iter()
            .map(|entry| MemberInfo {
                id: ServerId::new(entry.id),
                addr: entry.addr,
            })
            .collect();
        let neighbors = file.neighbors.into_iter().map(|(id, list)| {
            (
                ServerId::new(id),
                list.into_iter().map(ServerId::new).collect::<Vec<_>>(),
            )
        });

        Self::new(members, neighbors)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, TopologyError> {
        let contents = fs::read_to_string(path).map_err(TopologyError::Io)?;
        Self::from_json_str(&contents)
    }

    pub fn contains_member(&self, server_id: &ServerId) -> bool {
        self.members.contains_key(server_id)
    }

    pub fn addr_of(&self, server_id: &ServerId) -> Option<SocketAddr> {
        self.members.get(server_id).copied()
    }

    /// Neighbors in a stable (sorted) order. Unknown servers have no neighbors.
    pub fn neighbors_of<'a>(&'a self, server_id: &ServerId) -> impl Iterator<Item = &'a ServerId> + 'a {
        self.neighbors.get(server_id).into_iter().flat_map(|set| set.iter())
    }

    pub fn members(&self) -> impl Iterator<Item = MemberInfo> + '_ {
        self.members.iter().map(|(id, addr)| MemberInfo {
            id: id.clone(),
            addr: *addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: &str, port: u16) -> MemberInfo {
        MemberInfo {
            id: ServerId::new(id),
            addr: SocketAddr::from(([127, 0, 0, 1], port)),
        }
    }

    fn edges(id: &str, neighbors: &[&str]) -> (ServerId, Vec<ServerId>) {
        (ServerId::new(id), neighbors.iter().map(|n| ServerId::new(*n)).collect())
    }

    #[test]
    fn symmetric_graph_is_accepted() {
        let topology = MeshTopology::new(
            vec![member("A", 1), member("B", 2), member("C", 3)],
            vec![edges("A", &["B"]), edges("B", &["A", "C"]), edges("C", &["B"])],
        )
        .unwrap();

        let b_neighbors: Vec<&str> = topology.neighbors_of(&"B".into()).map(|id| id.as_str()).collect();
        assert_eq!(b_neighbors, vec!["A", "C"]);
        assert_eq!(topology.addr_of(&"C".into()), Some(SocketAddr::from(([127, 0, 0, 1], 3))));
        assert_eq!(topology.neighbors_of(&"Z".into()).count(), 0);
    }

    #[test]
    fn asymmetric_graph_is_rejected() {
        let result = MeshTopology::new(
            vec![member("Bailey", 1), member("Bona", 2)],
            vec![edges("Bailey", &["Bona"]), edges("Bona", &[])],
        );

        match result {
            Err(TopologyError::AsymmetricNeighbors(from, to)) => {
                assert_eq!(from.as_str(), "Bailey");
                assert_eq!(to.as_str(), "Bona");
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn unknown_and_self_neighbors_are_rejected() {
        let unknown = MeshTopology::new(vec![member("A", 1)], vec![edges("A", &["Ghost"])]);
        assert!(matches!(unknown, Err(TopologyError::UnknownMember(id)) if id.as_str() == "Ghost"));

        let unknown_key = MeshTopology::new(vec![member("A", 1)], vec![edges("Ghost", &[])]);
        assert!(matches!(unknown_key, Err(TopologyError::UnknownMember(_))));

        let self_loop = MeshTopology::new(vec![member("A", 1)], vec![edges("A", &["A"])]);
        assert!(matches!(self_loop, Err(TopologyError::SelfNeighbor(_))));
    }

    #[test]
    fn duplicate_members_and_bad_ids_are_rejected() {
        let duplicate = MeshTopology::new(vec![member("A", 1), member("A", 2)], Vec::new());
        assert!(matches!(duplicate, Err(TopologyError::DuplicateMember(_))));

        let shared_addr = MeshTopology::new(vec![member("A", 1), member("B", 1)], Vec::new());
        assert!(matches!(shared_addr, Err(TopologyError::DuplicateAddress(_, _, _))));

        let bad_id = MeshTopology::new(vec![member("A,B", 1)], Vec::new());
        assert!(matches!(bad_id, Err(TopologyError::IllegalServerId(_))));
    }

    #[test]
    fn load_from_json() {
        let json = r#"{
            "members": [
                { "id": "Bailey", "addr": "127.0.0.1:10000" },
                { "id": "Bona", "addr": "127.0.0.1:10001" },
                { "id": "Campbell", "addr": "127.0.0.1:10002" }
            ],
            "neighbors": {
                "Bailey": ["Bona", "Campbell"],
                "Bona": ["Bailey"],
                "Campbell": ["Bailey"]
            }
        }"#;

        let topology = MeshTopology::from_json_str(json).unwrap();
        assert!(topology.contains_member(&"Campbell".into()));
        assert_eq!(topology.members().count(), 3);
        assert_eq!(topology.neighbors_of(&"Bailey".into()).count(), 2);
    }

    #[test]
    fn malformed_json_is_rejected() {
        let result = MeshTopology::from_json_str(r#"{ "members": [ { "id": "A", "addr": "nope" } ] }"#);
        assert!(matches!(result, Err(TopologyError::Json(_))));
    }
}
