use crate::topology::ServerId;
use std::collections::BTreeSet;

const SEPARATOR: &str = ",";

/// VisitedSet is every server that has already seen one update. Membership is exact: a server
/// named `Bo` is never mistaken for `Bona`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct VisitedSet(BTreeSet<ServerId>);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("malformed visited list {0:?}")]
pub struct VisitedListError(String);

impl VisitedSet {
    pub(crate) fn new() -> Self {
        VisitedSet(BTreeSet::new())
    }

    pub(crate) fn contains(&self, server_id: &ServerId) -> bool {
        self.0.contains(server_id)
    }

    /// A copy of this set that also contains `server_id`.
    pub(crate) fn with(&self, server_id: &ServerId) -> Self {
        let mut extended = self.clone();
        extended.0.insert(server_id.clone());
        extended
    }

    /// Wire form, e.g. `Bailey,Bona`.
    pub(crate) fn encode(&self) -> String {
        self.0
            .iter()
            .map(ServerId::as_str)
            .collect::<Vec<_>>()
            .join(SEPARATOR)
    }

    pub(crate) fn decode(raw: &str) -> Result<Self, VisitedListError> {
        let mut visited = BTreeSet::new();
        for name in raw.split(SEPARATOR) {
            let server_id = ServerId::new(name);
            if !server_id.is_wire_safe() {
                return Err(VisitedListError(raw.to_string()));
            }
            visited.insert(server_id);
        }

        Ok(VisitedSet(visited))
    }
}
