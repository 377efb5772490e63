use std::fmt;
use std::net::SocketAddr;

/// ServerId is the name of one mesh member, e.g. `Bailey`. It travels on the wire inside the
/// visited list of every `UPDATE`, so it must stay a single comma-free token.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ServerId(String);

impl ServerId {
    pub fn new(id: impl Into<String>) -> Self {
        ServerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub(crate) fn is_wire_safe(&self) -> bool {
        !self.0.is_empty() && !self.0.chars().any(|c| c.is_whitespace() || c == ',')
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServerId {
    fn from(id: &str) -> Self {
        ServerId::new(id)
    }
}

#[derive(Clone, Debug)]
pub struct MemberInfo {
    pub id: ServerId,
    pub addr: SocketAddr,
}
