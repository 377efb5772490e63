mod mesh;
mod peers;

pub use mesh::MeshTopology;
pub use mesh::TopologyError;
pub use peers::MemberInfo;
pub use peers::ServerId;
