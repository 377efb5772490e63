mod actor;
mod api;
mod directory;
mod gossip;
mod logging;
mod places;
mod protocol;
mod server;
mod topology;

pub use actor::DirectoryError;
pub use api::try_create_herd_server;
pub use api::HerdOptions;
pub use api::HerdServer;
pub use api::HerdServerConfig;
pub use api::HerdServerCreationError;
pub use directory::Coordinates;
pub use directory::CoordinatesError;
pub use directory::LocationRecord;
pub use directory::Timestamp;
pub use directory::TimestampError;
pub use logging::create_root_logger_for_file;
pub use logging::create_root_logger_for_stdout;
pub use places::ApiKey;
pub use places::GooglePlacesClient;
pub use places::NearbyPlaces;
pub use places::PlacesError;
pub use places::PlacesProvider;
pub use places::PlacesQuery;
pub use places::UnconfiguredPlaces;
pub use topology::MemberInfo;
pub use topology::MeshTopology;
pub use topology::ServerId;
pub use topology::TopologyError;

// `crate::{root_mod}` holds no code, just `mod` and `pub use`. Modules stay private; only
// individual types are exported.
