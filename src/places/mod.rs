mod google;
mod provider;

pub use google::ApiKey;
pub use google::GooglePlacesClient;
pub use provider::NearbyPlaces;
pub use provider::PlacesError;
pub use provider::PlacesProvider;
pub use provider::PlacesQuery;
pub use provider::UnconfiguredPlaces;
