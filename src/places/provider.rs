use serde_json::{Map, Value};

const RESULTS_FIELD: &str = "results";

/// One nearby-places lookup. Range checks (`radius_km` in 1..=50, `max_results` in 1..=20)
/// are the caller's job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacesQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: u32,
    pub max_results: usize,
}

/// Provider response body with its `results` array cut down to the requested size. Other
/// top-level fields (e.g. `status`) are passed through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyPlaces {
    body: Map<String, Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum PlacesError {
    #[error("Places provider unreachable: {0}")]
    Transport(reqwest::Error),
    #[error("Places provider replied with HTTP {0}")]
    HttpStatus(u16),
    #[error("Places provider reported status {0:?}")]
    ProviderStatus(String),
    #[error("Malformed places payload: {0}")]
    Malformed(String),
    #[error("No places provider credentials configured")]
    Unconfigured,
}

impl NearbyPlaces {
    /// Accepts a JSON object carrying a `results` array, preserving provider order.
    pub fn from_provider_body(body: Value, max_results: usize) -> Result<Self, PlacesError> {
        let mut body = match body {
            Value::Object(map) => map,
            other => return Err(PlacesError::Malformed(format!("expected an object, got {}", other))),
        };

        match body.get_mut(RESULTS_FIELD) {
            Some(Value::Array(results)) => results.truncate(max_results),
            _ => return Err(PlacesError::Malformed("missing results array".to_string())),
        }

        Ok(NearbyPlaces { body })
    }

    pub fn results(&self) -> &[Value] {
        match self.body.get(RESULTS_FIELD) {
            Some(Value::Array(results)) => results.as_slice(),
            _ => &[],
        }
    }

    pub fn truncate(&mut self, max_results: usize) {
        if let Some(Value::Array(results)) = self.body.get_mut(RESULTS_FIELD) {
            results.truncate(max_results);
        }
    }

    /// Single-line JSON, so the blank line that ends a `WHATSAT` reply is unambiguous.
    pub fn to_wire(&self) -> Result<String, PlacesError> {
        serde_json::to_string(&self.body).map_err(|e| PlacesError::Malformed(e.to_string()))
    }
}

#[async_trait::async_trait]
pub trait PlacesProvider: Send + Sync {
    async fn nearby(&self, query: PlacesQuery) -> Result<NearbyPlaces, PlacesError>;
}

/// Stand-in used when no provider credentials are available. Every query fails, so `WHATSAT`
/// is answered with `?` while the rest of the server keeps working.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredPlaces;

#[async_trait::async_trait]
impl PlacesProvider for UnconfiguredPlaces {
    async fn nearby(&self, _query: PlacesQuery) -> Result<NearbyPlaces, PlacesError> {
        Err(PlacesError::Unconfigured)
    }
}
