use crate::places::provider::{NearbyPlaces, PlacesError, PlacesProvider, PlacesQuery};
use serde_json::Value;
use std::fmt;
use tokio::time::Duration;

const NEARBY_SEARCH_URL: &str = "https://maps.googleapis.com/maps/api/place/nearbysearch/json";

/// Provider statuses that still carry a usable `results` array.
const ACCEPTED_STATUSES: [&str; 2] = ["OK", "ZERO_RESULTS"];

/// API credential for the places provider. Never printed, not even in debug output.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        ApiKey(key.into())
    }

    /// Read the key from an environment variable. Empty values count as missing.
    pub fn from_env(var: &str) -> Option<Self> {
        std::env::var(var).ok().filter(|key| !key.is_empty()).map(ApiKey)
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// GooglePlacesClient queries the Google Places "nearby search" endpoint.
pub struct GooglePlacesClient {
    logger: slog::Logger,
    http_client: reqwest::Client,
    api_key: ApiKey,
    endpoint: String,
    timeout: Duration,
}

impl GooglePlacesClient {
    pub fn new(logger: slog::Logger, api_key: ApiKey, timeout: Duration) -> Self {
        GooglePlacesClient {
            logger,
            http_client: reqwest::Client::new(),
            api_key,
            endpoint: NEARBY_SEARCH_URL.to_string(),
            timeout,
        }
    }

    /// Point the client somewhere other than Google, e.g. a local stub.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait::async_trait]
impl PlacesProvider for GooglePlacesClient {
    async fn nearby(&self, query: PlacesQuery) -> Result<NearbyPlaces, PlacesError> {
        let location = format!("{},{}", query.latitude, query.longitude);
        let radius_m = (u64::from(query.radius_km) * 1000).to_string();
        slog::debug!(self.logger, "Nearby search"; "location" => &location, "radius_m" => &radius_m);

        // reqwest errors carry the request URL, which includes the key. Strip it.
        let response = self
            .http_client
            .get(&self.endpoint)
            .query(&[
                ("location", location.as_str()),
                ("radius", radius_m.as_str()),
                ("key", self.api_key.expose()),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| PlacesError::Transport(e.without_url()))?;

        let status = response.status();
        slog::debug!(self.logger, "Places provider replied"; "http_status" => status.as_u16());
        if !status.is_success() {
            return Err(PlacesError::HttpStatus(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| PlacesError::Malformed(e.without_url().to_string()))?;

        if let Some(provider_status) = body.get("status").and_then(Value::as_str) {
            if !ACCEPTED_STATUSES.contains(&provider_status) {
                return Err(PlacesError::ProviderStatus(provider_status.to_string()));
            }
        }

        NearbyPlaces::from_provider_body(body, query.max_results)
    }
}
