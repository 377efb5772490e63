use std::convert::TryFrom;
use tokio::time::Duration;

/// Tunables for one herd server. Anything left as `None` gets a default.
#[derive(Clone, Default)]
pub struct HerdOptions {
    pub propagation_connect_timeout: Option<Duration>,
    pub propagation_attempts: Option<usize>,
    pub propagation_initial_backoff: Option<Duration>,
    pub propagation_max_backoff: Option<Duration>,
    pub request_read_timeout: Option<Duration>,
    pub max_request_line_length: Option<usize>,
    pub seen_update_capacity: Option<usize>,
    pub directory_queue_size: Option<usize>,
}

pub(super) struct HerdOptionsValidated {
    pub propagation_connect_timeout: Duration,
    pub propagation_attempts: usize,
    pub propagation_initial_backoff: Duration,
    pub propagation_max_backoff: Duration,
    pub request_read_timeout: Duration,
    pub max_request_line_length: usize,
    pub seen_update_capacity: usize,
    pub directory_queue_size: usize,
}

impl HerdOptionsValidated {
    fn validate(&self) -> Result<(), &'static str> {
        if self.propagation_connect_timeout == Duration::from_millis(0) {
            return Err("Propagation connect timeout must be non-zero");
        }
        if self.propagation_attempts == 0 {
            return Err("Propagation must make at least one attempt per neighbor");
        }
        if self.propagation_initial_backoff > self.propagation_max_backoff {
            return Err("Propagation initial backoff must not exceed the maximum backoff");
        }
        if self.request_read_timeout == Duration::from_millis(0) {
            return Err("Request read timeout must be non-zero");
        }
        if self.max_request_line_length == 0 {
            return Err("Maximum request line length must be non-zero");
        }
        if self.seen_update_capacity == 0 {
            return Err("Seen update capacity must be non-zero");
        }
        if self.directory_queue_size == 0 {
            return Err("Directory queue size must be non-zero");
        }

        Ok(())
    }
}

impl TryFrom<HerdOptions> for HerdOptionsValidated {
    type Error = &'static str;

    fn try_from(options: HerdOptions) -> Result<Self, Self::Error> {
        let values = HerdOptionsValidated {
            propagation_connect_timeout: options
                .propagation_connect_timeout
                .unwrap_or(Duration::from_millis(1000)),
            propagation_attempts: options.propagation_attempts.unwrap_or(3),
            propagation_initial_backoff: options
                .propagation_initial_backoff
                .unwrap_or(Duration::from_millis(150)),
            propagation_max_backoff: options.propagation_max_backoff.unwrap_or(Duration::from_millis(1200)),
            request_read_timeout: options.request_read_timeout.unwrap_or(Duration::from_secs(10)),
            max_request_line_length: options.max_request_line_length.unwrap_or(4096),
            seen_update_capacity: options.seen_update_capacity.unwrap_or(10_000),
            directory_queue_size: options.directory_queue_size.unwrap_or(64),
        };

        values.validate()?;
        Ok(values)
    }
}
