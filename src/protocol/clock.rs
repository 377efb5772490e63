use chrono::Utc;

/// Source of "now" for skew calculations, in seconds since the Unix epoch.
pub trait WallClock: Send + Sync {
    fn now_epoch_seconds(&self) -> f64;
}

#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now_epoch_seconds(&self) -> f64 {
        let now = Utc::now();
        now.timestamp() as f64 + f64::from(now.timestamp_subsec_nanos()) / 1e9
    }
}

#[cfg(test)]
#[derive(Copy, Clone, Debug)]
pub(crate) struct FixedClock(pub(crate) f64);

#[cfg(test)]
impl WallClock for FixedClock {
    fn now_epoch_seconds(&self) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_close_to_std() {
        let std_now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs_f64();

        assert!((SystemClock.now_epoch_seconds() - std_now).abs() < 5.0);
    }
}
