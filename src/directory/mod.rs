mod record;
mod store;

pub use record::Coordinates;
pub use record::CoordinatesError;
pub use record::LocationRecord;
pub use record::Timestamp;
pub use record::TimestampError;
pub(crate) use store::LocationDirectory;
pub use store::StoreOutcome;
pub(crate) use store::VolatileDirectory;
