mod clock;
mod request;
mod response;

pub use clock::SystemClock;
pub use clock::WallClock;
pub(crate) use request::NearbyQuery;
pub(crate) use request::Request;
pub(crate) use response::location_header;
pub(crate) use response::nearby_reply;
pub(crate) use response::rejection;

#[cfg(test)]
pub(crate) use clock::FixedClock;
