mod message;
mod peer_client;
mod propagator;
mod visited;

pub(crate) use message::UpdateMessage;
pub(crate) use message::UPDATE_KEYWORD;
pub(crate) use propagator::Propagator;
pub(crate) use propagator::RetryPolicy;
pub use visited::VisitedListError;
pub(crate) use visited::VisitedSet;
