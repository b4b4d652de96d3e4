//! The voting core: vote submission and results aggregation.
//!
//! Both services are constructed once with the shared [`Store`](crate::store::Store)
//! and a [`Clock`](crate::clock::Clock), then placed in Rocket's managed state.

mod results;
mod voting;

pub use results::{ResultsAggregator, Viewer, NO_VOTES_YET};
pub use voting::VotingService;
