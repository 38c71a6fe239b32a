//! molreward-ranker — Multi-objective reward aggregation.
//! Turns a `PropertyRecord` into one scalar in [0, 1] for an optimisation loop.

pub mod normalise;
pub mod scorer;
pub mod weights;

pub use normalise::{sigmoid, Objective};
pub use scorer::{reward, RewardAggregator, RewardBreakdown};
pub use weights::RewardWeights;
