//! Candidate structure construction for defined-risk options strategies.
//!
//! Directional bias maps to debit verticals, neutral bias to a fixed-width
//! iron condor. Every short leg is paired with a long leg of equal quantity
//! on the same underlying and expiry, so no candidate ever carries naked
//! short risk. Candidates are ranked by a blend of edge, payoff, and safety.

pub mod builder;
pub mod pricing;

pub use builder::{build_candidates, structurally_hedged, CandidateStructure};
