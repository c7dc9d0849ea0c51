//! Matching engine for Korean government R&D and SME funding programs.
//!
//! The entry point most callers want is [`funnel::generate_matches`];
//! IAP generation lives behind [`iap::generate_ideal_profile`].

pub mod classifier;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod funnel;
pub mod gate;
pub mod iap;
pub mod llm;
pub mod models;
pub mod negative_signals;
pub mod practical;
pub mod program_type;
pub mod proximity;
pub mod semantic;
pub mod taxonomy;
pub mod trl;

pub use error::{MatchError, MatchResult};
pub use funnel::generate_matches;
pub use iap::generate_ideal_profile;
