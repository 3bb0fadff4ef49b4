//! Research pipeline for Infograph sessions.
//!
//! [`SearchService`] produces deterministic mock sources for a prompt,
//! [`InfographicService`] condenses them into an SVG summary, and
//! [`ResearchPipeline`] drives a session through both while advancing its
//! status.

pub mod error;
pub mod infographic;
pub mod pipeline;
pub mod render;
pub mod search;

pub use error::{Error, Result};
pub use infographic::InfographicService;
pub use pipeline::{ResearchOutcome, ResearchPipeline};
pub use search::SearchService;
