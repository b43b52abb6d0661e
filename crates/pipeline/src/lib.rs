//! Candidate set construction for the recommendation path.
//!
//! This crate provides:
//! - CatalogSource: the universe of movies a request may score
//! - build_user_context: the requesting user's rated set
//! - Filter trait and FilterPipeline for trimming the universe down to the
//!   candidate set
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{build_user_context, CandidateUniverse, CatalogSource, FilterPipeline};
//! use pipeline::filters::AlreadyRatedFilter;
//!
//! let catalog = CatalogSource::new(&index, CandidateUniverse::default());
//! let pipeline = FilterPipeline::new().add_filter(AlreadyRatedFilter);
//!
//! let context = build_user_context(&index, user_id);
//! let candidates = pipeline.apply(catalog.get_candidates(), &context)?;
//! ```

pub mod types;
pub mod user_context;
pub mod catalog;
pub mod traits;
pub mod filters;
pub mod filter_pipeline;

// Re-export main types
pub use types::{Candidate, UserContext};
pub use user_context::build_user_context;
pub use catalog::{CandidateUniverse, CatalogSource};
pub use traits::Filter;
pub use filter_pipeline::FilterPipeline;
