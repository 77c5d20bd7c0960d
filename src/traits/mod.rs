//! Core trait abstractions.
//!
//! The seams are capability traits rather than base-class hierarchies:
//! - [`Fetch`]: data-source interface (fetch + health probe)
//! - [`RemoteCache`]: shared cache tier
//! - [`StoreProbe`]: persistent-store reachability

pub mod cache;
pub mod source;
pub mod store;

pub use cache::RemoteCache;
pub use source::{Fetch, FetchTarget};
pub use store::StoreProbe;
