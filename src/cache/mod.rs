//! Caching layer: deterministic keys, local tier, remote KV client.

pub mod key;
pub mod layered;
pub mod remote;

pub use key::derive_cache_key;
pub use layered::LayeredCache;
pub use remote::HttpKvCache;
