//! Persistent-store probes (feature-gated implementations).

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::PgStoreProbe;
