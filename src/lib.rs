//! Technical-indicator analysis for candle series.
//!
//! The engine ([`indicator`], [`signal`], [`analysis`]) is synchronous and does no
//! I/O. [`hub`], [`source`] and [`notifier`] host it as a streaming service.

pub mod analysis;
pub mod config;
pub mod error;
pub mod hub;
pub mod indicator;
pub mod model;
pub mod notifier;
pub mod signal;
pub mod source;
