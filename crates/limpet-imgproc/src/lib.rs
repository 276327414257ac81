#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// image cropping module.
pub mod crop;

/// patch matching cost metrics module.
pub mod metrics;

/// tapered weighting windows module.
pub mod window;
