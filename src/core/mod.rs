//! Currency records and the registry that owns them.

pub mod currency;
pub mod registry;
