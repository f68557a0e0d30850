//! Bundled format drivers.
//!
//! Game-specific layouts are registered by the embedding application; the
//! drivers here cover the generic formats many games ship their data in and
//! the two pseudo-formats the core needs itself.

mod listing;
mod tar;
mod unknown;
mod zip;

pub use listing::ListingDriver;
pub use self::tar::TarDriver;
pub use unknown::UnknownDriver;
pub use self::zip::ZipDriver;
