//! Offline preparation of the travel map's static data files.

pub mod geonames;

pub use geonames::*;
