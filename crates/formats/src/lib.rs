pub mod error;
pub mod geojson;
pub mod index;
pub mod topology;

pub use error::*;
pub use geojson::*;
pub use index::*;
pub use topology::*;
