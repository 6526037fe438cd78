pub mod labels;
pub mod projector;
pub mod symbology;

pub use labels::*;
pub use projector::*;
pub use symbology::*;
