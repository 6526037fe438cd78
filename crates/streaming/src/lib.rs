pub mod cache;
pub mod io;
pub mod loader;

pub use cache::*;
pub use io::*;
pub use loader::*;
