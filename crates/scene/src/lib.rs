pub mod config;
pub mod error;
pub mod machine;
pub mod session;
pub mod surface;
pub mod visited;

pub use config::*;
pub use error::*;
pub use machine::*;
pub use session::*;
pub use surface::*;
pub use visited::*;
