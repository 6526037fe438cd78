pub mod event_bus;
pub mod frame;
pub mod transition;
pub mod zoom;

pub use event_bus::*;
pub use frame::*;
pub use transition::*;
pub use zoom::*;
