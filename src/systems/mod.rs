//! Application systems
//!
//! Platform pieces the engine reaches through its collaborator traits.

mod window;

pub use window::{window_attributes, WindowError, WinitWindow};
