//! Linux/X11 backends: the hook source tracking the target and the overlay surface

pub mod hook;
pub mod surface;
pub mod tracker;

pub use hook::X11HookSource;
pub use surface::X11Surface;
