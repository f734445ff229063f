//! Configuration for the overlay-attach binary
//!
//! A single flat TOML file holding the attachment options plus a few runtime
//! knobs. Environment variables override the file; CLI flags override both.

pub mod settings;

pub use settings::Settings;
