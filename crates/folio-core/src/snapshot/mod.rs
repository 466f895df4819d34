//! Snapshot compilation, publication windows and retention

pub mod compile;
pub mod retention;
pub mod window;

pub use compile::{compile_page, load_page};
pub use retention::select_for_deletion;
pub use window::{activate, activation_floor, check_activation};
