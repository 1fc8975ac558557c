//! Presentation layer: renders lifecycle state and turns user commands
//! into manager actions.

pub mod console;
pub mod view;

pub use console::{Command, Console};
pub use view::StatusView;
