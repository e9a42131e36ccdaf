//! Terminal user interface

pub mod conversation;
pub mod tui;
