pub mod api;
pub mod compose;
pub mod config;
pub mod feed;
pub mod session;
pub mod tui;
