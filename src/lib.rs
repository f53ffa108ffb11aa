pub mod app;
pub mod channel;
pub mod command;
pub mod config;
pub mod event;
pub mod format;
pub mod load;
pub mod logging;
pub mod notify;
pub mod render;
pub mod system;
