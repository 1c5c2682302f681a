pub mod app_settings;
pub mod app_state;
pub mod bindings;
pub mod commands;
pub mod messages;
