// Library exports for recipebox
// The binary and integration tests both build on these modules

pub mod api;
pub mod changes;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod images;
pub mod manager;
pub mod mirror;
pub mod models;
pub mod screens;
pub mod session;
pub mod state;
pub mod timer;
