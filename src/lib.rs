pub mod backend;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod screen;
pub mod services;
pub mod state;
pub mod view;
