pub mod api;
pub mod bet_window;
pub mod config;
pub mod error;
pub mod export;
pub mod forms;
pub mod http_client;
pub mod images;
pub mod logging;
pub mod models;
pub mod provider;
pub mod session;
pub mod standings;
pub mod state;
pub mod workflow;
