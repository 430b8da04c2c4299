pub mod config;
pub mod error;
pub mod http_client;
pub mod instrument;
pub mod model;
pub mod provider;
pub mod providers;
pub mod telemetry;
