pub mod aggregate;
pub mod config;
pub mod coords;
pub mod error;
pub mod fetch;
pub mod geo;
pub mod health;
pub mod names;
pub mod output;
pub mod poller;
pub mod server;
pub mod station;
pub mod summary;
pub mod vendors;
