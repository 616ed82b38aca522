pub mod auth;
pub mod download;
pub mod error;
pub mod http_client;
pub mod raw;
pub mod transport;
pub mod utils;
