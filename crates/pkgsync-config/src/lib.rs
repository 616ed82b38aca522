pub mod config;
pub mod error;
pub mod repository;
pub mod versions;
