pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod demo;
pub mod error;
pub mod export;
pub mod logging;
pub mod model;
pub mod parquet_import;
pub mod persist;
pub mod profile;
pub mod scoring;
pub mod summary;
pub mod warehouse;
