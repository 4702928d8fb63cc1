// sarview: SAR binary logs and CSV bundles as normalized per-domain tables

pub mod bundle;
pub mod cache;
pub mod config;
pub mod converter;
pub mod error;
pub mod logs;
pub mod models;
pub mod parsers;
pub mod routes;
pub mod service;
pub mod version;

pub use error::{Result, SarError};
