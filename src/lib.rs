pub mod analyzers;
pub mod charts;
pub mod config;
pub mod demographics;
pub mod enrich;
pub mod error;
pub mod fetch;
pub mod food_access;
pub mod infra;
pub mod join;
pub mod output;
pub mod pipeline;
pub mod services;
pub mod table;
pub mod tract;
