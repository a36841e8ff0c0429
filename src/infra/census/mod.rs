mod client;

pub use client::{CensusClient, DEFAULT_BASE_URL, parse_census_response};
