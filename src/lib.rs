pub mod analyzers;
pub mod cache;
pub mod fetch;
pub mod infra;
pub mod output;
pub mod parser;
pub mod records;
pub mod services;
pub mod weather;
