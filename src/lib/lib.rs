pub mod adapters;
pub mod application;
pub mod config;
pub mod core;
pub mod storage;
pub mod telemetry;

#[cfg(test)]
mod tests;
