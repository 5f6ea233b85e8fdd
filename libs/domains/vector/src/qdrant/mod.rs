mod client;
mod config;
pub mod convert;

pub use client::QdrantRepository;
pub use config::QdrantConfig;
