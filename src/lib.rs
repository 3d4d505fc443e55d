pub mod analysis;
pub mod api_football;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod export;
pub mod fixture;
pub mod http_client;
pub mod match_cache;
pub mod narrative;
pub mod score;
pub mod scout;
pub mod stats;
pub mod verdict;
