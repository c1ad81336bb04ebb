pub mod config;
pub mod roadmap;
