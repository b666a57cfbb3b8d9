// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod dat_repository;
pub mod http_source;
