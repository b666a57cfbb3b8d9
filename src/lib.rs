// Displacement dashboard - survey data service and chart view-model
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
