// Application layer - Use cases for the data service and the dashboard client
pub mod controller;
pub mod data_source;
pub mod survey_repository;
pub mod survey_service;
pub mod view_model;
