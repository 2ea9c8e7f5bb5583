pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod criteria;
pub mod data_models;
pub mod db;
pub mod errors;
pub mod query_builder;
pub mod repository;
pub mod search_engine;
pub mod service;
pub mod store;
