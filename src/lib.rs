pub mod clients;
pub mod config;
pub mod consumer;
pub mod models;
pub mod render;
