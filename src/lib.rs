pub mod api;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod models;
pub mod normalize;
pub mod pipeline;
