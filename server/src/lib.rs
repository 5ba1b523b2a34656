pub mod auth;
pub mod config;
pub mod external;
pub mod handlers;
pub mod models;
pub mod oauth;
pub mod query;
pub mod repository;
pub mod routes;
pub mod state;
pub mod utils;
