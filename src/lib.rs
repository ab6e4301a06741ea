// Storefront client - library root

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod http_client;
pub mod models;
