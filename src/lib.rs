pub mod audit;
pub mod config;
pub mod db;
pub mod dto;
pub mod effects;
pub mod entity;
pub mod error;
pub mod fulfillment;
pub mod images;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod query;
pub mod repository;
pub mod response;
pub mod reviews;
pub mod routes;
pub mod services;
pub mod state;
pub mod stock;
pub mod ttl;

#[cfg(test)]
mod test_support;
