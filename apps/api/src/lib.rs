pub mod analysis;
pub mod auth;
pub mod billing;
pub mod client;
pub mod config;
pub mod db;
pub mod errors;
pub mod extract;
pub mod generation;
pub mod history;
pub mod llm_client;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;
