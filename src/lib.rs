// Cardex - Library Entry Point

pub mod cache;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod migrate;
pub mod models;
