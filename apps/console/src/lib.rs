pub mod adapters;
pub mod commands;
pub mod infra;
