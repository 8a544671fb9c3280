pub mod backfill;
pub mod chat;
pub mod config;
pub mod error;
pub mod generate;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod records;
pub mod table;
pub mod textutil;
