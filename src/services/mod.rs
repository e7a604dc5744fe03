// src/services/mod.rs

pub mod cache;
pub mod date_range;
pub mod memory_store;
pub mod pricing;
pub mod quote_request;
pub mod scheduler;
pub mod store;
pub mod supabase;
pub mod ttl;
