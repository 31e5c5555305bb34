pub mod arena;
pub mod constants;
pub mod engine;
pub mod map;
pub mod rng;
pub mod server_protocol;
pub mod server_utils;
pub mod types;
