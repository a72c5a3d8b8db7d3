pub mod api;
pub mod audit;
pub mod backend;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod lifecycle;
pub mod mcp;
pub mod runner;
pub mod util;
