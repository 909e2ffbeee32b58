pub mod adjacency;
pub mod camera;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod layout;
pub mod mole;
pub mod pipeline;
pub mod protocol;
pub mod scheduler;
pub mod service;
pub mod tree;
pub mod types;
