pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod fov;
pub mod hooks;
pub mod path;
pub mod pathfind;
pub mod rng;
pub mod scheduler;
pub mod spatial;
pub mod terrain;
pub mod types;
