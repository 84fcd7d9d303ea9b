pub mod config;
pub mod export;
pub mod mesh;
pub mod procgen;
pub mod sim;
