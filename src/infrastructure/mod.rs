// Infrastructure layer - config, files, generators and the terminal
pub mod config;
pub mod feeds;
pub mod generator;
pub mod json_loader;
pub mod terminal;
