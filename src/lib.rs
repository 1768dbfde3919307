// SIRN visualizer - incremental epidemic model display for the terminal
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
