// Presentation layer - command line and terminal input
pub mod cli;
pub mod input;
