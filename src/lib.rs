pub mod application;
pub mod commands;
pub mod manifest;
pub mod package;
pub mod runtime;
pub mod tool;
