//! Core stack logic — types, configuration, building, composition, rendering, synthesis.

pub mod app;
pub mod builder;
pub mod composer;
pub mod config;
pub mod error;
pub mod render;
pub mod stack;
pub mod types;
