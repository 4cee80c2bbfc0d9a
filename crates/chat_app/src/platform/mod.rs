//! Terminal front end: configuration, logging setup and the question loop.
mod app;
mod cli;
mod config;
mod render;

pub use app::run_app;
