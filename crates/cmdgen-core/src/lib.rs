pub mod binding;
pub mod catalog;
pub mod config;
pub mod draft;
pub mod error;
pub mod export;
pub mod form;
pub mod guidance;
pub mod history;
pub mod io;
pub mod paths;
pub mod quality;
pub mod render;
pub mod store;
pub mod types;
pub mod workflow;

pub use error::{CmdgenError, Result};
