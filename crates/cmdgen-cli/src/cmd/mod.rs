pub mod check;
pub mod commands;
pub mod config;
pub mod draft;
pub mod export;
pub mod generate;
pub mod history;
pub mod init;
pub mod next;
pub mod render;
pub mod status;
pub mod workflow;
pub mod workflows;
