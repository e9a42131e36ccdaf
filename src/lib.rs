//! Terminal chat client, proxy gateway and reference backend for a
//! language-model chat service.

pub mod app;
pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod gateway;
pub mod llm;
pub mod logging;
pub mod transcript;
pub mod ui;
