pub mod api;
pub mod config;
pub mod content;
pub mod error;
pub mod i18n;
pub mod import;
pub mod layout;
pub mod locks;
pub mod models;
pub mod names;
pub mod presentation;
pub mod projection;
pub mod retry;
pub mod security;
pub mod service;
pub mod store;
pub mod translation;
