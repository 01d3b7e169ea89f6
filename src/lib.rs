pub mod config;
pub mod document;
pub mod edge;
pub mod fragments;
pub mod i18n;
pub mod probe;
pub mod reconcile;
pub mod resolver;
pub mod retry;
pub mod server;
pub mod translation;
