pub mod auth;
pub mod backend;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod functions;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod permissions;
pub mod realtime;
pub mod server;
pub mod services;
pub mod toast;
