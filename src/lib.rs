pub mod access;
pub mod alerts;
pub mod api;
pub mod auth;
pub mod config;
pub mod contacts;
pub mod db;
pub mod geocode;
pub mod models;
pub mod realtime;
pub mod state;
