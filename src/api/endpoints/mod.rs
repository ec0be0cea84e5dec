pub mod alerts;
pub mod auth;
pub mod contacts;
pub mod health;
pub mod profile;
