//! The billboard media server: per-route display configuration, the media tree, image
//! scheduling and admin sessions, behind an HTTP API.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod media;
pub mod routes;
pub mod serve;
pub mod service;
