//! Pure map math: coordinates, views, projection and configuration.

pub mod config;
pub mod constants;
pub mod geo;
pub mod projection;
pub mod view;
