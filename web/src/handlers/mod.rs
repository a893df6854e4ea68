//! HTTP request handlers shared by both services.

pub mod health;

pub use health::{ConsumerHealthResponse, HealthResponse, consumer_health, health_check};
