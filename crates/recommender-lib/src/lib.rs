//! Kruize VPA recommender library
//!
//! This crate provides the core functionality for:
//! - Discovering VPAs that opted into the Kruize recommender
//! - Registering Kruize experiments for their target Deployments
//! - Translating Kruize recommendations into VPA status patches
//! - Health checks and observability

pub mod cluster;
pub mod error;
pub mod extractor;
pub mod health;
pub mod kruize;
pub mod matcher;
pub mod models;
pub mod observability;
pub mod quantity;
pub mod reconciler;
pub mod resolver;
pub mod selector;

pub use error::{RecommenderError, Result};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{RecommenderMetrics, StructuredLogger};
pub use reconciler::{CycleReport, Reconciler, ReconcilerBuilder};
