//! Recommendation Service and its HTTP surface.

pub mod service;
pub mod rest;

pub use service::{
    Catalog, Recommendation, RecommendationService, Recommendations, ServiceConfig, DEFAULT_TOP_N,
};
pub use rest::{routes, RestApi};
