//! # HTTP Gateway
//!
//! REST surface of the prediction service. Every error leaves as
//! `{"detail": ..., "code": ...}` with a status from [`responses::status_for`].

mod handlers;
pub mod responses;
mod server;

pub use responses::{
    ApiError, BatchPredictionResponse, FilePredictionResponse, HealthResponse, ReloadResponse,
    RootResponse, status_for,
};
pub use server::{GatewayServer, SharedGateway, router as gateway_router, run as run_gateway};
