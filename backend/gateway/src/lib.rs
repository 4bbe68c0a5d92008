//! LabelScan HTTP gateway.
//!
//! Accepts label images, runs OCR and analysis, and keeps recent results
//! in memory for retrieval.

pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod registry;
pub mod server;

pub use error::ApiError;
pub use registry::{LabelResult, ReportRegistry};
pub use server::{GatewayState, build_router, start_server};
