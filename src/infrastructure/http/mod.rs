//! HTTP Layer - RESTful API
//!
//! 所有响应都经过统一信封：成功为 `{ "data": ... }`，失败见 [`error::ErrorEnvelope`]

pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod rate_limit;
pub mod routes;
pub mod server;
pub mod state;

pub use dto::{wrap, ApiResponse, ApiResult};
pub use error::{normalize, ApiError, ErrorEnvelope, RequestContext};
pub use extract::ValidatedJson;
pub use rate_limit::RateLimiter;
pub use routes::create_routes;
pub use server::{create_app, shutdown_signal, HttpServer};
pub use state::AppState;
