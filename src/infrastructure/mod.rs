//! Infrastructure Layer
//!
//! - HTTP: RESTful API、中间件管线、统一响应信封

pub mod http;
