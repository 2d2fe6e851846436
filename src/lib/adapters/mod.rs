pub mod http;

pub use http::{AppState, HttpServer, ProblemDetails, router};
