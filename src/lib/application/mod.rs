pub mod commands;
pub mod dto;
pub mod queries;
pub mod service;
pub mod validation;

pub use dto::*;
pub use service::TodoService;
