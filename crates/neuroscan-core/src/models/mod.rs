//! Data models exchanged with the prediction backend
//!
//! Wire names follow the backend's camelCase JSON; Rust names are snake_case.

mod model_info;
mod prediction;

pub use model_info::*;
pub use prediction::*;
