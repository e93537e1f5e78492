pub mod json;
pub mod response;
pub mod validation;

pub use json::*;
pub use response::*;
pub use validation::*;
