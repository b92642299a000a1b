pub mod runtime;
pub mod validator;

pub use runtime::{Runtime, RuntimeError};
pub use validator::{ValidationErrors, Validator};
