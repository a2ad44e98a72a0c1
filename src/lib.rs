pub mod ast;
pub mod config;
pub mod error;
pub mod session;

pub use error::{Error, Result};
