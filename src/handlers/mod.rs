//! Handler implementations

pub mod json;

pub use json::{HandlerOptions, JsonHandler, ReplaceAttr};

pub use crate::core::Handler;
