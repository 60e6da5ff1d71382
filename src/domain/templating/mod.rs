//! Templating module - path traversal and placeholder substitution.

mod engine;
mod path;

pub use engine::{
    builtin_value, resolve_parameters, resolve_template, stringify, MISSING_VALUE_SENTINEL,
};
pub use path::resolve_path;
