pub mod api;
pub mod csv;
pub mod engine;
pub mod error;
pub mod flat;
pub mod ident;
pub mod json;
pub mod path;
pub mod text;
pub mod validate;
pub mod value;
pub mod xml;

pub use api::Tree;
pub use error::DotPathError;
pub use value::Value;
