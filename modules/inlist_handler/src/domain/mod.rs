pub mod error;
pub mod lexer;
pub mod literal;
pub mod parser;
pub mod parsers;
pub mod render;
pub mod service;
pub mod typer;
pub mod value;

pub use error::*;
pub use parser::*;
pub use parsers::*;
pub use render::*;
pub use service::*;
pub use value::*;
