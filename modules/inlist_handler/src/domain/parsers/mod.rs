pub mod inlist;
pub mod toml_inlist;

pub use inlist::InlistHandler;
pub use toml_inlist::TomlInlistHandler;
