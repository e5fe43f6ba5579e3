pub mod book;
pub mod commands;
pub mod errors;
pub mod identity;
pub mod policy;
pub mod value_objects;

pub use errors::*;
pub use identity::*;
pub use value_objects::*;
