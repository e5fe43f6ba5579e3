#[allow(unused_imports)]
pub mod book_repository;

#[allow(unused_imports)]
pub use book_repository::*;
