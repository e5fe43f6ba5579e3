mod book_service;
pub mod catalog_seed;
mod errors;

pub use book_service::{
    ServiceDependencies, borrow_book, check_catalog_change, create_book, delete_book, get_book,
    list_books, return_book, update_book,
};
pub use catalog_seed::seed_catalog;
pub use errors::{BookApplicationError, Result};
