use crate::domain::{
    AccessDenied, BookValidationError, BorrowBookError, ReturnBookError, policy::Operation,
};
use crate::ports::RepositoryError;
use thiserror::Error;

/// 蔵書管理アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum BookApplicationError {
    /// 書籍が見つからない
    #[error("Book not found")]
    BookNotFound,

    /// 認証済みだがロールが足りない
    #[error("Access denied for operation {}", .0.as_str())]
    Forbidden(Operation),

    /// 既に貸出中
    #[error("Book is already borrowed")]
    AlreadyBorrowed,

    /// 貸出中ではない
    #[error("Book is not borrowed")]
    NotBorrowed,

    /// 貸出者本人ではない
    #[error("Book is borrowed by another user")]
    NotOwner,

    /// 入力が不正
    #[error("Invalid book: {0}")]
    Validation(BookValidationError),

    /// ISBNの重複
    #[error("ISBN {0} is already registered")]
    DuplicateIsbn(String),

    /// リポジトリのエラー
    #[error("Book repository error")]
    RepositoryError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<AccessDenied> for BookApplicationError {
    fn from(err: AccessDenied) -> Self {
        BookApplicationError::Forbidden(err.operation)
    }
}

impl From<BookValidationError> for BookApplicationError {
    fn from(err: BookValidationError) -> Self {
        BookApplicationError::Validation(err)
    }
}

impl From<BorrowBookError> for BookApplicationError {
    fn from(err: BorrowBookError) -> Self {
        match err {
            BorrowBookError::AlreadyBorrowed => BookApplicationError::AlreadyBorrowed,
        }
    }
}

impl From<ReturnBookError> for BookApplicationError {
    fn from(err: ReturnBookError) -> Self {
        match err {
            ReturnBookError::NotBorrowed => BookApplicationError::NotBorrowed,
            ReturnBookError::NotOwner => BookApplicationError::NotOwner,
        }
    }
}

impl From<RepositoryError> for BookApplicationError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateIsbn(isbn) => BookApplicationError::DuplicateIsbn(isbn),
            RepositoryError::Backend(e) => BookApplicationError::RepositoryError(e),
        }
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, BookApplicationError>;
