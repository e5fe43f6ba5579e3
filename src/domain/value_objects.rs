use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::BookValidationError;

/// 書籍ID - 蔵書の集約ID
///
/// 作成時に一度だけ採番され、以後変更されない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookId(Uuid);

impl BookId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// ISBN
///
/// 不変条件：空文字列（空白のみを含む）は作成できない。
/// 前後の空白は取り除いて保持する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Isbn(String);

impl Isbn {
    pub fn parse(value: impl AsRef<str>) -> Result<Self, BookValidationError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(BookValidationError::EmptyIsbn);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Isbn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_id_creation() {
        let id1 = BookId::new();
        let id2 = BookId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_book_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = BookId::from_uuid(uuid);
        assert_eq!(id.value(), uuid);
        assert_eq!(id.to_string(), uuid.to_string());
    }

    #[test]
    fn test_isbn_parse_trims_whitespace() {
        let isbn = Isbn::parse("  9781617291203 ").unwrap();
        assert_eq!(isbn.as_str(), "9781617291203");
    }

    #[test]
    fn test_isbn_parse_rejects_empty() {
        assert_eq!(Isbn::parse(""), Err(BookValidationError::EmptyIsbn));
        assert_eq!(Isbn::parse("   "), Err(BookValidationError::EmptyIsbn));
    }
}
