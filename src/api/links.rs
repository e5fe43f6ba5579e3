use crate::domain::BookId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// HALのリンク
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
}

impl Link {
    fn new(href: String) -> Self {
        Self { href }
    }
}

pub type Links = BTreeMap<String, Link>;

/// 書籍リソースのハイパーリンクを組み立てる
///
/// 公開URLとコンテキストパスだけを持つ状態のない整形処理。
/// ドメインやアプリケーション層からは呼ばれない。
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    base: String,
}

impl LinkBuilder {
    /// `public_url` = "http://localhost:9091", `context_path` = "/library-server"
    pub fn new(public_url: &str, context_path: &str) -> Self {
        let public_url = public_url.trim_end_matches('/');
        let context_path = context_path.trim_matches('/');
        let base = if context_path.is_empty() {
            public_url.to_string()
        } else {
            format!("{}/{}", public_url, context_path)
        };
        Self { base }
    }

    pub fn books(&self) -> String {
        format!("{}/books", self.base)
    }

    pub fn book(&self, book_id: BookId) -> String {
        format!("{}/books/{}", self.base, book_id)
    }

    /// 書籍1冊分のリンク（self, update, borrow, return）
    pub fn book_links(&self, book_id: BookId) -> Links {
        let book = self.book(book_id);
        BTreeMap::from([
            ("self".to_string(), Link::new(book.clone())),
            ("update".to_string(), Link::new(book.clone())),
            ("borrow".to_string(), Link::new(format!("{}/borrow", book))),
            ("return".to_string(), Link::new(format!("{}/return", book))),
        ])
    }

    /// 書籍一覧のリンク（self, create）
    pub fn collection_links(&self) -> Links {
        let books = self.books();
        BTreeMap::from([
            ("self".to_string(), Link::new(books.clone())),
            ("create".to_string(), Link::new(books)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_links() {
        let builder = LinkBuilder::new("http://localhost:9091/", "/library-server");
        let book_id = BookId::new();

        let links = builder.book_links(book_id);

        let expected = format!("http://localhost:9091/library-server/books/{}", book_id);
        assert_eq!(links["self"].href, expected);
        assert_eq!(links["update"].href, expected);
        assert_eq!(links["borrow"].href, format!("{}/borrow", expected));
        assert_eq!(links["return"].href, format!("{}/return", expected));
    }

    #[test]
    fn test_collection_links() {
        let builder = LinkBuilder::new("http://localhost:9091", "library-server");
        let links = builder.collection_links();

        assert_eq!(links.len(), 2);
        assert_eq!(
            links["self"].href,
            "http://localhost:9091/library-server/books"
        );
        assert_eq!(
            links["create"].href,
            "http://localhost:9091/library-server/books"
        );
    }

    #[test]
    fn test_empty_context_path() {
        let builder = LinkBuilder::new("https://library.example.com", "/");
        assert_eq!(builder.books(), "https://library.example.com/books");
    }
}
