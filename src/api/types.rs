use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{BookValidationError, book::Book, commands::BookInput};

use super::links::{LinkBuilder, Links};

/// 書籍の作成・更新リクエスト
///
/// ハンドラーは本文をバイト列で受け取り、`from_body` で読む。
/// 読めない本文も認可チェックの後で検証エラーとして扱うので、
/// 権限のない呼び出し元にはペイロードの内容に関係なく 403 が返る。
/// `identifier` や `borrowed` などのフィールドは無視する。
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BookRequest {
    pub isbn: String,
    pub title: String,
    pub description: String,
    pub authors: Vec<String>,
}

impl BookRequest {
    /// JSON本文を読む。Content-Type は問わない
    pub fn from_body(body: &[u8]) -> Result<Self, BookValidationError> {
        Json::<Self>::from_bytes(body)
            .map(|Json(request)| request)
            .map_err(|rejection| BookValidationError::MalformedBody(rejection.body_text()))
    }

    pub fn into_input(self) -> BookInput {
        BookInput {
            isbn: self.isbn,
            title: self.title,
            description: self.description,
            authors: self.authors,
        }
    }
}

/// 書籍リソース（HAL）
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResource {
    pub identifier: Uuid,
    pub isbn: String,
    pub title: String,
    pub description: String,
    pub authors: Vec<String>,
    pub borrowed: bool,
    pub borrowed_by: Option<String>,
    pub borrowed_date: Option<DateTime<Utc>>,
    #[serde(rename = "_links")]
    pub links: Links,
}

impl BookResource {
    pub fn new(book: Book, links: &LinkBuilder) -> Self {
        Self {
            identifier: book.book_id.value(),
            borrowed: book.state.is_borrowed(),
            borrowed_by: book.state.borrowed_by().map(str::to_string),
            borrowed_date: book.state.borrowed_date(),
            links: links.book_links(book.book_id),
            isbn: book.details.isbn.to_string(),
            title: book.details.title,
            description: book.details.description,
            authors: book.details.authors,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedBooks {
    pub book_resource_list: Vec<BookResource>,
}

/// 書籍一覧リソース（HAL）
///
/// 空の場合は `_embedded` を省略する。
#[derive(Debug, Serialize, Deserialize)]
pub struct BookCollectionResource {
    #[serde(rename = "_embedded", default, skip_serializing_if = "Option::is_none")]
    pub embedded: Option<EmbeddedBooks>,
    #[serde(rename = "_links")]
    pub links: Links,
}

impl BookCollectionResource {
    pub fn new(books: Vec<Book>, links: &LinkBuilder) -> Self {
        let embedded = (!books.is_empty()).then(|| EmbeddedBooks {
            book_resource_list: books
                .into_iter()
                .map(|book| BookResource::new(book, links))
                .collect(),
        });

        Self {
            embedded,
            links: links.collection_links(),
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_body_ignores_server_owned_fields() {
        let request = BookRequest::from_body(
            br#"{"isbn":"1234566","title":"title","authors":["Author"],"borrowed":true}"#,
        )
        .unwrap();

        assert_eq!(request.isbn, "1234566");
        assert_eq!(request.description, "");
        assert_eq!(request.authors, vec!["Author".to_string()]);
    }

    #[test]
    fn test_from_body_rejects_malformed_json() {
        let bodies: [&[u8]; 3] = [b"not json", br#"{"authors":5}"#, b""];
        for body in bodies {
            assert!(matches!(
                BookRequest::from_body(body),
                Err(BookValidationError::MalformedBody(_))
            ));
        }
    }
}
