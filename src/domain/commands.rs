use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, Identity};

/// 未検証の書誌情報入力
///
/// 作成・更新コマンドで共通に使う。検証は `BookDetails::parse` で行う。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookInput {
    pub isbn: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub authors: Vec<String>,
}

/// コマンド：蔵書を登録する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBook {
    pub requester: Identity,
    pub input: BookInput,
}

/// コマンド：書誌情報を更新する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBook {
    pub book_id: BookId,
    pub requester: Identity,
    pub input: BookInput,
}

/// コマンド：蔵書を削除する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteBook {
    pub book_id: BookId,
    pub requester: Identity,
}

/// コマンド：書籍を貸し出す
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowBook {
    pub book_id: BookId,
    pub requester: Identity,
    pub borrowed_at: DateTime<Utc>,
}

/// コマンド：書籍を返却する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnBook {
    pub book_id: BookId,
    pub requester: Identity,
}
