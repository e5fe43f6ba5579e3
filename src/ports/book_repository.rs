use crate::domain::{
    book::{Book, BookDetails, BorrowState},
    value_objects::BookId,
};
use async_trait::async_trait;
use thiserror::Error;

/// 蔵書リポジトリのエラー
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// ISBNが既に他の蔵書で使われている
    #[error("isbn {0} is already registered")]
    DuplicateIsbn(String),

    /// 永続化基盤の障害
    #[error("book repository backend error")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RepositoryError {
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        RepositoryError::Backend(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// 条件付き書き込みの結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalWrite {
    /// 期待した状態だったので書き込んだ
    Applied,
    /// 他の書き込みが先行していた（何も変更していない）
    Conflict,
    /// 蔵書が存在しない
    Missing,
}

/// 蔵書リポジトリポート
///
/// 貸出状態の更新は `compare_and_set_state` による条件付き書き込みのみで行う。
/// 同じ書籍への同時の貸出・返却のうち、期待した状態から遷移できるのは1つだけ。
/// 異なる書籍への操作は互いに待ち合わせない。
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// 全蔵書をISBN順で取得する
    async fn find_all(&self) -> Result<Vec<Book>>;

    /// IDで蔵書を取得する
    async fn find_by_id(&self, book_id: BookId) -> Result<Option<Book>>;

    /// 新しい蔵書を保存する
    ///
    /// ISBNが重複する場合は `RepositoryError::DuplicateIsbn`。
    async fn insert(&self, book: &Book) -> Result<()>;

    /// 書誌情報のみを更新する（貸出状態は変更しない）
    ///
    /// 存在しない場合は `Ok(None)`。更新後の蔵書を返す。
    async fn update_details(&self, book_id: BookId, details: &BookDetails)
    -> Result<Option<Book>>;

    /// 蔵書を削除する。削除した場合は `true`
    async fn delete(&self, book_id: BookId) -> Result<bool>;

    /// 貸出状態が `expected` のときだけ `new` に置き換える
    async fn compare_and_set_state(
        &self,
        book_id: BookId,
        expected: &BorrowState,
        new: &BorrowState,
    ) -> Result<ConditionalWrite>;
}
