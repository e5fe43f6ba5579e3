use crate::domain::{
    self, BookId, Identity,
    book::{Book, BookDetails},
    commands::*,
    policy::{self, Operation},
};
use crate::ports::*;
use chrono::SubsecRound;
use std::sync::Arc;

use super::errors::{BookApplicationError, Result};

/// サービスの依存関係
///
/// 振る舞いは持たず、ユースケース関数に明示的に渡す。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub book_repository: Arc<dyn BookRepository>,
}

/// 認可判定を行い、拒否された場合はログに残す
fn ensure_allowed(requester: &Identity, operation: Operation) -> Result<()> {
    policy::authorize(requester, operation).map_err(|denied| {
        tracing::warn!(
            subject = %requester.subject,
            operation = operation.as_str(),
            "access denied"
        );
        BookApplicationError::from(denied)
    })
}

/// リポジトリから蔵書を取得するヘルパー関数
///
/// 存在しない場合は BookNotFound。
async fn load_book(repository: &Arc<dyn BookRepository>, book_id: BookId) -> Result<Book> {
    repository
        .find_by_id(book_id)
        .await?
        .ok_or(BookApplicationError::BookNotFound)
}

/// カタログ管理操作（更新・削除）の前提チェック
///
/// チェック順：
/// 1. 蔵書を閲覧できること（できなければ Forbidden）
/// 2. 蔵書が存在すること（なければ BookNotFound）
/// 3. 司書であること（でなければ Forbidden）
///
/// 閲覧権限のない呼び出し元には存在の有無を明かさない。
/// 閲覧できる呼び出し元にとって存在の有無は既知の情報。
async fn load_for_catalog_change(
    deps: &ServiceDependencies,
    requester: &Identity,
    book_id: BookId,
    operation: Operation,
) -> Result<Book> {
    if !policy::can_read_catalog(requester) {
        // 閲覧できない呼び出し元は司書でもないので、ここで必ず拒否される
        ensure_allowed(requester, operation)?;
    }
    let book = load_book(&deps.book_repository, book_id).await?;
    ensure_allowed(requester, operation)?;
    Ok(book)
}

/// 書誌情報を読む前のカタログ管理操作の前提チェック
///
/// 入力を読めなかった場合でも、認可と存在のエラーを検証エラーより先に返す。
/// `book_id` が `None` なら登録、`Some` なら更新・削除の順序でチェックする。
pub async fn check_catalog_change(
    deps: &ServiceDependencies,
    requester: &Identity,
    book_id: Option<BookId>,
    operation: Operation,
) -> Result<()> {
    match book_id {
        Some(book_id) => {
            load_for_catalog_change(deps, requester, book_id, operation).await?;
            Ok(())
        }
        None => ensure_allowed(requester, operation),
    }
}

/// 蔵書一覧を取得する
pub async fn list_books(deps: &ServiceDependencies, requester: &Identity) -> Result<Vec<Book>> {
    ensure_allowed(requester, Operation::ListBooks)?;
    Ok(deps.book_repository.find_all().await?)
}

/// 蔵書を1冊取得する
pub async fn get_book(
    deps: &ServiceDependencies,
    requester: &Identity,
    book_id: BookId,
) -> Result<Book> {
    ensure_allowed(requester, Operation::ReadBook)?;
    load_book(&deps.book_repository, book_id).await
}

/// 蔵書を登録する
///
/// ビジネスルール：
/// - 司書のみ
/// - 書誌情報が妥当であること
/// - ISBNが他の蔵書と重複しないこと
pub async fn create_book(deps: &ServiceDependencies, cmd: CreateBook) -> Result<Book> {
    ensure_allowed(&cmd.requester, Operation::CreateBook)?;

    let details = BookDetails::parse(cmd.input)?;
    let book = domain::book::create_book(details);

    deps.book_repository.insert(&book).await?;

    tracing::info!(
        book_id = %book.book_id,
        isbn = %book.details.isbn,
        curator = %cmd.requester.subject,
        "book created"
    );
    Ok(book)
}

/// 書誌情報を更新する
///
/// ビジネスルール：
/// - 司書のみ（チェック順は `load_for_catalog_change` を参照）
/// - 貸出状態は変更しない
pub async fn update_book(deps: &ServiceDependencies, cmd: UpdateBook) -> Result<Book> {
    let book =
        load_for_catalog_change(deps, &cmd.requester, cmd.book_id, Operation::UpdateBook).await?;

    let details = BookDetails::parse(cmd.input)?;
    let updated = domain::book::update_details(&book, details);

    let stored = deps
        .book_repository
        .update_details(cmd.book_id, &updated.details)
        .await?
        .ok_or(BookApplicationError::BookNotFound)?;

    tracing::info!(
        book_id = %cmd.book_id,
        curator = %cmd.requester.subject,
        "book updated"
    );
    Ok(stored)
}

/// 蔵書を削除する
pub async fn delete_book(deps: &ServiceDependencies, cmd: DeleteBook) -> Result<()> {
    load_for_catalog_change(deps, &cmd.requester, cmd.book_id, Operation::DeleteBook).await?;

    if !deps.book_repository.delete(cmd.book_id).await? {
        return Err(BookApplicationError::BookNotFound);
    }

    tracing::info!(
        book_id = %cmd.book_id,
        curator = %cmd.requester.subject,
        "book deleted"
    );
    Ok(())
}

/// 書籍を貸し出す
///
/// ビジネスルール：
/// - LIBRARY_USER または司書
/// - 書籍が存在すること
/// - Available であること
///
/// 同じ書籍への同時貸出は条件付き書き込みで1つだけが成功する。
/// 競合に負けた場合は待たずに最新状態で判定し直し、AlreadyBorrowed を返す。
pub async fn borrow_book(deps: &ServiceDependencies, cmd: BorrowBook) -> Result<Book> {
    ensure_allowed(&cmd.requester, Operation::BorrowBook)?;

    let book = load_book(&deps.book_repository, cmd.book_id).await?;

    // ストレージの精度（マイクロ秒）に揃える
    let borrowed_at = cmd.borrowed_at.trunc_subsecs(6);
    let borrowed = domain::book::borrow_book(&book, &cmd.requester, borrowed_at)?;

    match deps
        .book_repository
        .compare_and_set_state(cmd.book_id, &book.state, &borrowed.state)
        .await?
    {
        ConditionalWrite::Applied => {
            tracing::info!(
                book_id = %cmd.book_id,
                borrower = cmd.requester.borrower_name(),
                "book borrowed"
            );
            Ok(borrowed)
        }
        ConditionalWrite::Missing => Err(BookApplicationError::BookNotFound),
        ConditionalWrite::Conflict => {
            let current = load_book(&deps.book_repository, cmd.book_id).await?;
            domain::book::borrow_book(&current, &cmd.requester, borrowed_at)?;
            Err(BookApplicationError::AlreadyBorrowed)
        }
    }
}

/// 書籍を返却する
///
/// ビジネスルール：
/// - LIBRARY_USER または司書
/// - 書籍が存在すること
/// - Borrowed であること
/// - 貸出者本人であること（司書は強制返却可能）
pub async fn return_book(deps: &ServiceDependencies, cmd: ReturnBook) -> Result<Book> {
    ensure_allowed(&cmd.requester, Operation::ReturnBook)?;

    let book = load_book(&deps.book_repository, cmd.book_id).await?;
    let returned = domain::book::return_book(&book, &cmd.requester)?;

    match deps
        .book_repository
        .compare_and_set_state(cmd.book_id, &book.state, &returned.state)
        .await?
    {
        ConditionalWrite::Applied => {
            tracing::info!(
                book_id = %cmd.book_id,
                borrower = book.state.borrowed_by().unwrap_or_default(),
                returned_by = cmd.requester.borrower_name(),
                "book returned"
            );
            Ok(returned)
        }
        ConditionalWrite::Missing => Err(BookApplicationError::BookNotFound),
        ConditionalWrite::Conflict => {
            let current = load_book(&deps.book_repository, cmd.book_id).await?;
            domain::book::return_book(&current, &cmd.requester)?;
            Err(BookApplicationError::NotBorrowed)
        }
    }
}
