use crate::application::book::{
    BookApplicationError, ServiceDependencies, borrow_book as execute_borrow_book,
    check_catalog_change, create_book as execute_create_book,
    delete_book as execute_delete_book, get_book as execute_get_book,
    list_books as execute_list_books, return_book as execute_return_book,
    update_book as execute_update_book,
};
use crate::domain::{
    BookId, Identity,
    commands::{BookInput, BorrowBook, CreateBook, DeleteBook, ReturnBook, UpdateBook},
    policy::Operation,
};
use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use super::{
    auth::{Caller, TokenVerifier},
    error::ApiError,
    links::LinkBuilder,
    types::{BookCollectionResource, BookRequest, BookResource},
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
pub struct AppState {
    pub service_deps: ServiceDependencies,
    pub token_verifier: Arc<dyn TokenVerifier>,
    pub links: LinkBuilder,
    /// 書籍APIをネストするパス（例: "/library-server"）
    pub context_path: String,
}

// ============================================================================
// Query handlers (GET)
// ============================================================================

/// GET /books - 蔵書一覧
pub async fn list_books(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
) -> Result<Json<BookCollectionResource>, ApiError> {
    let books = execute_list_books(&state.service_deps, &identity).await?;
    Ok(Json(BookCollectionResource::new(books, &state.links)))
}

/// GET /books/:id - 蔵書詳細
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
    Path(book_id): Path<Uuid>,
) -> Result<Json<BookResource>, ApiError> {
    let book = execute_get_book(&state.service_deps, &identity, BookId::from_uuid(book_id)).await?;
    Ok(Json(BookResource::new(book, &state.links)))
}

// ============================================================================
// Command handlers (POST / PUT / DELETE)
// ============================================================================

/// 本文を書誌情報として読む
///
/// 読めない場合も認可と存在のチェックを先に行い、通ったときだけ検証エラーにする。
async fn read_book_request(
    state: &AppState,
    requester: &Identity,
    book_id: Option<BookId>,
    operation: Operation,
    body: &[u8],
) -> Result<BookInput, ApiError> {
    match BookRequest::from_body(body) {
        Ok(request) => Ok(request.into_input()),
        Err(err) => {
            check_catalog_change(&state.service_deps, requester, book_id, operation).await?;
            Err(BookApplicationError::from(err).into())
        }
    }
}

/// POST /books - 蔵書を登録（司書のみ）
///
/// 201 Created と Location ヘッダーを返す。
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let input = read_book_request(&state, &identity, None, Operation::CreateBook, &body).await?;
    let cmd = CreateBook {
        requester: identity,
        input,
    };

    let book = execute_create_book(&state.service_deps, cmd).await?;
    let location = state.links.book(book.book_id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(BookResource::new(book, &state.links)),
    ))
}

/// PUT /books/:id - 書誌情報を更新（司書のみ）
pub async fn update_book(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
    Path(book_id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<BookResource>, ApiError> {
    let book_id = BookId::from_uuid(book_id);
    let input = read_book_request(
        &state,
        &identity,
        Some(book_id),
        Operation::UpdateBook,
        &body,
    )
    .await?;
    let cmd = UpdateBook {
        book_id,
        requester: identity,
        input,
    };

    let book = execute_update_book(&state.service_deps, cmd).await?;
    Ok(Json(BookResource::new(book, &state.links)))
}

/// DELETE /books/:id - 蔵書を削除（司書のみ）
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
    Path(book_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let cmd = DeleteBook {
        book_id: BookId::from_uuid(book_id),
        requester: identity,
    };

    execute_delete_book(&state.service_deps, cmd).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /books/:id/borrow - 書籍を借りる
///
/// 貸出者はトークンのクレームから決まる。リクエストボディは読まない。
pub async fn borrow_book(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
    Path(book_id): Path<Uuid>,
) -> Result<Json<BookResource>, ApiError> {
    let cmd = BorrowBook {
        book_id: BookId::from_uuid(book_id),
        requester: identity,
        borrowed_at: chrono::Utc::now(),
    };

    let book = execute_borrow_book(&state.service_deps, cmd).await?;
    Ok(Json(BookResource::new(book, &state.links)))
}

/// POST /books/:id/return - 書籍を返却する
pub async fn return_book(
    State(state): State<Arc<AppState>>,
    Caller(identity): Caller,
    Path(book_id): Path<Uuid>,
) -> Result<Json<BookResource>, ApiError> {
    let cmd = ReturnBook {
        book_id: BookId::from_uuid(book_id),
        requester: identity,
    };

    let book = execute_return_book(&state.service_deps, cmd).await?;
    Ok(Json(BookResource::new(book, &state.links)))
}
