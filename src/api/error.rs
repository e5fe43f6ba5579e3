use crate::application::book::BookApplicationError;
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use super::{auth::AuthError, types::ErrorResponse};

/// API層のエラー型
///
/// 認証エラーとアプリケーション層のエラーをHTTPレスポンスにマッピングする。
#[derive(Debug)]
pub enum ApiError {
    Unauthenticated(AuthError),
    Application(BookApplicationError),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthenticated(err)
    }
}

impl From<BookApplicationError> for ApiError {
    fn from(err: BookApplicationError) -> Self {
        ApiError::Application(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            // 401 Unauthorized - 資格情報がない、または検証できない
            ApiError::Unauthenticated(e) => {
                let body = Json(ErrorResponse::new("UNAUTHENTICATED", e.to_string()));
                let mut response = (StatusCode::UNAUTHORIZED, body).into_response();
                response.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static("Bearer realm=\"library-server\""),
                );
                return response;
            }
            ApiError::Application(e) => e,
        };

        let (status, error_type) = match &err {
            // 404 Not Found
            BookApplicationError::BookNotFound => (StatusCode::NOT_FOUND, "BOOK_NOT_FOUND"),

            // 403 Forbidden - ロール不足、または他人の貸出
            BookApplicationError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            BookApplicationError::NotOwner => (StatusCode::FORBIDDEN, "NOT_OWNER"),

            // 409 Conflict - 貸出状態と矛盾する操作
            BookApplicationError::AlreadyBorrowed => (StatusCode::CONFLICT, "ALREADY_BORROWED"),
            BookApplicationError::NotBorrowed => (StatusCode::CONFLICT, "NOT_BORROWED"),

            // 400 Bad Request - 入力不正
            BookApplicationError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            BookApplicationError::DuplicateIsbn(_) => (StatusCode::BAD_REQUEST, "DUPLICATE_ISBN"),

            // 500 Internal Server Error - システム障害
            // 詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            BookApplicationError::RepositoryError(e) => {
                tracing::error!("Book repository error: {}", e);
                let body = Json(ErrorResponse::new(
                    "REPOSITORY_ERROR",
                    "An unexpected error occurred",
                ));
                return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
            }
        };

        let body = Json(ErrorResponse::new(error_type, err.to_string()));
        (status, body).into_response()
    }
}
