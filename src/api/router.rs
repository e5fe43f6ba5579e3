use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, borrow_book, create_book, delete_book, get_book, list_books, return_book,
    update_book,
};

/// Creates the API router with all book endpoints
///
/// Nested under `AppState::context_path`:
/// - GET    /books            - List books
/// - POST   /books            - Create a book (curator)
/// - GET    /books/:id        - Get a book
/// - PUT    /books/:id        - Update a book (curator)
/// - DELETE /books/:id        - Delete a book (curator)
/// - POST   /books/:id/borrow - Borrow a book
/// - POST   /books/:id/return - Return a book
///
/// `/health` stays at the root and needs no credentials.
pub fn create_router(state: Arc<AppState>) -> Router {
    let books = Router::new()
        .route("/books", get(list_books).post(create_book))
        .route(
            "/books/:id",
            get(get_book).put(update_book).delete(delete_book),
        )
        .route("/books/:id/borrow", post(borrow_book))
        .route("/books/:id/return", post(return_book));

    let context_path = state.context_path.trim_matches('/');
    let app = Router::new().route("/health", get(health_check));
    let app = if context_path.is_empty() {
        app.merge(books)
    } else {
        app.nest(&format!("/{}", context_path), books)
    };

    app
        // Add tracing middleware
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
