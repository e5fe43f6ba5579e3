use crate::domain::{
    book::{Book, BookDetails, BorrowState},
    value_objects::{BookId, Isbn},
};
use crate::ports::book_repository::{
    BookRepository as BookRepositoryTrait, ConditionalWrite, RepositoryError, Result,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

/// booksテーブルのISBN一意制約名（マイグレーションと一致させる）
const ISBN_UNIQUE_CONSTRAINT: &str = "books_isbn_key";

const SELECT_COLUMNS: &str = r#"
    SELECT
        identifier,
        isbn,
        title,
        description,
        authors,
        borrowed_by,
        borrowed_at
    FROM books
"#;

/// PostgreSQLの行データをBookに変換する
///
/// borrowed_by と borrowed_at は両方揃っているか両方NULLのはずだが、
/// 片方だけの行はデータ不整合としてエラーにする。
fn map_row_to_book(row: &PgRow) -> Result<Book> {
    let isbn: String = row.try_get("isbn").map_err(RepositoryError::backend)?;
    let isbn = Isbn::parse(&isbn).map_err(|e| {
        RepositoryError::backend(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("invalid isbn in books table: {}", e),
        ))
    })?;

    let borrowed_by: Option<String> = row.try_get("borrowed_by").map_err(RepositoryError::backend)?;
    let borrowed_at: Option<DateTime<Utc>> =
        row.try_get("borrowed_at").map_err(RepositoryError::backend)?;
    let state = match (borrowed_by, borrowed_at) {
        (None, None) => BorrowState::Available,
        (Some(by), Some(since)) => BorrowState::Borrowed { by, since },
        _ => {
            return Err(RepositoryError::backend(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "borrowed_by and borrowed_at must be set together",
            )));
        }
    };

    Ok(Book {
        book_id: BookId::from_uuid(row.try_get("identifier").map_err(RepositoryError::backend)?),
        details: BookDetails {
            isbn,
            title: row.try_get("title").map_err(RepositoryError::backend)?,
            description: row.try_get("description").map_err(RepositoryError::backend)?,
            authors: row.try_get("authors").map_err(RepositoryError::backend)?,
        },
        state,
    })
}

/// 一意制約違反をDuplicateIsbnに変換する
fn map_write_error(err: sqlx::Error, details: &BookDetails) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.constraint() == Some(ISBN_UNIQUE_CONSTRAINT)
    {
        return RepositoryError::DuplicateIsbn(details.isbn.to_string());
    }
    RepositoryError::backend(err)
}

fn state_columns(state: &BorrowState) -> (Option<&str>, Option<DateTime<Utc>>) {
    (state.borrowed_by(), state.borrowed_date())
}

/// BookRepositoryのPostgreSQL実装
///
/// 貸出状態の更新は `WHERE borrowed_by IS NOT DISTINCT FROM ...` による
/// 条件付きUPDATEで行い、行ロック以上の排他は取らない。
pub struct BookRepository {
    pool: PgPool,
}

impl BookRepository {
    /// PostgreSQLコネクションプールから新しいBookRepositoryを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepositoryTrait for BookRepository {
    async fn find_all(&self) -> Result<Vec<Book>> {
        let rows = sqlx::query(&format!("{} ORDER BY isbn", SELECT_COLUMNS))
            .fetch_all(&self.pool)
            .await
            .map_err(RepositoryError::backend)?;

        rows.iter().map(map_row_to_book).collect()
    }

    async fn find_by_id(&self, book_id: BookId) -> Result<Option<Book>> {
        let row = sqlx::query(&format!("{} WHERE identifier = $1", SELECT_COLUMNS))
            .bind(book_id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::backend)?;

        row.as_ref().map(map_row_to_book).transpose()
    }

    async fn insert(&self, book: &Book) -> Result<()> {
        let (borrowed_by, borrowed_at) = state_columns(&book.state);

        sqlx::query(
            r#"
            INSERT INTO books (
                identifier,
                isbn,
                title,
                description,
                authors,
                borrowed_by,
                borrowed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(book.book_id.value())
        .bind(book.details.isbn.as_str())
        .bind(&book.details.title)
        .bind(&book.details.description)
        .bind(&book.details.authors)
        .bind(borrowed_by)
        .bind(borrowed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &book.details))?;

        Ok(())
    }

    async fn update_details(
        &self,
        book_id: BookId,
        details: &BookDetails,
    ) -> Result<Option<Book>> {
        let row = sqlx::query(
            r#"
            UPDATE books
            SET isbn = $2,
                title = $3,
                description = $4,
                authors = $5
            WHERE identifier = $1
            RETURNING
                identifier,
                isbn,
                title,
                description,
                authors,
                borrowed_by,
                borrowed_at
            "#,
        )
        .bind(book_id.value())
        .bind(details.isbn.as_str())
        .bind(&details.title)
        .bind(&details.description)
        .bind(&details.authors)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, details))?;

        row.as_ref().map(map_row_to_book).transpose()
    }

    async fn delete(&self, book_id: BookId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM books WHERE identifier = $1")
            .bind(book_id.value())
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::backend)?;

        Ok(result.rows_affected() == 1)
    }

    /// 期待した貸出状態の行だけを更新する
    ///
    /// 0行更新の場合は、行が存在するかどうかで Conflict と Missing を区別する。
    async fn compare_and_set_state(
        &self,
        book_id: BookId,
        expected: &BorrowState,
        new: &BorrowState,
    ) -> Result<ConditionalWrite> {
        let (expected_by, expected_at) = state_columns(expected);
        let (new_by, new_at) = state_columns(new);

        let result = sqlx::query(
            r#"
            UPDATE books
            SET borrowed_by = $4,
                borrowed_at = $5
            WHERE identifier = $1
              AND borrowed_by IS NOT DISTINCT FROM $2
              AND borrowed_at IS NOT DISTINCT FROM $3
            "#,
        )
        .bind(book_id.value())
        .bind(expected_by)
        .bind(expected_at)
        .bind(new_by)
        .bind(new_at)
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::backend)?;

        if result.rows_affected() == 1 {
            return Ok(ConditionalWrite::Applied);
        }

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM books WHERE identifier = $1)")
                .bind(book_id.value())
                .fetch_one(&self.pool)
                .await
                .map_err(RepositoryError::backend)?;

        Ok(if exists {
            ConditionalWrite::Conflict
        } else {
            ConditionalWrite::Missing
        })
    }
}
