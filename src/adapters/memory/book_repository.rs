use crate::domain::{
    book::{Book, BookDetails, BorrowState},
    value_objects::BookId,
};
use crate::ports::book_repository::{
    BookRepository as BookRepositoryTrait, ConditionalWrite, RepositoryError, Result,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

#[derive(Debug, thiserror::Error)]
#[error("in-memory book store lock poisoned")]
struct LockPoisoned;

fn poisoned<T>(_: T) -> RepositoryError {
    RepositoryError::backend(LockPoisoned)
}

/// BookRepositoryのインメモリ実装
///
/// 蔵書ごとに `Mutex` を持ち、貸出状態の条件付き書き込みは
/// その書籍のロックだけを取って行う。カタログの追加・更新・削除は
/// マップ全体の書き込みロックで直列化する。
pub struct BookRepository {
    books: RwLock<HashMap<BookId, Arc<Mutex<Book>>>>,
}

impl BookRepository {
    pub fn new() -> Self {
        Self {
            books: RwLock::new(HashMap::new()),
        }
    }

    fn entry(&self, book_id: BookId) -> Result<Option<Arc<Mutex<Book>>>> {
        let books = self.books.read().map_err(poisoned)?;
        Ok(books.get(&book_id).cloned())
    }
}

impl Default for BookRepository {
    fn default() -> Self {
        Self::new()
    }
}

/// `exclude` 以外の蔵書が同じISBNを持っているか
fn isbn_taken(
    books: &HashMap<BookId, Arc<Mutex<Book>>>,
    details: &BookDetails,
    exclude: Option<BookId>,
) -> Result<bool> {
    for (book_id, book) in books {
        if Some(*book_id) == exclude {
            continue;
        }
        if book.lock().map_err(poisoned)?.details.isbn == details.isbn {
            return Ok(true);
        }
    }
    Ok(false)
}

#[async_trait]
impl BookRepositoryTrait for BookRepository {
    async fn find_all(&self) -> Result<Vec<Book>> {
        let books = self.books.read().map_err(poisoned)?;
        let mut all = books
            .values()
            .map(|book| book.lock().map(|b| b.clone()).map_err(poisoned))
            .collect::<Result<Vec<_>>>()?;
        all.sort_by(|a, b| a.details.isbn.as_str().cmp(b.details.isbn.as_str()));
        Ok(all)
    }

    async fn find_by_id(&self, book_id: BookId) -> Result<Option<Book>> {
        match self.entry(book_id)? {
            Some(book) => Ok(Some(book.lock().map_err(poisoned)?.clone())),
            None => Ok(None),
        }
    }

    async fn insert(&self, book: &Book) -> Result<()> {
        let mut books = self.books.write().map_err(poisoned)?;
        if isbn_taken(&books, &book.details, None)? {
            return Err(RepositoryError::DuplicateIsbn(
                book.details.isbn.to_string(),
            ));
        }
        books.insert(book.book_id, Arc::new(Mutex::new(book.clone())));
        Ok(())
    }

    async fn update_details(
        &self,
        book_id: BookId,
        details: &BookDetails,
    ) -> Result<Option<Book>> {
        let books = self.books.write().map_err(poisoned)?;
        let Some(entry) = books.get(&book_id) else {
            return Ok(None);
        };
        if isbn_taken(&books, details, Some(book_id))? {
            return Err(RepositoryError::DuplicateIsbn(details.isbn.to_string()));
        }

        let mut book = entry.lock().map_err(poisoned)?;
        book.details = details.clone();
        Ok(Some(book.clone()))
    }

    async fn delete(&self, book_id: BookId) -> Result<bool> {
        let mut books = self.books.write().map_err(poisoned)?;
        Ok(books.remove(&book_id).is_some())
    }

    async fn compare_and_set_state(
        &self,
        book_id: BookId,
        expected: &BorrowState,
        new: &BorrowState,
    ) -> Result<ConditionalWrite> {
        let Some(entry) = self.entry(book_id)? else {
            return Ok(ConditionalWrite::Missing);
        };

        let mut book = entry.lock().map_err(poisoned)?;
        if &book.state != expected {
            return Ok(ConditionalWrite::Conflict);
        }
        book.state = new.clone();
        Ok(ConditionalWrite::Applied)
    }
}
