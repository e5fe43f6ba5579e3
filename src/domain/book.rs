use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    BookId, BookValidationError, BorrowBookError, Identity, Isbn, ReturnBookError,
    commands::BookInput, policy,
};

// ============================================================================
// 書誌情報
// ============================================================================

/// 検証済みの書誌情報
///
/// 不変条件：
/// - isbn, title は空でない
/// - authors は1名以上、いずれも空白のみではない
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDetails {
    pub isbn: Isbn,
    pub title: String,
    pub description: String,
    pub authors: Vec<String>,
}

impl BookDetails {
    /// 未検証の入力から書誌情報を作る
    pub fn parse(input: BookInput) -> Result<Self, BookValidationError> {
        let isbn = Isbn::parse(&input.isbn)?;

        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(BookValidationError::EmptyTitle);
        }

        if input.authors.is_empty() {
            return Err(BookValidationError::NoAuthors);
        }
        let authors = input
            .authors
            .iter()
            .map(|author| {
                let author = author.trim();
                if author.is_empty() {
                    Err(BookValidationError::BlankAuthor)
                } else {
                    Ok(author.to_string())
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            isbn,
            title,
            description: input.description,
            authors,
        })
    }
}

// ============================================================================
// 貸出状態
// ============================================================================

/// 貸出状態
///
/// 「貸出中」と「貸出者・貸出日時」を1つの列挙型で表すことで、
/// borrowed == true ⇔ borrowed_by と borrowed_date が揃っている、
/// という不変条件を型で保証する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BorrowState {
    Available,
    Borrowed { by: String, since: DateTime<Utc> },
}

impl BorrowState {
    pub fn is_borrowed(&self) -> bool {
        matches!(self, BorrowState::Borrowed { .. })
    }

    pub fn borrowed_by(&self) -> Option<&str> {
        match self {
            BorrowState::Borrowed { by, .. } => Some(by),
            BorrowState::Available => None,
        }
    }

    pub fn borrowed_date(&self) -> Option<DateTime<Utc>> {
        match self {
            BorrowState::Borrowed { since, .. } => Some(*since),
            BorrowState::Available => None,
        }
    }
}

// ============================================================================
// Book集約
// ============================================================================

/// Book集約 - 蔵書1冊
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub book_id: BookId,
    pub details: BookDetails,
    pub state: BorrowState,
}

/// 純粋関数：蔵書を登録する
///
/// 新しいIDを採番し、貸出可能な状態で作成する。
pub fn create_book(details: BookDetails) -> Book {
    Book {
        book_id: BookId::new(),
        details,
        state: BorrowState::Available,
    }
}

/// 純粋関数：書誌情報を更新する
///
/// 貸出状態には触れない。
pub fn update_details(book: &Book, details: BookDetails) -> Book {
    Book {
        details,
        ..book.clone()
    }
}

/// 純粋関数：書籍を貸し出す
///
/// ビジネスルール：
/// - Available からのみ遷移可能
/// - 同じ利用者による再貸出も AlreadyBorrowed
/// - 貸出者は検証済みクレームから取る
pub fn borrow_book(
    book: &Book,
    requester: &Identity,
    borrowed_at: DateTime<Utc>,
) -> Result<Book, BorrowBookError> {
    if book.state.is_borrowed() {
        return Err(BorrowBookError::AlreadyBorrowed);
    }

    Ok(Book {
        state: BorrowState::Borrowed {
            by: requester.borrower_name().to_string(),
            since: borrowed_at,
        },
        ..book.clone()
    })
}

/// 純粋関数：書籍を返却する
///
/// ビジネスルール：
/// - Borrowed からのみ遷移可能
/// - 借りている本人のみ返却できる
/// - 司書（LIBRARY_CURATOR）は誰の貸出でも強制返却できる
pub fn return_book(book: &Book, requester: &Identity) -> Result<Book, ReturnBookError> {
    let borrower = match &book.state {
        BorrowState::Available => return Err(ReturnBookError::NotBorrowed),
        BorrowState::Borrowed { by, .. } => by,
    };

    if borrower != requester.borrower_name() && !policy::can_force_return(requester) {
        return Err(ReturnBookError::NotOwner);
    }

    Ok(Book {
        state: BorrowState::Available,
        ..book.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn input() -> BookInput {
        BookInput {
            isbn: "9780132350884".to_string(),
            title: "Clean Code".to_string(),
            description: "A Handbook of Agile Software Craftsmanship".to_string(),
            authors: vec!["Robert C. Martin".to_string()],
        }
    }

    fn available_book() -> Book {
        create_book(BookDetails::parse(input()).unwrap())
    }

    // TDD: BookDetails::parse() のテスト
    #[test]
    fn test_parse_details_trims_fields() {
        let details = BookDetails::parse(BookInput {
            title: "  Clean Code ".to_string(),
            authors: vec![" Robert C. Martin ".to_string()],
            ..input()
        })
        .unwrap();

        assert_eq!(details.title, "Clean Code");
        assert_eq!(details.authors, vec!["Robert C. Martin".to_string()]);
    }

    #[test]
    fn test_parse_details_rejects_invalid_input() {
        let cases = [
            (
                BookInput {
                    isbn: " ".to_string(),
                    ..input()
                },
                BookValidationError::EmptyIsbn,
            ),
            (
                BookInput {
                    title: String::new(),
                    ..input()
                },
                BookValidationError::EmptyTitle,
            ),
            (
                BookInput {
                    authors: vec![],
                    ..input()
                },
                BookValidationError::NoAuthors,
            ),
            (
                BookInput {
                    authors: vec!["Kent Beck".to_string(), "  ".to_string()],
                    ..input()
                },
                BookValidationError::BlankAuthor,
            ),
        ];

        for (input, expected) in cases {
            assert_eq!(BookDetails::parse(input), Err(expected));
        }
    }

    #[test]
    fn test_parse_details_allows_empty_description() {
        let details = BookDetails::parse(BookInput {
            description: String::new(),
            ..input()
        });
        assert!(details.is_ok());
    }

    // TDD: create_book() のテスト
    #[test]
    fn test_create_book_starts_available() {
        let book = available_book();
        assert_eq!(book.state, BorrowState::Available);
        assert!(!book.state.is_borrowed());
        assert_eq!(book.state.borrowed_by(), None);
        assert_eq!(book.state.borrowed_date(), None);
    }

    #[test]
    fn test_create_book_assigns_fresh_id() {
        let details = BookDetails::parse(input()).unwrap();
        let first = create_book(details.clone());
        let second = create_book(details);
        assert_ne!(first.book_id, second.book_id);
    }

    // TDD: borrow_book() のテスト
    #[test]
    fn test_borrow_book_success() {
        let book = available_book();
        let bruce = Identity::library_user("bruce.wayne@example.com");
        let now = Utc::now();

        let borrowed = borrow_book(&book, &bruce, now).unwrap();

        assert!(borrowed.state.is_borrowed());
        assert_eq!(borrowed.state.borrowed_by(), Some("bruce.wayne@example.com"));
        assert_eq!(borrowed.state.borrowed_date(), Some(now));
        assert_eq!(borrowed.book_id, book.book_id);
        assert_eq!(borrowed.details, book.details);
    }

    #[test]
    fn test_borrow_book_fails_when_already_borrowed() {
        let book = available_book();
        let bruce = Identity::library_user("bruce.wayne@example.com");
        let clark = Identity::library_user("clark.kent@example.com");
        let now = Utc::now();

        let borrowed = borrow_book(&book, &bruce, now).unwrap();

        // 別の利用者
        assert_eq!(
            borrow_book(&borrowed, &clark, now + Duration::minutes(1)),
            Err(BorrowBookError::AlreadyBorrowed)
        );
        // 同じ利用者による再貸出
        assert_eq!(
            borrow_book(&borrowed, &bruce, now + Duration::minutes(1)),
            Err(BorrowBookError::AlreadyBorrowed)
        );
    }

    // TDD: return_book() のテスト
    #[test]
    fn test_borrow_then_return_restores_available() {
        let book = available_book();
        let bruce = Identity::library_user("bruce.wayne@example.com");

        let borrowed = borrow_book(&book, &bruce, Utc::now()).unwrap();
        let returned = return_book(&borrowed, &bruce).unwrap();

        assert_eq!(returned, book);
        assert_eq!(returned.state.borrowed_by(), None);
        assert_eq!(returned.state.borrowed_date(), None);
    }

    #[test]
    fn test_return_book_fails_when_not_borrowed() {
        let book = available_book();
        let bruce = Identity::library_user("bruce.wayne@example.com");

        assert_eq!(
            return_book(&book, &bruce),
            Err(ReturnBookError::NotBorrowed)
        );
    }

    #[test]
    fn test_return_book_fails_for_other_user() {
        let book = available_book();
        let bruce = Identity::library_user("bruce.wayne@example.com");
        let clark = Identity::library_user("clark.kent@example.com");

        let borrowed = borrow_book(&book, &bruce, Utc::now()).unwrap();

        assert_eq!(
            return_book(&borrowed, &clark),
            Err(ReturnBookError::NotOwner)
        );
    }

    #[test]
    fn test_curator_can_force_return() {
        let book = available_book();
        let bruce = Identity::library_user("bruce.wayne@example.com");
        let alfred = Identity::curator("alfred@example.com");

        let borrowed = borrow_book(&book, &bruce, Utc::now()).unwrap();
        let returned = return_book(&borrowed, &alfred).unwrap();

        assert_eq!(returned.state, BorrowState::Available);
    }

    #[test]
    fn test_borrower_matched_by_subject_without_email() {
        let book = available_book();
        let subject_only = Identity::new("sub-1234", None, [crate::domain::Role::LibraryUser]);

        let borrowed = borrow_book(&book, &subject_only, Utc::now()).unwrap();
        assert_eq!(borrowed.state.borrowed_by(), Some("sub-1234"));
        assert!(return_book(&borrowed, &subject_only).is_ok());
    }

    // TDD: update_details() のテスト
    #[test]
    fn test_update_details_keeps_borrow_state() {
        let book = available_book();
        let bruce = Identity::library_user("bruce.wayne@example.com");
        let borrowed = borrow_book(&book, &bruce, Utc::now()).unwrap();

        let details = BookDetails::parse(BookInput {
            title: "Clean Code (2nd printing)".to_string(),
            ..input()
        })
        .unwrap();
        let updated = update_details(&borrowed, details);

        assert_eq!(updated.details.title, "Clean Code (2nd printing)");
        assert_eq!(updated.state, borrowed.state);
        assert_eq!(updated.book_id, borrowed.book_id);
    }
}
