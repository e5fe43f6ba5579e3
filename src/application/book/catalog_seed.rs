use crate::domain::{
    BookId,
    book::{Book, BookDetails, BorrowState},
    commands::BookInput,
};
use uuid::Uuid;

use super::{ServiceDependencies, errors::Result};

pub const BOOK_CLEAN_CODE_ID: BookId =
    BookId::from_uuid(Uuid::from_u128(0xf9bf70d6_e56d_4cab_be1b_f9c8e5be1d4c));
pub const BOOK_CLOUD_NATIVE_JAVA_ID: BookId =
    BookId::from_uuid(Uuid::from_u128(0x3038627d_627e_448d_8422_0a5705c9e8f1));
pub const BOOK_SPRING_ACTION_ID: BookId =
    BookId::from_uuid(Uuid::from_u128(0x9b0c1d25_8ad0_4a2a_9e0a_d1a4ac4e6b9c));
pub const BOOK_DEVOPS_ID: BookId =
    BookId::from_uuid(Uuid::from_u128(0x02c3d1fb_ca26_4ab9_b0f2_f2b0d8b5c0a7));

fn entry(isbn: &str, title: &str, description: &str, authors: &[&str]) -> BookInput {
    BookInput {
        isbn: isbn.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        authors: authors.iter().map(|a| a.to_string()).collect(),
    }
}

/// デモ用の初期蔵書
fn catalog() -> Vec<(BookId, BookInput)> {
    vec![
        (
            BOOK_CLEAN_CODE_ID,
            entry(
                "9780132350884",
                "Clean Code",
                "Even bad code can function. But if code isn't clean, it can bring a \
                 development organization to its knees.",
                &["Robert C. Martin", "Dean Wampler"],
            ),
        ),
        (
            BOOK_CLOUD_NATIVE_JAVA_ID,
            entry(
                "9781449374648",
                "Cloud Native Java",
                "Designing Resilient Systems with Spring Boot, Spring Cloud, and Cloud Foundry",
                &["Josh Long", "Kenny Bastani"],
            ),
        ),
        (
            BOOK_SPRING_ACTION_ID,
            entry(
                "9781617291203",
                "Spring in Action: Covers Spring 4",
                "Spring in Action, Fourth Edition is a hands-on guide to the Spring Framework.",
                &["Craig Walls"],
            ),
        ),
        (
            BOOK_DEVOPS_ID,
            entry(
                "9781430244691",
                "DevOps for Developers",
                "Integrate Development and Operations, The Agile Way",
                &["Michael Hüttermann"],
            ),
        ),
    ]
}

/// 空のリポジトリにデモ用の蔵書を登録する
///
/// 既に蔵書がある場合は何もしない。登録した冊数を返す。
pub async fn seed_catalog(deps: &ServiceDependencies) -> Result<usize> {
    if !deps.book_repository.find_all().await?.is_empty() {
        tracing::debug!("catalog already populated, skipping seed");
        return Ok(0);
    }

    let mut seeded = 0;
    for (book_id, input) in catalog() {
        let book = Book {
            book_id,
            details: BookDetails::parse(input)?,
            state: BorrowState::Available,
        };
        deps.book_repository.insert(&book).await?;
        seeded += 1;
    }

    tracing::info!(count = seeded, "seeded demo catalog");
    Ok(seeded)
}
