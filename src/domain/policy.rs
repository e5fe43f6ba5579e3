use serde::{Deserialize, Serialize};

use super::{AccessDenied, Identity, Role};

/// 認可の対象となる操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    ListBooks,
    ReadBook,
    CreateBook,
    UpdateBook,
    DeleteBook,
    BorrowBook,
    ReturnBook,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ListBooks => "list_books",
            Operation::ReadBook => "read_book",
            Operation::CreateBook => "create_book",
            Operation::UpdateBook => "update_book",
            Operation::DeleteBook => "delete_book",
            Operation::BorrowBook => "borrow_book",
            Operation::ReturnBook => "return_book",
        }
    }
}

/// 蔵書の閲覧が可能か（LIBRARY_USER または LIBRARY_CURATOR）
pub fn can_read_catalog(identity: &Identity) -> bool {
    identity.has_role(Role::LibraryUser) || identity.has_role(Role::LibraryCurator)
}

/// 他人の貸出を強制返却できるか
pub fn can_force_return(identity: &Identity) -> bool {
    identity.has_role(Role::LibraryCurator)
}

/// 純粋関数：操作ごとの認可判定
///
/// ルール：
/// - 一覧・参照・貸出・返却：LIBRARY_USER または LIBRARY_CURATOR
/// - 作成・更新・削除：LIBRARY_CURATOR のみ
pub fn authorize(identity: &Identity, operation: Operation) -> Result<(), AccessDenied> {
    let allowed = match operation {
        Operation::ListBooks
        | Operation::ReadBook
        | Operation::BorrowBook
        | Operation::ReturnBook => can_read_catalog(identity),
        Operation::CreateBook | Operation::UpdateBook | Operation::DeleteBook => {
            identity.has_role(Role::LibraryCurator)
        }
    };

    if allowed {
        Ok(())
    } else {
        Err(AccessDenied { operation })
    }
}
