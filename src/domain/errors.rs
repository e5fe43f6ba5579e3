use super::policy::Operation;

/// 貸出のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BorrowBookError {
    /// 既に貸出中（同じ利用者による再貸出も含む）
    AlreadyBorrowed,
}

/// 返却のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnBookError {
    /// 貸出中ではない
    NotBorrowed,
    /// 借りている本人ではなく、強制返却の権限もない
    NotOwner,
}

/// 書籍入力のバリデーションエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookValidationError {
    EmptyIsbn,
    EmptyTitle,
    NoAuthors,
    BlankAuthor,
    /// リクエスト本文を書誌情報として読めない
    MalformedBody(String),
}

impl std::fmt::Display for BookValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            BookValidationError::EmptyIsbn => "isbn must not be empty",
            BookValidationError::EmptyTitle => "title must not be empty",
            BookValidationError::NoAuthors => "at least one author is required",
            BookValidationError::BlankAuthor => "author names must not be blank",
            BookValidationError::MalformedBody(reason) => {
                return write!(f, "malformed request body: {}", reason);
            }
        };
        f.write_str(message)
    }
}

/// 認可エラー：認証済みだが権限が足りない
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDenied {
    pub operation: Operation,
}
