use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 図書館で認識されるロール
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// 閲覧・貸出・自分の貸出の返却
    LibraryUser,
    /// 蔵書の作成・更新・削除と強制返却
    LibraryCurator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::LibraryUser => "LIBRARY_USER",
            Role::LibraryCurator => "LIBRARY_CURATOR",
        }
    }

    /// トークンのクレーム値からロールを読み取る
    ///
    /// `ROLE_` / `SCOPE_` 接頭辞を取り除き、大文字小文字を区別せずに比較する。
    /// 未知の値は `None`。
    pub fn from_claim(value: &str) -> Option<Self> {
        let value = value.trim();
        let upper = value.to_ascii_uppercase();
        let name = upper
            .strip_prefix("ROLE_")
            .or_else(|| upper.strip_prefix("SCOPE_"))
            .unwrap_or(&upper);

        match name {
            "LIBRARY_USER" => Some(Role::LibraryUser),
            "LIBRARY_CURATOR" => Some(Role::LibraryCurator),
            _ => None,
        }
    }
}

/// 検証済みのクレームセット
///
/// 認証の協調者（API層）が生成する。ドメインは生の資格情報を扱わない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub subject: String,
    pub email: Option<String>,
    pub roles: BTreeSet<Role>,
}

impl Identity {
    pub fn new(
        subject: impl Into<String>,
        email: Option<String>,
        roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        Self {
            subject: subject.into(),
            email,
            roles: roles.into_iter().collect(),
        }
    }

    /// LIBRARY_USER ロールだけを持つ利用者
    pub fn library_user(email: impl Into<String>) -> Self {
        let email = email.into();
        Self::new(email.clone(), Some(email), [Role::LibraryUser])
    }

    /// LIBRARY_CURATOR ロールを持つ司書
    pub fn curator(email: impl Into<String>) -> Self {
        let email = email.into();
        Self::new(email.clone(), Some(email), [Role::LibraryCurator])
    }

    /// ロールを持たない認証済みの利用者
    pub fn without_roles(email: impl Into<String>) -> Self {
        let email = email.into();
        Self::new(email.clone(), Some(email), [])
    }

    /// 貸出者として記録される名前（emailがなければsubject）
    pub fn borrower_name(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.subject)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}
