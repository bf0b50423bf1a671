//! 사용자 역할.

use serde::{Deserialize, Serialize};

/// 사용자 역할
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// 임차인 (기본값)
    #[default]
    Tenant,
    /// 임대인 (매물 등록 가능)
    Landlord,
    /// 관리자
    Admin,
}

impl UserRole {
    /// 매물을 등록할 수 있는 역할인지 확인
    pub fn can_list_apartments(&self) -> bool {
        matches!(self, UserRole::Landlord | UserRole::Admin)
    }

    /// 관리자 여부
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Tenant => write!(f, "tenant"),
            UserRole::Landlord => write!(f, "landlord"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tenant" | "applicant" => Ok(UserRole::Tenant),
            "landlord" | "owner" => Ok(UserRole::Landlord),
            "admin" => Ok(UserRole::Admin),
            _ => Err(format!("Invalid user role: {}", s)),
        }
    }
}
