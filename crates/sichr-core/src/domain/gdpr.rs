//! GDPR 동의 목적과 정보주체 요청 타입.

use serde::{Deserialize, Serialize};

/// 데이터 처리 동의 목적
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentPurpose {
    /// 서비스 제공에 필수
    Necessary,
    /// 이용 통계
    Analytics,
    /// 마케팅 메일
    Marketing,
    /// 임대인-임차인 메시지 처리
    Messaging,
    /// 열람 요청 데이터 공유
    ViewingData,
}

impl ConsentPurpose {
    /// 전체 목적 목록
    pub const ALL: [ConsentPurpose; 5] = [
        ConsentPurpose::Necessary,
        ConsentPurpose::Analytics,
        ConsentPurpose::Marketing,
        ConsentPurpose::Messaging,
        ConsentPurpose::ViewingData,
    ];

    /// 철회할 수 없는 목적인지 확인
    pub fn is_required(&self) -> bool {
        matches!(self, ConsentPurpose::Necessary)
    }
}

impl std::fmt::Display for ConsentPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsentPurpose::Necessary => write!(f, "necessary"),
            ConsentPurpose::Analytics => write!(f, "analytics"),
            ConsentPurpose::Marketing => write!(f, "marketing"),
            ConsentPurpose::Messaging => write!(f, "messaging"),
            ConsentPurpose::ViewingData => write!(f, "viewing_data"),
        }
    }
}

impl std::str::FromStr for ConsentPurpose {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "necessary" => Ok(ConsentPurpose::Necessary),
            "analytics" => Ok(ConsentPurpose::Analytics),
            "marketing" => Ok(ConsentPurpose::Marketing),
            "messaging" => Ok(ConsentPurpose::Messaging),
            "viewing_data" => Ok(ConsentPurpose::ViewingData),
            _ => Err(format!("Invalid consent purpose: {}", s)),
        }
    }
}

/// 정보주체 요청 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GdprRequestType {
    /// 열람/이동 (Art. 15, 20)
    Export,
    /// 삭제 (Art. 17)
    Deletion,
    /// 정정 (Art. 16)
    Rectification,
}

impl std::fmt::Display for GdprRequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GdprRequestType::Export => write!(f, "export"),
            GdprRequestType::Deletion => write!(f, "deletion"),
            GdprRequestType::Rectification => write!(f, "rectification"),
        }
    }
}

impl std::str::FromStr for GdprRequestType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "export" | "access" | "portability" => Ok(GdprRequestType::Export),
            "deletion" | "erasure" => Ok(GdprRequestType::Deletion),
            "rectification" => Ok(GdprRequestType::Rectification),
            _ => Err(format!("Invalid GDPR request type: {}", s)),
        }
    }
}

/// 정보주체 요청 처리 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GdprRequestStatus {
    Pending,
    Processing,
    Completed,
    Rejected,
}

impl GdprRequestStatus {
    /// 처리가 끝난 상태인지 확인
    pub fn is_resolved(&self) -> bool {
        matches!(self, GdprRequestStatus::Completed | GdprRequestStatus::Rejected)
    }
}

impl std::fmt::Display for GdprRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GdprRequestStatus::Pending => write!(f, "pending"),
            GdprRequestStatus::Processing => write!(f, "processing"),
            GdprRequestStatus::Completed => write!(f, "completed"),
            GdprRequestStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for GdprRequestStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(GdprRequestStatus::Pending),
            "processing" => Ok(GdprRequestStatus::Processing),
            "completed" => Ok(GdprRequestStatus::Completed),
            "rejected" => Ok(GdprRequestStatus::Rejected),
            _ => Err(format!("Invalid GDPR request status: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consent_purpose_parse() {
        assert_eq!(
            "viewing-data".parse::<ConsentPurpose>(),
            Ok(ConsentPurpose::ViewingData)
        );
        assert_eq!(ConsentPurpose::ViewingData.to_string(), "viewing_data");
        assert!(ConsentPurpose::Necessary.is_required());
        assert!(!ConsentPurpose::Marketing.is_required());
    }

    #[test]
    fn test_request_type_aliases() {
        assert_eq!("erasure".parse::<GdprRequestType>(), Ok(GdprRequestType::Deletion));
        assert_eq!("access".parse::<GdprRequestType>(), Ok(GdprRequestType::Export));
        assert!(GdprRequestStatus::Rejected.is_resolved());
        assert!(!GdprRequestStatus::Processing.is_resolved());
    }
}
