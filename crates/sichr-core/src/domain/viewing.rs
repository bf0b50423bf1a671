//! 열람(뷰잉) 요청 상태와 전이 규칙.
//!
//! ```text
//! pending ──► approved ──► completed
//!    │           │
//!    ├──► rejected
//!    └──► cancelled ◄──┘
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 열람 요청 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewingStatus {
    /// 임대인 응답 대기
    #[default]
    Pending,
    /// 승인됨
    Approved,
    /// 거절됨
    Rejected,
    /// 취소됨
    Cancelled,
    /// 열람 완료
    Completed,
}

/// 상태 전이 실패 사유
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// 전이 표에 없는 변경
    #[error("상태 전이 불가: {from} → {to}")]
    InvalidTransition {
        from: ViewingStatus,
        to: ViewingStatus,
    },

    /// 요청자에게 권한이 없는 변경
    #[error("'{to}' 상태로 변경할 권한이 없습니다")]
    NotPermitted { to: ViewingStatus },
}

/// 상태 변경을 요청한 당사자
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewingActor {
    /// 요청을 만든 임차인
    Tenant,
    /// 매물 소유자
    Landlord,
    /// 관리자
    Admin,
}

impl ViewingStatus {
    /// 더 이상 변경할 수 없는 상태인지 확인
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ViewingStatus::Rejected | ViewingStatus::Cancelled | ViewingStatus::Completed
        )
    }

    /// 전이 표 확인
    pub fn can_transition_to(&self, next: ViewingStatus) -> bool {
        use ViewingStatus::*;
        matches!(
            (self, next),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Approved, Completed)
                | (Approved, Cancelled)
        )
    }

    /// 전이 표와 당사자 권한을 함께 검사
    ///
    /// 승인/거절/완료는 임대인, 취소는 양 당사자가 할 수 있고
    /// 관리자는 전이 표가 허용하는 모든 변경이 가능합니다.
    pub fn transition(
        &self,
        next: ViewingStatus,
        actor: ViewingActor,
    ) -> Result<ViewingStatus, TransitionError> {
        if !self.can_transition_to(next) {
            return Err(TransitionError::InvalidTransition { from: *self, to: next });
        }

        let permitted = match (actor, next) {
            (ViewingActor::Admin, _) => true,
            (_, ViewingStatus::Cancelled) => true,
            (ViewingActor::Landlord, _) => true,
            (ViewingActor::Tenant, _) => false,
        };

        if permitted {
            Ok(next)
        } else {
            Err(TransitionError::NotPermitted { to: next })
        }
    }
}

impl std::fmt::Display for ViewingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewingStatus::Pending => write!(f, "pending"),
            ViewingStatus::Approved => write!(f, "approved"),
            ViewingStatus::Rejected => write!(f, "rejected"),
            ViewingStatus::Cancelled => write!(f, "cancelled"),
            ViewingStatus::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for ViewingStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ViewingStatus::Pending),
            "approved" | "confirmed" => Ok(ViewingStatus::Approved),
            "rejected" | "declined" => Ok(ViewingStatus::Rejected),
            "cancelled" | "canceled" => Ok(ViewingStatus::Cancelled),
            "completed" => Ok(ViewingStatus::Completed),
            _ => Err(format!("Invalid viewing status: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        use ViewingStatus::*;
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Approved.can_transition_to(Completed));
        assert!(Approved.can_transition_to(Cancelled));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Approved.can_transition_to(Rejected));
        assert!(!Pending.can_transition_to(Pending));
        for terminal in [Rejected, Cancelled, Completed] {
            assert!(terminal.is_terminal());
            for next in [Pending, Approved, Rejected, Cancelled, Completed] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_tenant_may_only_cancel() {
        let status = ViewingStatus::Pending;
        assert_eq!(
            status.transition(ViewingStatus::Cancelled, ViewingActor::Tenant),
            Ok(ViewingStatus::Cancelled)
        );
        assert_eq!(
            status.transition(ViewingStatus::Approved, ViewingActor::Tenant),
            Err(TransitionError::NotPermitted {
                to: ViewingStatus::Approved
            })
        );
    }

    #[test]
    fn test_landlord_and_admin_transitions() {
        assert!(ViewingStatus::Pending
            .transition(ViewingStatus::Approved, ViewingActor::Landlord)
            .is_ok());
        assert!(ViewingStatus::Approved
            .transition(ViewingStatus::Completed, ViewingActor::Admin)
            .is_ok());

        let err = ViewingStatus::Rejected
            .transition(ViewingStatus::Approved, ViewingActor::Admin)
            .unwrap_err();
        assert!(matches!(err, TransitionError::InvalidTransition { .. }));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Canceled".parse::<ViewingStatus>(), Ok(ViewingStatus::Cancelled));
        assert_eq!("confirmed".parse::<ViewingStatus>(), Ok(ViewingStatus::Approved));
        assert!("unknown".parse::<ViewingStatus>().is_err());
    }
}
