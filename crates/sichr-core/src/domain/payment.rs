//! 결제 상태.

use serde::{Deserialize, Serialize};

/// 열람 요청에 붙는 수수료 결제 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// 결제 전
    #[default]
    Unpaid,
    /// PayPal 주문 생성됨, 승인 대기
    Pending,
    /// 결제 완료
    Paid,
    /// 환불됨
    Refunded,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Unpaid => write!(f, "unpaid"),
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Refunded => write!(f, "refunded"),
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "pending" => Ok(PaymentStatus::Pending),
            "paid" | "completed" => Ok(PaymentStatus::Paid),
            "refunded" => Ok(PaymentStatus::Refunded),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

/// `payment_transactions` 행의 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// 주문 생성
    Created,
    /// 캡처 완료
    Completed,
    /// 캡처 실패
    Failed,
}

impl TransactionStatus {
    /// PayPal 주문 상태 문자열 변환 (`COMPLETED`, `APPROVED` ...)
    pub fn from_paypal(status: &str) -> Self {
        match status.to_uppercase().as_str() {
            "COMPLETED" => TransactionStatus::Completed,
            "CREATED" | "SAVED" | "APPROVED" | "PAYER_ACTION_REQUIRED" => {
                TransactionStatus::Created
            }
            _ => TransactionStatus::Failed,
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Created => write!(f, "created"),
            TransactionStatus::Completed => write!(f, "completed"),
            TransactionStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "created" => Ok(TransactionStatus::Created),
            "completed" => Ok(TransactionStatus::Completed),
            "failed" => Ok(TransactionStatus::Failed),
            _ => Err(format!("Invalid transaction status: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paypal_status_mapping() {
        assert_eq!(
            TransactionStatus::from_paypal("COMPLETED"),
            TransactionStatus::Completed
        );
        assert_eq!(
            TransactionStatus::from_paypal("approved"),
            TransactionStatus::Created
        );
        assert_eq!(
            TransactionStatus::from_paypal("VOIDED"),
            TransactionStatus::Failed
        );
    }

    #[test]
    fn test_payment_status_roundtrip_strings() {
        assert_eq!(PaymentStatus::Paid.to_string(), "paid");
        assert_eq!("completed".parse::<PaymentStatus>(), Ok(PaymentStatus::Paid));
        assert_eq!(PaymentStatus::default(), PaymentStatus::Unpaid);
    }
}
