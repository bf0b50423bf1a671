//! 도메인 타입.
//!
//! DB에는 소문자 문자열로 저장되고, 애플리케이션에서는 열거형으로 다룹니다.

pub mod gdpr;
pub mod payment;
pub mod user;
pub mod viewing;

pub use gdpr::{ConsentPurpose, GdprRequestStatus, GdprRequestType};
pub use payment::{PaymentStatus, TransactionStatus};
pub use user::UserRole;
pub use viewing::{TransitionError, ViewingActor, ViewingStatus};
