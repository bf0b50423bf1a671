//! 검증 JSON 추출기.

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::{bad_request, validation_error, ApiErrorResponse};

/// 역직렬화와 `validator` 검증을 함께 수행하는 JSON 본문
///
/// 형식 오류와 검증 실패 모두 400 `VALIDATION_ERROR`로 응답합니다.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiErrorResponse;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| bad_request(rejection.body_text()))?;

        value.validate().map_err(validation_error)?;
        Ok(ValidatedJson(value))
    }
}
