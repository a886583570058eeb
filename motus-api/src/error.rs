use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use motus_core::StoreError;
use motus_fleet::registry::FleetError;
use motus_reserve::coordinator::{CancelError, ReserveError};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => AppError::ConflictError(msg),
            StoreError::Backend(msg) => AppError::Anyhow(anyhow::anyhow!(msg)),
        }
    }
}

impl From<ReserveError> for AppError {
    fn from(err: ReserveError) -> Self {
        match err {
            ReserveError::InvalidInput(_)
            | ReserveError::NotScheduled { .. }
            | ReserveError::SeatOutOfRange { .. } => AppError::ValidationError(err.to_string()),
            ReserveError::UserNotFound(_)
            | ReserveError::BusNotFound(_)
            | ReserveError::ScheduleNotFound(_)
            | ReserveError::RouteNotFound(_) => AppError::NotFoundError(err.to_string()),
            ReserveError::SeatUnavailable { .. } | ReserveError::SeatPlanChanged(_) => {
                AppError::ConflictError(err.to_string())
            }
            ReserveError::Storage(e) => e.into(),
        }
    }
}

impl From<CancelError> for AppError {
    fn from(err: CancelError) -> Self {
        match err {
            CancelError::InvalidInput(_) => AppError::ValidationError(err.to_string()),
            CancelError::BookingNotFound(_) | CancelError::UserNotFound(_) => {
                AppError::NotFoundError(err.to_string())
            }
            CancelError::NotOwner => AppError::AuthorizationError(err.to_string()),
            CancelError::AlreadyCancelled(_) | CancelError::AlreadyCompleted(_) => {
                AppError::ConflictError(err.to_string())
            }
            CancelError::Storage(e) => e.into(),
        }
    }
}

impl From<FleetError> for AppError {
    fn from(err: FleetError) -> Self {
        match err {
            FleetError::InvalidInput(_) => AppError::ValidationError(err.to_string()),
            FleetError::BusNotFound(_)
            | FleetError::RouteNotFound(_)
            | FleetError::ScheduleNotFound(_) => AppError::NotFoundError(err.to_string()),
            FleetError::BusInUse(_) => AppError::ConflictError(err.to_string()),
            FleetError::Storage(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn domain_errors_map_to_the_right_status() {
        let resp = AppError::from(ReserveError::SeatUnavailable { seat: 4 }).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = AppError::from(ReserveError::BusNotFound(Uuid::new_v4())).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = AppError::from(CancelError::NotOwner).into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp =
            AppError::from(ReserveError::InvalidInput("passenger name must not be empty"))
                .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = AppError::from(StoreError::backend("connection refused")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
