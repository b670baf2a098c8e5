use crate::npm_api::NpmApiError;
use crate::social::SocialCardError;
use axum::http::StatusCode;
use tracing::error;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn bad_gateway(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: err.to_string(),
        }
    }
}

impl From<SocialCardError> for AppError {
    fn from(err: SocialCardError) -> Self {
        error!("social card rendering failed: {err}");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<NpmApiError> for AppError {
    fn from(err: NpmApiError) -> Self {
        match err {
            NpmApiError::NotFound(package) => Self::not_found(format!("package {package} not found")),
            NpmApiError::InvalidPackage(name) => Self::bad_request(format!("invalid package name: {name}")),
            other => {
                error!("npm downloads API failed: {other}");
                Self::bad_gateway(other)
            }
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
