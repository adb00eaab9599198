// Error types shared by the handlers and their conversion into HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

#[derive(Debug)]
pub enum AppError {
    InternalServerError(anyhow::Error),
    NotFound(String),
    /// The car catalog is still loading or failed to load.
    CatalogUnavailable(String),
    Render(RenderError),
}

/// Problems locating where a piece of the page should be rendered.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no fragment named '{0}'")]
    MissingRenderTarget(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::InternalServerError(error)
    }
}

impl From<askama::Error> for AppError {
    fn from(error: askama::Error) -> Self {
        AppError::InternalServerError(anyhow::Error::new(error))
    }
}

impl From<RenderError> for AppError {
    fn from(error: RenderError) -> Self {
        AppError::Render(error)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(e) => {
                tracing::error!("Internal server error: {:?}", e);
                // Don't expose internal details to the client
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            AppError::CatalogUnavailable(message) => {
                tracing::warn!("Catalog unavailable: {}", message);
                (StatusCode::SERVICE_UNAVAILABLE, message)
            }
            AppError::Render(e) => {
                // Nothing to draw into; the page stays as it is
                tracing::warn!("Render target missing: {}", e);
                return StatusCode::NO_CONTENT.into_response();
            }
        };

        (status, error_message).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_render_target_is_an_empty_response() {
        let response = AppError::from(RenderError::MissingRenderTarget("sidebar".into())).into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[test]
    fn internal_errors_hide_details() {
        let response = AppError::from(anyhow::anyhow!("disk on fire")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unavailable_catalog_maps_to_503() {
        let response = AppError::CatalogUnavailable("Каталог загружается".into()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
