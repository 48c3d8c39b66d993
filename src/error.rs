use axum::{
    extract::{Request, State, rejection::FormRejection},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::handler::AppState;
use crate::views::{ErrorTemplate, HtmlTemplate};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Form(#[from] FormRejection),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Marker left on a response by [`AppError`] so [`render_failures`] can turn it
/// into an error page.
#[derive(Debug, Clone)]
pub struct Failure {
    pub status: StatusCode,
    pub detail: Option<String>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Form(rejection) => rejection.status(),
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            AppError::NotFound => None,
            AppError::Form(rejection) => {
                tracing::info!(error = %rejection, status = status.as_u16(), "rejected form submission");
                Some(rejection.body_text())
            }
            AppError::Internal(e) => {
                let detail = crate::unpack_error(&**e);
                tracing::error!(error = %detail, status = status.as_u16(), "request failed");
                Some(detail)
            }
        };

        let mut response = status.into_response();
        response.extensions_mut().insert(Failure { status, detail });
        response
    }
}

/// Renders the error page for any response carrying a [`Failure`]. Error
/// details only reach the page in development.
pub async fn render_failures(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    let Some(failure) = response.extensions().get::<Failure>().cloned() else {
        return response;
    };

    let detail = failure.detail.filter(|_| state.development);
    HtmlTemplate::new(ErrorTemplate::new(failure.status, detail.as_deref()))
        .with_status(failure.status)
        .into_response()
}
