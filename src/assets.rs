use axum::{
    body::Body,
    extract::Request,
    http::header,
    response::{IntoResponse, Response},
};
use rust_embed::Embed;

use crate::error::AppError;

#[derive(Embed)]
#[folder = "public/"]
pub struct Assets;

/// Router fallback: serves a bundled static file, or the not-found page.
pub async fn serve_embedded(req: Request) -> Result<Response, AppError> {
    let path = req.uri().path().trim_start_matches('/');

    let Some(content) = Assets::get(path) else {
        return Err(AppError::NotFound);
    };

    let mime = mime_guess::from_path(path).first_or_octet_stream();
    Ok(([(header::CONTENT_TYPE, mime.to_string())], Body::from(content.data.into_owned())).into_response())
}
