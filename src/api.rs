use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::handler::{AppState, Listing, load_listing};
use crate::model::Book;

#[derive(Debug, Default, Deserialize)]
pub struct QueryParams {
    pub page: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize, Default)]
pub struct APIResponse {
    pub status: String,
    pub books: Vec<Book>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<u64>,
    pub total: u64,
}

impl APIResponse {
    pub fn new_from_msg(msg: &str) -> Self {
        APIResponse {
            status: msg.to_owned(),
            ..Default::default()
        }
    }

    pub fn from_listing(msg: &str, listing: Listing) -> Self {
        match listing {
            Listing::Page(page) => APIResponse {
                status: msg.to_owned(),
                books: page.books,
                page: Some(page.page),
                pages: Some(page.pages),
                total: page.total,
            },
            Listing::Search { books, .. } => APIResponse {
                status: msg.to_owned(),
                total: books.len() as u64,
                books,
                page: None,
                pages: None,
            },
        }
    }
}

fn server_error(msg: &str) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(APIResponse::new_from_msg(msg))).into_response()
}

pub async fn healthcheck() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn get_books(State(state): State<AppState>, Query(qp): Query<QueryParams>) -> Response {
    let catalog = Catalog::new(state.db.connection());

    match load_listing(&catalog, qp.into_handler_params()).await {
        Ok(listing) => (StatusCode::OK, Json(APIResponse::from_listing("got books", listing))).into_response(),
        Err(e) => {
            tracing::error!(error = %crate::unpack_error(&*e), "failed to get books");
            server_error("failed to get books")
        }
    }
}

pub async fn get_book(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Ok(id) = id.parse::<i32>() else {
        return (StatusCode::NOT_FOUND, Json(APIResponse::new_from_msg("book not found"))).into_response();
    };

    match Catalog::new(state.db.connection()).get_book(id).await {
        Ok(Some(book)) => (StatusCode::OK, Json(book)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, Json(APIResponse::new_from_msg("book not found"))).into_response(),
        Err(e) => {
            tracing::error!(book_id = id, error = %crate::unpack_error(&*e), "failed to get book");
            server_error("failed to get book")
        }
    }
}
