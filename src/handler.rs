use std::sync::Arc;

use axum::{
    Form,
    extract::{Path, Query, State, rejection::FormRejection},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use crate::api::QueryParams;
use crate::catalog::{BookPage, Catalog};
use crate::db::Database;
use crate::error::AppError;
use crate::model::{Book, BookForm};
use crate::views::{DeleteBookTemplate, HtmlTemplate, IndexTemplate, NewBookTemplate, UpdateBookTemplate};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub development: bool,
}

const DEFAULT_PAGE: u32 = 1;

#[derive(Debug, PartialEq, Eq)]
pub enum HandlerParams {
    Page(u32),
    Search(String),
}

impl QueryParams {
    /// A non-blank `search` wins over `page`. Anything that is not a positive
    /// number falls back to the first page.
    pub fn into_handler_params(self) -> HandlerParams {
        if let Some(search) = self.search {
            let search = search.trim();
            if !search.is_empty() {
                return HandlerParams::Search(search.to_string());
            }
        }

        let page = self
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_PAGE)
            .max(DEFAULT_PAGE);

        HandlerParams::Page(page)
    }
}

#[derive(Debug)]
pub enum Listing {
    Page(BookPage),
    Search { query: String, books: Vec<Book> },
}

pub async fn load_listing(catalog: &Catalog<'_>, params: HandlerParams) -> anyhow::Result<Listing> {
    match params {
        HandlerParams::Page(page) => Ok(Listing::Page(catalog.list_books(page).await?)),
        HandlerParams::Search(query) => {
            let books = catalog.search_books(&query).await?;
            Ok(Listing::Search { query, books })
        }
    }
}

/// Path ids that are not numbers can never match a book.
fn parse_id(raw: &str) -> Result<i32, AppError> {
    raw.parse::<i32>().map_err(|_| AppError::NotFound)
}

async fn find_book(catalog: &Catalog<'_>, id: i32) -> Result<Book, AppError> {
    catalog.get_book(id).await?.ok_or(AppError::NotFound)
}

pub async fn home() -> Redirect {
    Redirect::to("/books?page=1")
}

pub async fn list_books(
    State(state): State<AppState>,
    Query(qp): Query<QueryParams>,
) -> Result<HtmlTemplate<IndexTemplate>, AppError> {
    let catalog = Catalog::new(state.db.connection());
    let listing = load_listing(&catalog, qp.into_handler_params()).await?;

    Ok(HtmlTemplate::new(IndexTemplate::from(&listing)))
}

pub async fn new_book_form() -> HtmlTemplate<NewBookTemplate> {
    HtmlTemplate::new(NewBookTemplate::new(&BookForm::default(), &[]))
}

pub async fn create_book(
    State(state): State<AppState>,
    form: Result<Form<BookForm>, FormRejection>,
) -> Result<Response, AppError> {
    let Form(form) = form?;

    let book = match form.validate() {
        Ok(book) => book,
        Err(errors) => {
            tracing::info!(errors = errors.len(), "rejected new book");
            return Ok(HtmlTemplate::new(NewBookTemplate::new(&form, &errors))
                .with_status(StatusCode::UNPROCESSABLE_ENTITY)
                .into_response());
        }
    };

    Catalog::new(state.db.connection()).create_book(&book).await?;

    Ok(Redirect::to("/books").into_response())
}

pub async fn show_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<HtmlTemplate<UpdateBookTemplate>, AppError> {
    let catalog = Catalog::new(state.db.connection());
    let book = find_book(&catalog, parse_id(&id)?).await?;

    Ok(HtmlTemplate::new(UpdateBookTemplate::new(book.id, &BookForm::from(&book), &[])))
}

pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: Result<Form<BookForm>, FormRejection>,
) -> Result<Response, AppError> {
    let catalog = Catalog::new(state.db.connection());
    let existing = find_book(&catalog, parse_id(&id)?).await?;
    let Form(form) = form?;

    let book = match form.validate() {
        Ok(book) => book,
        Err(errors) => {
            tracing::info!(book_id = existing.id, errors = errors.len(), "rejected book update");
            return Ok(HtmlTemplate::new(UpdateBookTemplate::new(existing.id, &form, &errors))
                .with_status(StatusCode::UNPROCESSABLE_ENTITY)
                .into_response());
        }
    };

    // The row can disappear between the lookup and the write.
    catalog
        .update_book(existing.id, &book)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Redirect::to("/books").into_response())
}

pub async fn confirm_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<HtmlTemplate<DeleteBookTemplate>, AppError> {
    let catalog = Catalog::new(state.db.connection());
    let book = find_book(&catalog, parse_id(&id)?).await?;

    Ok(HtmlTemplate::new(DeleteBookTemplate::from(&book)))
}

pub async fn delete_book(State(state): State<AppState>, Path(id): Path<String>) -> Result<Redirect, AppError> {
    let catalog = Catalog::new(state.db.connection());

    if !catalog.delete_book(parse_id(&id)?).await? {
        return Err(AppError::NotFound);
    }

    Ok(Redirect::to("/books"))
}
