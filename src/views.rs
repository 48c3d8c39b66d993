//! Server-rendered HTML pages. Markup lives in `templates/`.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::error::AppError;
use crate::handler::Listing;
use crate::model::{Book, BookForm, Field, FieldError};

/// Renders a template as an HTML response with the given status.
pub struct HtmlTemplate<T: Template> {
    template: T,
    status: StatusCode,
}

impl<T: Template> HtmlTemplate<T> {
    pub fn new(template: T) -> Self {
        Self {
            template,
            status: StatusCode::OK,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.template.render() {
            Ok(html) => (self.status, Html(html)).into_response(),
            Err(err) => AppError::Internal(anyhow::anyhow!("failed to render template: {err}")).into_response(),
        }
    }
}

pub struct BookRow {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub year: String,
}

impl From<&Book> for BookRow {
    fn from(book: &Book) -> Self {
        BookRow {
            id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
            genre: book.genre.clone().unwrap_or_default(),
            year: book.year.map(|y| y.to_string()).unwrap_or_default(),
        }
    }
}

pub struct PageLink {
    pub number: u64,
    pub active: bool,
}

#[derive(Template)]
#[template(path = "books/index.html")]
pub struct IndexTemplate {
    pub books: Vec<BookRow>,
    pub query: String,
    pub searching: bool,
    pub page_links: Vec<PageLink>,
}

impl From<&Listing> for IndexTemplate {
    fn from(listing: &Listing) -> Self {
        match listing {
            Listing::Page(page) => IndexTemplate {
                books: page.books.iter().map(BookRow::from).collect(),
                query: String::new(),
                searching: false,
                page_links: (1..=page.pages)
                    .map(|number| PageLink {
                        number,
                        active: number == page.page as u64,
                    })
                    .collect(),
            },
            Listing::Search { query, books } => IndexTemplate {
                books: books.iter().map(BookRow::from).collect(),
                query: query.clone(),
                searching: true,
                page_links: Vec::new(),
            },
        }
    }
}

pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub value: String,
    pub has_error: bool,
}

fn form_fields(form: &BookForm, errors: &[FieldError]) -> Vec<FormField> {
    [
        (Field::Title, &form.title),
        (Field::Author, &form.author),
        (Field::Genre, &form.genre),
        (Field::Year, &form.year),
    ]
    .into_iter()
    .map(|(field, value)| FormField {
        name: field.name(),
        label: field.label(),
        value: value.clone(),
        has_error: errors.iter().any(|e| e.field == field),
    })
    .collect()
}

fn error_messages(errors: &[FieldError]) -> Vec<String> {
    errors.iter().map(|e| e.message.clone()).collect()
}

#[derive(Template)]
#[template(path = "books/new.html")]
pub struct NewBookTemplate {
    pub errors: Vec<String>,
    pub fields: Vec<FormField>,
}

impl NewBookTemplate {
    pub fn new(form: &BookForm, errors: &[FieldError]) -> Self {
        NewBookTemplate {
            errors: error_messages(errors),
            fields: form_fields(form, errors),
        }
    }
}

#[derive(Template)]
#[template(path = "books/update.html")]
pub struct UpdateBookTemplate {
    pub id: i32,
    pub errors: Vec<String>,
    pub fields: Vec<FormField>,
}

impl UpdateBookTemplate {
    pub fn new(id: i32, form: &BookForm, errors: &[FieldError]) -> Self {
        UpdateBookTemplate {
            id,
            errors: error_messages(errors),
            fields: form_fields(form, errors),
        }
    }
}

#[derive(Template)]
#[template(path = "books/delete.html")]
pub struct DeleteBookTemplate {
    pub id: i32,
    pub title: String,
    pub author: String,
}

impl From<&Book> for DeleteBookTemplate {
    fn from(book: &Book) -> Self {
        DeleteBookTemplate {
            id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub title: &'static str,
    pub message: &'static str,
    pub status: u16,
    pub detail: String,
}

impl ErrorTemplate {
    pub fn new(status: StatusCode, detail: Option<&str>) -> Self {
        let (title, message) = if status == StatusCode::NOT_FOUND {
            ("Page Not Found", "Sorry! We couldn't find the page you were looking for.")
        } else if status.is_server_error() {
            ("Server Error", "Sorry! There was an unexpected error on the server.")
        } else {
            (
                status.canonical_reason().unwrap_or("Bad Request"),
                "Sorry! The request could not be processed.",
            )
        };

        ErrorTemplate {
            title,
            message,
            status: status.as_u16(),
            detail: detail.unwrap_or_default().to_string(),
        }
    }
}
