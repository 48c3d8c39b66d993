//! Book catalog queries and commands.
//!
//! Everything here is a thin layer over the `books` table: paged listing in
//! title order, substring search, and by-id lookup, create, update and delete.
//! Validation happens before a [`NewBook`] reaches this module.

use anyhow::Result;
use libsql::Connection;

use crate::model::{Book, NewBook};

pub const PAGE_SIZE: u32 = 6;

const BOOK_COLUMNS: &str = "id, title, author, genre, year, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct BookPage {
    pub books: Vec<Book>,
    pub page: u32,
    pub pages: u64,
    pub total: u64,
}

/// Number of pages needed to show `total` rows, `page_size` at a time.
pub fn page_count(total: u64, page_size: u32) -> u64 {
    total.div_ceil(page_size as u64)
}

/// Searchable text of a book, lowercased here rather than in SQL since SQLite
/// only folds ASCII. Fields are joined with a unit separator so a match cannot
/// span two of them.
fn search_key(input: &NewBook) -> String {
    let genre = input.genre.as_deref().unwrap_or_default();
    let year = input.year.map(|y| y.to_string()).unwrap_or_default();
    [input.title.as_str(), input.author.as_str(), genre, year.as_str()]
        .join("\u{1f}")
        .to_lowercase()
}

/// Lowercases the query the same way as [`search_key`] and escapes LIKE
/// wildcards so they match literally.
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

pub struct Catalog<'a> {
    conn: &'a Connection,
}

impl<'a> Catalog<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub async fn count_books(&self) -> Result<u64> {
        let mut rows = self.conn.query("SELECT COUNT(*) FROM books", ()).await?;

        if let Some(row) = rows.next().await? {
            let count: i64 = row.get(0)?;
            Ok(count as u64)
        } else {
            anyhow::bail!("Failed to count books")
        }
    }

    /// One page of books in title order. `page` is 1-based; zero is treated as 1.
    pub async fn list_books(&self, page: u32) -> Result<BookPage> {
        let page = page.max(1);
        let offset = (page as i64 - 1) * PAGE_SIZE as i64;
        let total = self.count_books().await?;

        let query = format!(
            "SELECT {BOOK_COLUMNS} FROM books ORDER BY title ASC, id ASC LIMIT ? OFFSET ?"
        );

        let mut rows = self
            .conn
            .query(&query, libsql::params![PAGE_SIZE as i64, offset])
            .await?;

        let mut books = Vec::new();
        while let Some(row) = rows.next().await? {
            books.push(self.row_to_book(&row)?);
        }

        Ok(BookPage {
            books,
            page,
            pages: page_count(total, PAGE_SIZE),
            total,
        })
    }

    /// Every book whose title, author, genre or year contains `query`, ignoring case.
    pub async fn search_books(&self, query: &str) -> Result<Vec<Book>> {
        let sql = format!(
            r#"
            SELECT {BOOK_COLUMNS}
            FROM books
            WHERE search_key LIKE ? ESCAPE '\'
            ORDER BY title ASC, id ASC
            "#
        );
        let mut rows = self.conn.query(&sql, libsql::params![like_pattern(query)]).await?;

        let mut books = Vec::new();
        while let Some(row) = rows.next().await? {
            books.push(self.row_to_book(&row)?);
        }

        Ok(books)
    }

    pub async fn get_book(&self, id: i32) -> Result<Option<Book>> {
        let query = format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?");

        let mut rows = self.conn.query(&query, libsql::params![id]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(self.row_to_book(&row)?))
        } else {
            Ok(None)
        }
    }

    pub async fn create_book(&self, input: &NewBook) -> Result<Book> {
        let query = format!(
            r#"
            INSERT INTO books (title, author, genre, year, search_key)
            VALUES (?, ?, ?, ?, ?)
            RETURNING {BOOK_COLUMNS}
            "#
        );

        let mut rows = self
            .conn
            .query(
                &query,
                libsql::params![
                    input.title.as_str(),
                    input.author.as_str(),
                    input.genre.as_deref(),
                    input.year,
                    search_key(input)
                ],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            let book = self.row_to_book(&row)?;
            tracing::info!(book_id = book.id, title = %book.title, "created book");
            Ok(book)
        } else {
            anyhow::bail!("Failed to create book")
        }
    }

    /// Overwrites every field of the book. `None` when no book has this id.
    pub async fn update_book(&self, id: i32, input: &NewBook) -> Result<Option<Book>> {
        let query = format!(
            r#"
            UPDATE books
            SET title = ?, author = ?, genre = ?, year = ?, search_key = ?,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE id = ?
            RETURNING {BOOK_COLUMNS}
            "#
        );

        let mut rows = self
            .conn
            .query(
                &query,
                libsql::params![
                    input.title.as_str(),
                    input.author.as_str(),
                    input.genre.as_deref(),
                    input.year,
                    search_key(input),
                    id
                ],
            )
            .await?;

        match rows.next().await? {
            Some(row) => {
                tracing::info!(book_id = id, "updated book");
                Ok(Some(self.row_to_book(&row)?))
            }
            None => Ok(None),
        }
    }

    /// Returns whether a row was actually removed.
    pub async fn delete_book(&self, id: i32) -> Result<bool> {
        let result = self
            .conn
            .execute("DELETE FROM books WHERE id = ?", libsql::params![id])
            .await?;
        if result > 0 {
            tracing::info!(book_id = id, "deleted book");
        }
        Ok(result > 0)
    }

    fn row_to_book(&self, row: &libsql::Row) -> Result<Book> {
        Ok(Book {
            id: row.get(0)?,
            title: row.get(1)?,
            author: row.get(2)?,
            genre: row.get(3)?,
            year: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}
