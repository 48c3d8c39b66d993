use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
}

/// Raw values as submitted by the create and update forms.
///
/// Kept as strings so a rejected submission can be shown back exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BookForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub year: String,
}

/// A book that passed validation and may be written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Author,
    Genre,
    Year,
}

impl Field {
    /// Form input name.
    pub fn name(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Author => "author",
            Field::Genre => "genre",
            Field::Year => "year",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::Author => "Author",
            Field::Genre => "Genre",
            Field::Year => "Year",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

impl FieldError {
    fn required(field: Field) -> Self {
        FieldError {
            field,
            message: format!("{} is required", field.label()),
        }
    }
}

impl From<&Book> for BookForm {
    fn from(book: &Book) -> Self {
        BookForm {
            title: book.title.clone(),
            author: book.author.clone(),
            genre: book.genre.clone().unwrap_or_default(),
            year: book.year.map(|y| y.to_string()).unwrap_or_default(),
        }
    }
}

impl BookForm {
    pub fn validate(&self) -> Result<NewBook, Vec<FieldError>> {
        let mut errors = Vec::new();

        let title = self.title.trim();
        if title.is_empty() {
            errors.push(FieldError::required(Field::Title));
        }

        let author = self.author.trim();
        if author.is_empty() {
            errors.push(FieldError::required(Field::Author));
        }

        let genre = Some(self.genre.trim())
            .filter(|g| !g.is_empty())
            .map(str::to_string);

        let year = match self.year.trim() {
            "" => None,
            raw => match raw.parse::<i32>() {
                Ok(y) => Some(y),
                Err(_) => {
                    errors.push(FieldError {
                        field: Field::Year,
                        message: format!("{} must be a whole number", Field::Year.label()),
                    });
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewBook {
            title: title.to_string(),
            author: author.to_string(),
            genre,
            year,
        })
    }
}
