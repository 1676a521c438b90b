use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::links::Identified;
use crate::api::validation::{starts_capitalized, trim_author_name};
use crate::db::models::{Author, AuthorBook};

/// Body of create and update requests. A missing name deserializes as empty
/// and is refused by the length rule.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AuthorWrite {
    #[serde(default, alias = "nombre")]
    #[validate(
        length(min = 1, max = 120, message = "Author name must be between 1 and 120 characters"),
        custom(function = "starts_capitalized")
    )]
    pub(crate) name: String,
}

impl AuthorWrite {
    pub(crate) fn trimmed(self) -> Self {
        Self { name: trim_author_name(&self.name) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct AuthorResponse {
    pub(crate) id: i64,
    pub(crate) name: String,
}

impl From<Author> for AuthorResponse {
    fn from(author: Author) -> Self {
        Self { id: author.id, name: author.name }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct BookResponse {
    pub(crate) id: i64,
    pub(crate) title: String,
}

impl From<AuthorBook> for BookResponse {
    fn from(book: AuthorBook) -> Self {
        Self { id: book.id, title: book.title }
    }
}

/// An author together with the books credited to them.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct AuthorWithBooksResponse {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) books: Vec<BookResponse>,
}

impl AuthorWithBooksResponse {
    pub(crate) fn from_db(author: Author, books: Vec<AuthorBook>) -> Self {
        Self {
            id: author.id,
            name: author.name,
            books: books.into_iter().map(BookResponse::from).collect(),
        }
    }
}

impl Identified for AuthorResponse {
    fn id_param(&self) -> String {
        self.id.to_string()
    }
}

impl Identified for AuthorWithBooksResponse {
    fn id_param(&self) -> String {
        self.id.to_string()
    }
}
