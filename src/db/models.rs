use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) hashed_password: String,
    pub(crate) is_admin: bool,
    pub(crate) is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub(crate) struct Author {
    pub(crate) id: i64,
    pub(crate) name: String,
}

/// A book credited to an author, in the author's credit order.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub(crate) struct AuthorBook {
    pub(crate) id: i64,
    pub(crate) title: String,
}
