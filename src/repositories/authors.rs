use async_trait::async_trait;
use sqlx::PgPool;

use crate::api::pagination::PageSource;
use crate::db::models::{Author, AuthorBook};

pub(crate) async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM authors").fetch_one(pool).await
}

/// Authors ordered by name, ties broken by id so repeated reads slice identically.
pub(crate) async fn list_by_name(
    pool: &PgPool,
    skip: i64,
    take: i64,
) -> Result<Vec<Author>, sqlx::Error> {
    sqlx::query_as::<_, Author>(
        "SELECT id, name FROM authors ORDER BY name, id OFFSET $1 LIMIT $2",
    )
    .bind(skip)
    .bind(take)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Author>, sqlx::Error> {
    sqlx::query_as::<_, Author>("SELECT id, name FROM authors WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Case-sensitive substring match on the author name.
pub(crate) async fn search_by_name(
    pool: &PgPool,
    fragment: &str,
) -> Result<Vec<Author>, sqlx::Error> {
    sqlx::query_as::<_, Author>(
        "SELECT id, name FROM authors WHERE strpos(name, $1) > 0 ORDER BY name, id",
    )
    .bind(fragment)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_books(
    pool: &PgPool,
    author_id: i64,
) -> Result<Vec<AuthorBook>, sqlx::Error> {
    sqlx::query_as::<_, AuthorBook>(
        "SELECT b.id, b.title
         FROM author_books ab
         JOIN books b ON b.id = ab.book_id
         WHERE ab.author_id = $1
         ORDER BY ab.position, b.id",
    )
    .bind(author_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn exists_by_id(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM authors WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn exists_by_name(pool: &PgPool, name: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM authors WHERE name = $1)")
        .bind(name)
        .fetch_one(pool)
        .await
}

pub(crate) async fn create(
    pool: &PgPool,
    name: &str,
    now: time::PrimitiveDateTime,
) -> Result<Author, sqlx::Error> {
    sqlx::query_as::<_, Author>(
        "INSERT INTO authors (name, created_at, updated_at) VALUES ($1, $2, $2)
         RETURNING id, name",
    )
    .bind(name)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: i64,
    name: &str,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE authors SET name = $1, updated_at = $2 WHERE id = $3")
        .bind(name)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub(crate) async fn delete(pool: &PgPool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM authors WHERE id = $1").bind(id).execute(pool).await?;
    Ok(())
}

/// The authors table as a paginated source, ordered by name.
pub(crate) struct AuthorsByName<'a> {
    pool: &'a PgPool,
}

impl<'a> AuthorsByName<'a> {
    pub(crate) fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PageSource for AuthorsByName<'_> {
    type Item = Author;
    type Error = sqlx::Error;

    async fn count(&self) -> Result<i64, sqlx::Error> {
        count(self.pool).await
    }

    async fn ordered_slice(&self, skip: i64, take: i64) -> Result<Vec<Author>, sqlx::Error> {
        list_by_name(self.pool, skip, take).await
    }
}
