use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{authorize, require_admin, CurrentAdmin, OptionalUser, Policy, Principal};
use crate::api::header_gate::{require_header, HeaderGate};
use crate::api::links::{wants_links, Identified, LinkDecorator, ResourceRoutes, RouteTable, UrlBuilder};
use crate::api::pagination::{paginate, PageRequest, PageSource};
use crate::core::{metrics, state::AppState, time::primitive_now_utc};
use crate::db::models::Author;
use crate::repositories;
use crate::repositories::authors::AuthorsByName;
use crate::schemas::author::{AuthorResponse, AuthorWithBooksResponse, AuthorWrite};

pub(crate) const GET_AUTHORS: &str = "get-authors-v1";
pub(crate) const GET_AUTHOR: &str = "get-author-v1";
pub(crate) const GET_AUTHOR_BY_NAME: &str = "get-author-by-name-v1";
pub(crate) const CREATE_AUTHOR: &str = "create-author-v1";
pub(crate) const UPDATE_AUTHOR: &str = "update-author-v1";
pub(crate) const DELETE_AUTHOR: &str = "delete-author-v1";

const API_VERSION: &str = "1";

const AUTHOR_ROUTES: ResourceRoutes = ResourceRoutes {
    get: GET_AUTHOR,
    update: UPDATE_AUTHOR,
    delete: DELETE_AUTHOR,
    list: GET_AUTHORS,
    create: CREATE_AUTHOR,
};

/// Adds the author route names, mounted under `{api_prefix}/authors`.
pub(crate) fn register_routes(table: RouteTable, api_prefix: &str) -> RouteTable {
    let base = format!("{api_prefix}/authors");
    table
        .with_route(GET_AUTHORS, base.clone())
        .with_route(CREATE_AUTHOR, base.clone())
        .with_route(GET_AUTHOR, format!("{base}/{{id}}"))
        .with_route(UPDATE_AUTHOR, format!("{base}/{{id}}"))
        .with_route(DELETE_AUTHOR, format!("{base}/{{id}}"))
        .with_route(GET_AUTHOR_BY_NAME, format!("{base}/{{name}}"))
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_authors).post(create_author))
        .route("/:key", get(get_author).put(update_author).delete(delete_author))
        .route_layer(middleware::from_fn_with_state(HeaderGate::version(API_VERSION), require_header))
}

async fn list_authors(
    State(state): State<AppState>,
    OptionalUser(principal): OptionalUser,
    headers: HeaderMap,
    request: PageRequest,
) -> Result<Response, ApiError> {
    render_page(&state, &headers, principal.as_ref(), &AuthorsByName::new(state.db()), request).await
}

/// Paginates any author source and renders the page with its `x-paginacion` header.
async fn render_page<S>(
    state: &AppState,
    headers: &HeaderMap,
    principal: Option<&Principal>,
    source: &S,
    request: PageRequest,
) -> Result<Response, ApiError>
where
    S: PageSource<Item = Author> + ?Sized,
    S::Error: std::fmt::Display,
{
    let page = paginate(source, request)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list authors"))?;

    metrics::record_page_served("authors", page.items.is_empty());

    let total = page.total_count_header();
    let authors = page.map(AuthorResponse::from).items;

    render_list(state, headers, principal, authors, |body| (total, body).into_response())
}

/// `GET /authors/{key}`: numeric keys address one author, anything else searches by name.
async fn get_author(
    State(state): State<AppState>,
    OptionalUser(principal): OptionalUser,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    match key.parse::<i64>() {
        Ok(id) => get_author_by_id(&state, &headers, principal.as_ref(), id).await,
        Err(_) => search_authors(&state, &headers, principal, &key).await,
    }
}

async fn get_author_by_id(
    state: &AppState,
    headers: &HeaderMap,
    principal: Option<&Principal>,
    id: i64,
) -> Result<Response, ApiError> {
    let author = repositories::authors::find_by_id(state.db(), id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load author"))?
        .ok_or_else(|| ApiError::NotFound("Author not found".to_string()))?;

    let books = repositories::authors::list_books(state.db(), author.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load author books"))?;

    let author = AuthorWithBooksResponse::from_db(author, books);

    if wants_links(headers) {
        let outcome = authorize(principal, Policy::Admin);
        let linked = decorator(state).decorate(author, outcome)?;
        return Ok(Json(linked).into_response());
    }

    Ok(Json(author).into_response())
}

async fn search_authors(
    state: &AppState,
    headers: &HeaderMap,
    principal: Option<Principal>,
    fragment: &str,
) -> Result<Response, ApiError> {
    let principal = require_admin(principal)?;

    let authors = repositories::authors::search_by_name(state.db(), fragment)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to search authors"))?
        .into_iter()
        .map(AuthorResponse::from)
        .collect();

    render_list(state, headers, Some(&principal), authors, IntoResponse::into_response)
}

async fn create_author(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    payload: Result<Json<AuthorWrite>, JsonRejection>,
) -> Result<Response, ApiError> {
    let name = validated_name(payload)?;

    let duplicate = repositories::authors::exists_by_name(state.db(), &name)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing author"))?;
    if duplicate {
        return Err(ApiError::BadRequest(format!("An author named '{name}' already exists")));
    }

    let author = repositories::authors::create(state.db(), &name, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create author"))?;

    let location = state.routes().build_url(GET_AUTHOR, &[("id", author.id.to_string())])?;

    tracing::info!(
        action = "author_create",
        admin_id = %admin.user_id,
        author_id = author.id,
        "Author created"
    );

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(AuthorResponse::from(author)),
    )
        .into_response())
}

async fn update_author(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(key): Path<String>,
    payload: Result<Json<AuthorWrite>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let id = parse_author_id(&key)?;
    let name = validated_name(payload)?;

    ensure_author_exists(&state, id).await?;

    repositories::authors::update(state.db(), id, &name, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update author"))?;

    tracing::info!(action = "author_update", admin_id = %admin.user_id, author_id = id, "Author updated");

    Ok(StatusCode::NO_CONTENT)
}

async fn delete_author(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(key): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_author_id(&key)?;

    ensure_author_exists(&state, id).await?;

    repositories::authors::delete(state.db(), id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete author"))?;

    tracing::info!(action = "author_delete", admin_id = %admin.user_id, author_id = id, "Author deleted");

    Ok(StatusCode::NO_CONTENT)
}

fn validated_name(payload: Result<Json<AuthorWrite>, JsonRejection>) -> Result<String, ApiError> {
    let Json(payload) = payload?;
    let payload = payload.trimmed();
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(payload.name)
}

/// Write routes only exist for integer ids.
fn parse_author_id(key: &str) -> Result<i64, ApiError> {
    key.parse::<i64>().map_err(|_| ApiError::NotFound("Not Found".to_string()))
}

async fn ensure_author_exists(state: &AppState, id: i64) -> Result<(), ApiError> {
    let exists = repositories::authors::exists_by_id(state.db(), id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check author"))?;

    if exists {
        Ok(())
    } else {
        Err(ApiError::NotFound("Author not found".to_string()))
    }
}

fn decorator(state: &AppState) -> LinkDecorator<'_, RouteTable> {
    LinkDecorator::new(state.routes(), AUTHOR_ROUTES)
}

/// Renders a list either bare or, when links were requested, as a linked collection.
fn render_list<T, F>(
    state: &AppState,
    headers: &HeaderMap,
    principal: Option<&Principal>,
    items: Vec<T>,
    respond: F,
) -> Result<Response, ApiError>
where
    T: Identified + Serialize,
    F: FnOnce(Json<serde_json::Value>) -> Response,
{
    let body = if wants_links(headers) {
        let outcome = authorize(principal, Policy::Admin);
        serde_json::to_value(decorator(state).decorate_list(items, outcome)?)
    } else {
        serde_json::to_value(items)
    };
    let body = body.map_err(|e| ApiError::internal(e, "Failed to encode authors"))?;

    Ok(respond(Json(body)))
}
