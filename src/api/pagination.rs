//! Page requests, page slicing over ordered sources, and the out-of-band
//! total-count header.
//!
//! Clients send `page` / `page_size` (or `pagina` / `recordsPorPagina`) and
//! receive the slice as the body plus `x-paginacion: {"totalCount": N}`.

use std::convert::Infallible;

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Query};
use axum::http::{request::Parts, HeaderName, HeaderValue};
use axum::response::{IntoResponseParts, ResponseParts};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::errors::ApiError;
use crate::core::config::PaginationSettings;
use crate::core::state::AppState;

pub(crate) const PAGINATION_HEADER: &str = "x-paginacion";

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum PaginationError {
    #[error("{field} must be an integer, got '{value}'")]
    NotAnInteger { field: &'static str, value: String },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: i64 },
}

impl From<PaginationError> for ApiError {
    fn from(err: PaginationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawPageQuery {
    #[serde(default, alias = "pagina")]
    page: Option<String>,
    #[serde(default, alias = "recordsPorPagina")]
    page_size: Option<String>,
}

/// A validated page request: `page_number >= 1`, `1 <= page_size <= max_page_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PageRequest {
    page_number: i64,
    page_size: i64,
}

impl PageRequest {
    /// Zero is lifted to one and oversized pages are clamped; negatives are refused.
    pub(crate) fn new(
        page_number: i64,
        page_size: i64,
        bounds: PaginationSettings,
    ) -> Result<Self, PaginationError> {
        if page_number < 0 {
            return Err(PaginationError::Negative { field: "page", value: page_number });
        }
        if page_size < 0 {
            return Err(PaginationError::Negative { field: "page_size", value: page_size });
        }

        Ok(Self {
            page_number: page_number.max(1),
            page_size: page_size.clamp(1, bounds.max_page_size.max(1)),
        })
    }

    pub(crate) fn from_query(
        raw: &RawPageQuery,
        bounds: PaginationSettings,
    ) -> Result<Self, PaginationError> {
        let page_number = parse_param("page", raw.page.as_deref())?.unwrap_or(1);
        let page_size =
            parse_param("page_size", raw.page_size.as_deref())?.unwrap_or(bounds.default_page_size);
        Self::new(page_number, page_size, bounds)
    }

    pub(crate) fn page_number(&self) -> i64 {
        self.page_number
    }

    pub(crate) fn page_size(&self) -> i64 {
        self.page_size
    }

    pub(crate) fn offset(&self) -> i64 {
        (self.page_number - 1).saturating_mul(self.page_size)
    }

    pub(crate) fn limit(&self) -> i64 {
        self.page_size
    }
}

fn parse_param(field: &'static str, value: Option<&str>) -> Result<Option<i64>, PaginationError> {
    let Some(raw) = value.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };

    raw.parse::<i64>()
        .map(Some)
        .map_err(|_| PaginationError::NotAnInteger { field, value: raw.to_string() })
}

#[async_trait]
impl FromRequestParts<AppState> for PageRequest {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Query(raw) = Query::<RawPageQuery>::try_from_uri(&parts.uri)
            .map_err(|err| ApiError::BadRequest(format!("Invalid pagination query: {err}")))?;

        Ok(PageRequest::from_query(&raw, state.settings().pagination())?)
    }
}

/// One page of an ordered source plus the size of the whole source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Page<T> {
    pub(crate) items: Vec<T>,
    pub(crate) total_count: i64,
}

impl<T> Page<T> {
    pub(crate) fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page { items: self.items.into_iter().map(f).collect(), total_count: self.total_count }
    }

    pub(crate) fn total_count_header(&self) -> TotalCountHeader {
        TotalCountHeader(self.total_count)
    }
}

/// An ordered, countable, sliceable store read.
#[async_trait]
pub(crate) trait PageSource: Sync {
    type Item: Send;
    type Error: Send;

    async fn count(&self) -> Result<i64, Self::Error>;

    async fn ordered_slice(&self, skip: i64, take: i64) -> Result<Vec<Self::Item>, Self::Error>;
}

/// Runs the count and slice reads concurrently. Store errors are returned as-is.
pub(crate) async fn paginate<S>(
    source: &S,
    request: PageRequest,
) -> Result<Page<S::Item>, S::Error>
where
    S: PageSource + ?Sized,
{
    let (total_count, items) =
        tokio::try_join!(source.count(), source.ordered_slice(request.offset(), request.limit()))?;

    tracing::debug!(
        page = request.page_number(),
        page_size = request.page_size(),
        returned = items.len(),
        total_count,
        "Page fetched"
    );

    Ok(Page { items, total_count })
}

/// An already-ordered in-memory sequence.
#[async_trait]
impl<T> PageSource for [T]
where
    T: Clone + Send + Sync,
{
    type Item = T;
    type Error = Infallible;

    async fn count(&self) -> Result<i64, Infallible> {
        Ok(i64::try_from(self.len()).unwrap_or(i64::MAX))
    }

    async fn ordered_slice(&self, skip: i64, take: i64) -> Result<Vec<T>, Infallible> {
        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let take = usize::try_from(take).unwrap_or(0);
        Ok(self.iter().skip(skip).take(take).cloned().collect())
    }
}

#[derive(Debug, Serialize)]
struct PaginationMetadata {
    #[serde(rename = "totalCount")]
    total_count: i64,
}

/// Response part carrying `x-paginacion: {"totalCount": N}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TotalCountHeader(pub(crate) i64);

impl TotalCountHeader {
    pub(crate) fn header_value(&self) -> Result<HeaderValue, ApiError> {
        let body = serde_json::to_string(&PaginationMetadata { total_count: self.0 })
            .map_err(|e| ApiError::internal(e, "Failed to encode pagination header"))?;
        HeaderValue::from_str(&body)
            .map_err(|e| ApiError::internal(e, "Failed to encode pagination header"))
    }
}

impl IntoResponseParts for TotalCountHeader {
    type Error = ApiError;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        let value = self.header_value()?;
        res.headers_mut().insert(HeaderName::from_static(PAGINATION_HEADER), value);
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    const BOUNDS: PaginationSettings =
        PaginationSettings { default_page_size: 10, max_page_size: 50 };

    fn request(page_number: i64, page_size: i64) -> PageRequest {
        PageRequest::new(page_number, page_size, BOUNDS).expect("page request")
    }

    fn raw(page: Option<&str>, page_size: Option<&str>) -> RawPageQuery {
        RawPageQuery { page: page.map(str::to_string), page_size: page_size.map(str::to_string) }
    }

    fn expected_len(total: i64, page_number: i64, page_size: i64) -> usize {
        page_size.min((total - (page_number - 1) * page_size).max(0)) as usize
    }

    #[tokio::test]
    async fn second_page_of_five_names() {
        let names = ["A", "B", "C", "D", "E"].map(str::to_string);

        let page = paginate(&names[..], request(2, 2)).await.unwrap();

        assert_eq!(page.items, vec!["C".to_string(), "D".to_string()]);
        assert_eq!(page.total_count, 5);
    }

    #[tokio::test]
    async fn page_length_matches_formula_for_every_size() {
        let source: Vec<i64> = (0..23).collect();

        for page_size in 1..=BOUNDS.max_page_size {
            for page_number in 1..=(23 / page_size + 2) {
                let page = paginate(&source[..], request(page_number, page_size)).await.unwrap();
                assert_eq!(
                    page.items.len(),
                    expected_len(23, page_number, page_size),
                    "page {page_number} size {page_size}"
                );
                assert_eq!(page.total_count, 23);
            }
        }
    }

    #[tokio::test]
    async fn empty_source_never_fails() {
        let source: Vec<i64> = Vec::new();

        for (page_number, page_size) in [(1, 1), (1, 50), (7, 3), (1000, 10)] {
            let page = paginate(&source[..], request(page_number, page_size)).await.unwrap();
            assert!(page.items.is_empty());
            assert_eq!(page.total_count, 0);
        }
    }

    #[tokio::test]
    async fn repeated_calls_return_identical_pages() {
        let source: Vec<i64> = (0..17).collect();

        let first = paginate(&source[..], request(3, 4)).await.unwrap();
        let second = paginate(&source[..], request(3, 4)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.items, vec![8, 9, 10, 11]);
    }

    struct CountingSource {
        rows: Vec<i64>,
        counts: AtomicUsize,
        slices: AtomicUsize,
    }

    #[async_trait]
    impl PageSource for CountingSource {
        type Item = i64;
        type Error = String;

        async fn count(&self) -> Result<i64, String> {
            self.counts.fetch_add(1, Ordering::SeqCst);
            Ok(self.rows.len() as i64)
        }

        async fn ordered_slice(&self, skip: i64, take: i64) -> Result<Vec<i64>, String> {
            self.slices.fetch_add(1, Ordering::SeqCst);
            Ok(self.rows.iter().skip(skip as usize).take(take as usize).copied().collect())
        }
    }

    #[tokio::test]
    async fn issues_exactly_one_count_and_one_slice() {
        let source = CountingSource {
            rows: (0..100).collect(),
            counts: AtomicUsize::new(0),
            slices: AtomicUsize::new(0),
        };

        let page = paginate(&source, request(2, 10)).await.unwrap();

        assert_eq!(page.items.first(), Some(&10));
        assert_eq!(source.counts.load(Ordering::SeqCst), 1);
        assert_eq!(source.slices.load(Ordering::SeqCst), 1);
    }

    struct FailingSource;

    #[async_trait]
    impl PageSource for FailingSource {
        type Item = i64;
        type Error = String;

        async fn count(&self) -> Result<i64, String> {
            Ok(3)
        }

        async fn ordered_slice(&self, _skip: i64, _take: i64) -> Result<Vec<i64>, String> {
            Err("connection reset".to_string())
        }
    }

    #[tokio::test]
    async fn store_errors_propagate_unchanged() {
        let err = paginate(&FailingSource, request(1, 10)).await.unwrap_err();
        assert_eq!(err, "connection reset");
    }

    #[test]
    fn zero_page_number_is_treated_as_first_page() {
        let request = request(0, 10);
        assert_eq!(request.page_number(), 1);
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn page_size_is_clamped_to_bounds() {
        assert_eq!(request(1, 0).page_size(), 1);
        assert_eq!(request(1, 500).page_size(), BOUNDS.max_page_size);
        assert_eq!(request(3, 20).offset(), 40);
    }

    #[test]
    fn negative_values_are_rejected() {
        assert_eq!(
            PageRequest::new(-1, 10, BOUNDS),
            Err(PaginationError::Negative { field: "page", value: -1 })
        );
        assert_eq!(
            PageRequest::new(1, -5, BOUNDS),
            Err(PaginationError::Negative { field: "page_size", value: -5 })
        );
    }

    #[test]
    fn query_defaults_apply_when_absent_or_blank() {
        let parsed = PageRequest::from_query(&raw(None, Some(" ")), BOUNDS).unwrap();
        assert_eq!(parsed.page_number(), 1);
        assert_eq!(parsed.page_size(), BOUNDS.default_page_size);
    }

    #[test]
    fn query_rejects_non_integers() {
        let err = PageRequest::from_query(&raw(Some("two"), None), BOUNDS).unwrap_err();
        assert_eq!(err, PaginationError::NotAnInteger { field: "page", value: "two".to_string() });

        let err = PageRequest::from_query(&raw(None, Some("1.5")), BOUNDS).unwrap_err();
        assert!(matches!(err, PaginationError::NotAnInteger { field: "page_size", .. }));
    }

    #[test]
    fn query_accepts_spanish_aliases() {
        let parsed: RawPageQuery = serde_json::from_value(serde_json::json!({
            "pagina": "3",
            "recordsPorPagina": "7"
        }))
        .unwrap();

        let request = PageRequest::from_query(&parsed, BOUNDS).unwrap();
        assert_eq!(request.page_number(), 3);
        assert_eq!(request.page_size(), 7);
    }

    #[test]
    fn unlisted_size_names_fall_back_to_default() {
        let parsed: RawPageQuery =
            serde_json::from_value(serde_json::json!({ "pageSize": "7" })).unwrap();

        let request = PageRequest::from_query(&parsed, BOUNDS).unwrap();
        assert_eq!(request.page_size(), BOUNDS.default_page_size);
    }

    #[test]
    fn huge_page_number_saturates_offset() {
        let request = request(i64::MAX, 50);
        assert_eq!(request.offset(), i64::MAX);
    }

    #[test]
    fn header_value_is_bit_exact_json() {
        let value = TotalCountHeader(5).header_value().unwrap();
        assert_eq!(value.to_str().unwrap(), r#"{"totalCount":5}"#);
    }

    #[test]
    fn page_map_keeps_total() {
        let page = Page { items: vec![1, 2], total_count: 9 }.map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20]);
        assert_eq!(page.total_count_header(), TotalCountHeader(9));
    }
}
