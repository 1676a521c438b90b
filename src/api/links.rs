//! Hypermedia links attached to rendered resources.
//!
//! Links are built per response from named routes. Whether the write actions
//! (`update`, `delete`, `create`) appear depends on a single authorization
//! outcome evaluated before decoration.

use std::collections::HashMap;

use axum::http::HeaderMap;
use serde::Serialize;
use thiserror::Error;

use crate::api::errors::ApiError;

/// Requests opt into links with `incluirHATEOAS: Y`.
pub(crate) const INCLUDE_LINKS_HEADER: &str = "incluirhateoas";
const INCLUDE_LINKS_VALUE: &str = "Y";

pub(crate) fn wants_links(headers: &HeaderMap) -> bool {
    headers
        .get(INCLUDE_LINKS_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim() == INCLUDE_LINKS_VALUE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AuthorizationOutcome {
    pub(crate) granted: bool,
}

impl AuthorizationOutcome {
    pub(crate) const DENIED: Self = Self { granted: false };
    pub(crate) const GRANTED: Self = Self { granted: true };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct Link {
    pub(crate) href: String,
    pub(crate) rel: &'static str,
    pub(crate) method: &'static str,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum LinkError {
    #[error("unknown route '{0}'")]
    UnknownRoute(String),
    #[error("route '{route}' needs parameter '{param}'")]
    MissingParam { route: String, param: String },
}

impl From<LinkError> for ApiError {
    fn from(err: LinkError) -> Self {
        ApiError::internal(err, "Failed to build resource links")
    }
}

pub(crate) trait UrlBuilder {
    fn build_url(&self, route_name: &str, params: &[(&str, String)]) -> Result<String, LinkError>;
}

/// Route names mapped to path templates such as `/api/authors/{id}`.
#[derive(Debug, Clone, Default)]
pub(crate) struct RouteTable {
    templates: HashMap<&'static str, String>,
}

impl RouteTable {
    pub(crate) fn with_route(mut self, name: &'static str, template: impl Into<String>) -> Self {
        self.templates.insert(name, template.into());
        self
    }
}

impl UrlBuilder for RouteTable {
    fn build_url(&self, route_name: &str, params: &[(&str, String)]) -> Result<String, LinkError> {
        let template = self
            .templates
            .get(route_name)
            .ok_or_else(|| LinkError::UnknownRoute(route_name.to_string()))?;

        let mut url = template.clone();
        for (name, value) in params {
            url = url.replace(&format!("{{{name}}}"), value);
        }

        if let Some(start) = url.find('{') {
            let param = url[start + 1..].split('}').next().unwrap_or_default().to_string();
            return Err(LinkError::MissingParam { route: route_name.to_string(), param });
        }

        Ok(url)
    }
}

/// Route names for the actions of one resource type.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResourceRoutes {
    pub(crate) get: &'static str,
    pub(crate) update: &'static str,
    pub(crate) delete: &'static str,
    pub(crate) list: &'static str,
    pub(crate) create: &'static str,
}

/// Resources addressable by an `{id}` route parameter.
pub(crate) trait Identified {
    fn id_param(&self) -> String;
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct Linked<T> {
    #[serde(flatten)]
    pub(crate) resource: T,
    pub(crate) links: Vec<Link>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct LinkedCollection<T> {
    pub(crate) values: Vec<Linked<T>>,
    pub(crate) links: Vec<Link>,
}

pub(crate) struct LinkDecorator<'a, U: ?Sized> {
    urls: &'a U,
    routes: ResourceRoutes,
}

impl<'a, U> LinkDecorator<'a, U>
where
    U: UrlBuilder + ?Sized,
{
    pub(crate) fn new(urls: &'a U, routes: ResourceRoutes) -> Self {
        Self { urls, routes }
    }

    pub(crate) fn decorate<T: Identified>(
        &self,
        resource: T,
        outcome: AuthorizationOutcome,
    ) -> Result<Linked<T>, LinkError> {
        let params = [("id", resource.id_param())];

        let mut links = vec![self.link(self.routes.get, &params, "self", "GET")?];
        if outcome.granted {
            links.push(self.link(self.routes.update, &params, "update", "PUT")?);
            links.push(self.link(self.routes.delete, &params, "delete", "DELETE")?);
        }

        Ok(Linked { resource, links })
    }

    pub(crate) fn decorate_list<T: Identified>(
        &self,
        resources: Vec<T>,
        outcome: AuthorizationOutcome,
    ) -> Result<LinkedCollection<T>, LinkError> {
        let values = resources
            .into_iter()
            .map(|resource| self.decorate(resource, outcome))
            .collect::<Result<Vec<_>, _>>()?;

        let mut links = vec![self.link(self.routes.list, &[], "collection", "GET")?];
        if outcome.granted {
            links.push(self.link(self.routes.create, &[], "create", "POST")?);
        }

        Ok(LinkedCollection { values, links })
    }

    fn link(
        &self,
        route: &'static str,
        params: &[(&str, String)],
        rel: &'static str,
        method: &'static str,
    ) -> Result<Link, LinkError> {
        Ok(Link { href: self.urls.build_url(route, params)?, rel, method })
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Item {
        id: i64,
        name: &'static str,
    }

    impl Identified for Item {
        fn id_param(&self) -> String {
            self.id.to_string()
        }
    }

    const ROUTES: ResourceRoutes = ResourceRoutes {
        get: "get-item",
        update: "update-item",
        delete: "delete-item",
        list: "list-items",
        create: "create-item",
    };

    fn table() -> RouteTable {
        RouteTable::default()
            .with_route("get-item", "/api/items/{id}")
            .with_route("update-item", "/api/items/{id}")
            .with_route("delete-item", "/api/items/{id}")
            .with_route("list-items", "/api/items")
            .with_route("create-item", "/api/items")
    }

    fn rels<T>(linked: &Linked<T>) -> Vec<&'static str> {
        linked.links.iter().map(|link| link.rel).collect()
    }

    #[test]
    fn denied_resource_only_links_itself() {
        let table = table();
        let decorator = LinkDecorator::new(&table, ROUTES);

        let linked = decorator.decorate(Item { id: 7, name: "Borges" }, AuthorizationOutcome::DENIED);

        let linked = linked.unwrap();
        assert_eq!(
            linked.links,
            vec![Link { href: "/api/items/7".into(), rel: "self", method: "GET" }]
        );
        assert_eq!(linked.resource, Item { id: 7, name: "Borges" });
    }

    #[test]
    fn granted_resource_adds_update_and_delete() {
        let table = table();
        let decorator = LinkDecorator::new(&table, ROUTES);

        let linked =
            decorator.decorate(Item { id: 7, name: "Borges" }, AuthorizationOutcome::GRANTED).unwrap();

        assert_eq!(rels(&linked), vec!["self", "update", "delete"]);
        let methods: Vec<_> = linked.links.iter().map(|link| link.method).collect();
        assert_eq!(methods, vec!["GET", "PUT", "DELETE"]);
    }

    #[test]
    fn list_shares_one_outcome_across_elements() {
        let table = table();
        let decorator = LinkDecorator::new(&table, ROUTES);
        let items = vec![Item { id: 1, name: "Austen" }, Item { id: 2, name: "Cortázar" }];

        let denied = decorator.decorate_list(items.clone(), AuthorizationOutcome::DENIED).unwrap();
        assert!(denied.values.iter().all(|value| rels(value) == vec!["self"]));
        assert_eq!(
            denied.links,
            vec![Link { href: "/api/items".into(), rel: "collection", method: "GET" }]
        );

        let granted = decorator.decorate_list(items, AuthorizationOutcome::GRANTED).unwrap();
        assert!(granted.values.iter().all(|value| rels(value) == vec!["self", "update", "delete"]));
        let list_rels: Vec<_> = granted.links.iter().map(|link| link.rel).collect();
        assert_eq!(list_rels, vec!["collection", "create"]);
    }

    #[test]
    fn linked_resource_serializes_flat() {
        let table = table();
        let decorator = LinkDecorator::new(&table, ROUTES);

        let linked =
            decorator.decorate(Item { id: 3, name: "Rulfo" }, AuthorizationOutcome::DENIED).unwrap();

        assert_eq!(
            serde_json::to_value(&linked).unwrap(),
            json!({
                "id": 3,
                "name": "Rulfo",
                "links": [{ "href": "/api/items/3", "rel": "self", "method": "GET" }]
            })
        );
    }

    #[test]
    fn unknown_route_is_an_error() {
        let err = RouteTable::default().build_url("missing", &[]).unwrap_err();
        assert_eq!(err, LinkError::UnknownRoute("missing".into()));
    }

    #[test]
    fn unfilled_parameter_is_an_error() {
        let err = table().build_url("get-item", &[]).unwrap_err();
        assert_eq!(
            err,
            LinkError::MissingParam { route: "get-item".into(), param: "id".into() }
        );
    }

    #[test]
    fn links_are_opt_in_by_header() {
        let mut headers = HeaderMap::new();
        assert!(!wants_links(&headers));

        headers.insert(INCLUDE_LINKS_HEADER, HeaderValue::from_static("N"));
        assert!(!wants_links(&headers));

        headers.insert(INCLUDE_LINKS_HEADER, HeaderValue::from_static("Y"));
        assert!(wants_links(&headers));
    }
}
