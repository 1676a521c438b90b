use std::sync::Arc;

use sqlx::PgPool;

use crate::api::authors;
use crate::api::links::RouteTable;
use crate::core::config::Settings;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    routes: RouteTable,
}

impl AppState {
    pub(crate) fn new(settings: Settings, db: PgPool) -> Self {
        let routes = authors::register_routes(RouteTable::default(), &settings.api().api_prefix);
        Self { inner: Arc::new(InnerState { settings, db, routes }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    /// Named routes used to materialize hypermedia links and `Location` headers.
    pub(crate) fn routes(&self) -> &RouteTable {
        &self.inner.routes
    }
}
