pub(crate) mod auth;
pub(crate) mod authors;
pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod header_gate;
pub(crate) mod links;
pub(crate) mod pagination;
pub(crate) mod router;
pub(crate) mod validation;
