pub(crate) mod authors;
pub(crate) mod users;
