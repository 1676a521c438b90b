use std::borrow::Cow;

use validator::ValidationError;

pub(crate) fn trim_author_name(name: &str) -> String {
    name.trim().to_string()
}

/// Custom `validator` rule: the first letter must not be lowercase.
pub(crate) fn starts_capitalized(name: &str) -> Result<(), ValidationError> {
    if name.chars().next().is_some_and(char::is_lowercase) {
        return Err(ValidationError::new("capitalized").with_message(Cow::Borrowed(
            "The first letter of the author name must be uppercase",
        )));
    }
    Ok(())
}
