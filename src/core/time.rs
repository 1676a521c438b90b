use time::{OffsetDateTime, PrimitiveDateTime};

/// Current UTC instant as a timezone-less value for `TIMESTAMP` columns.
pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}
