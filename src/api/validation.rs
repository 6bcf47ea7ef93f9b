use super::ApiError;
use crate::config::PaginationConfig;
use crate::models::PageRequest;

pub fn validate_id(resource: &str, id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid {resource} ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

/// Resolve `page`/`limit` query values against the configured page sizes.
/// The row offset of the requested page must fit in an SQL integer.
pub fn page_request(
    page: Option<u64>,
    limit: Option<u64>,
    config: &PaginationConfig,
) -> Result<PageRequest, ApiError> {
    let limit = limit
        .unwrap_or(config.default_page_size)
        .min(config.max_page_size);
    let request = PageRequest::new(page.unwrap_or(1), limit);

    let offset = request.index().checked_mul(request.limit);
    if !offset.is_some_and(|o| i64::try_from(o).is_ok()) {
        return Err(ApiError::field(
            "page",
            format!("Page {} is out of range", request.page),
        ));
    }

    Ok(request)
}

/// Boolean query flag given as `1`/`0` or `true`/`false`.
pub fn parse_flag(name: &str, value: Option<&str>) -> Result<bool, ApiError> {
    match value.map(str::trim) {
        None | Some("") => Ok(false),
        Some("1" | "true" | "True") => Ok(true),
        Some("0" | "false" | "False") => Ok(false),
        Some(other) => Err(ApiError::field(
            name,
            format!("Invalid value '{other}': expected 1/0 or true/false"),
        )),
    }
}

/// The `author` filter is an exact user id.
pub fn parse_author(value: Option<&str>) -> Result<Option<i32>, ApiError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<i32>()
            .map(Some)
            .map_err(|_| ApiError::field("author", format!("Invalid author id '{raw}'"))),
    }
}
