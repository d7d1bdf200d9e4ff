//! Request parameters and response rendering for the affiliated products page.

use serde::Deserialize;

use storefront_affiliates::{Direction, Sort, SortKey};
use storefront_core::{DomainError, DomainResult};

/// Query string of `GET /products/affiliated`.
///
/// Sort arrives bracket-encoded (`sort[key]=revenue&sort[direction]=desc`).
/// Every field is kept as raw text and validated by [`Self::page`] and
/// [`Self::sort`]; a query string that does not deserialize at all (e.g. a
/// repeated key) is rejected by the handler as `validation_error`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AffiliatedProductsParams {
    pub query: Option<String>,
    pub page: Option<String>,
    #[serde(rename = "sort[key]")]
    pub sort_key: Option<String>,
    #[serde(rename = "sort[direction]")]
    pub sort_direction: Option<String>,
}

impl AffiliatedProductsParams {
    pub fn page(&self) -> DomainResult<Option<u32>> {
        match non_blank(&self.page) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<u32>()
                .map(Some)
                .map_err(|_| DomainError::validation(format!("page must be a positive integer, got '{raw}'"))),
        }
    }

    /// Missing key means default ordering; a key without direction sorts ascending.
    pub fn sort(&self) -> DomainResult<Option<Sort>> {
        let Some(key) = non_blank(&self.sort_key) else {
            return Ok(None);
        };
        let key = parse_sort_key(key)?;
        let direction = match non_blank(&self.sort_direction) {
            None => Direction::Asc,
            Some(raw) => parse_direction(raw)?,
        };
        Ok(Some(Sort::new(key, direction)))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_sort_key(raw: &str) -> DomainResult<SortKey> {
    match raw {
        "product_name" => Ok(SortKey::ProductName),
        "revenue" => Ok(SortKey::Revenue),
        "sales_count" => Ok(SortKey::SalesCount),
        "commission" => Ok(SortKey::Commission),
        other => Err(DomainError::validation(format!(
            "sort[key] must be one of: product_name, revenue, sales_count, commission (got '{other}')"
        ))),
    }
}

fn parse_direction(raw: &str) -> DomainResult<Direction> {
    match raw.to_ascii_lowercase().as_str() {
        "asc" => Ok(Direction::Asc),
        "desc" => Ok(Direction::Desc),
        _ => Err(DomainError::validation(format!(
            "sort[direction] must be asc or desc (got '{raw}')"
        ))),
    }
}

/// Server-rendered shell for browsers: a titled page with the props embedded
/// as JSON for the front end to hydrate.
pub fn render_shell<T: serde::Serialize>(title: &str, props: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(props)?;
    // `</script>` inside a string value must not close the tag.
    let json = json.replace('<', "\\u003c");
    Ok(format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n<div id=\"app\"></div>\n<script type=\"application/json\" id=\"page-props\">{json}</script>\n</body>\n</html>\n",
        escape_html(title)
    ))
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
