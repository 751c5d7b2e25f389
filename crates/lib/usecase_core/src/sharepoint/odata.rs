//! OData literal escaping and query-string building.

use urlencoding::encode;

use super::ListQuery;

/// Doubles single quotes so `value` can sit inside `'...'`.
pub fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// `Field eq 'value'` with the value escaped.
pub fn eq_filter(field: &str, value: &str) -> String {
    format!("{field} eq '{}'", escape_literal(value))
}

/// Renders `query` as `?%24select=...&%24filter=...`, or `""` when empty.
///
/// Both the `$name` and the value of each clause are percent-encoded.
pub fn query_string(query: &ListQuery) -> String {
    let clauses = [
        ("$select", query.select.as_deref()),
        ("$filter", query.filter.as_deref()),
        ("$orderby", query.orderby.as_deref()),
    ];

    let mut params: Vec<String> = clauses
        .iter()
        .filter_map(|(name, value)| {
            value
                .filter(|v| !v.is_empty())
                .map(|v| format!("{}={}", encode(name), encode(v)))
        })
        .collect();

    if let Some(top) = query.top.filter(|t| *t > 0) {
        params.push(format!("{}={top}", encode("$top")));
    }

    if params.is_empty() {
        String::new()
    } else {
        format!("?{}", params.join("&"))
    }
}
