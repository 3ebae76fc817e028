//! Filter requests.
//!
//! [`FilterRequest`] is the decoded view the grid consumes. [`GridRequest`]
//! is the bundled implementation, decodable from query-string style
//! parameters:
//!
//! | Param | Shape |
//! |-------|-------|
//! | `filter` | JSON object, key → scalar or list |
//! | `advanced_filter` | JSON array of groups, each an array of conditions |
//! | `search` | free text |
//! | `orderby` | `+col,-col` |
//! | `page` | 1-indexed page |
//! | `limit` | items per page, default 10 |
//!
//! Inside `filter`, a `search` (or `_MODIFIER_SEARCH`) key carries the search
//! term rather than a column condition.

use std::collections::BTreeMap;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};
use crate::op::Operator;
use crate::page::DEFAULT_ITEMS_PER_PAGE;
use crate::sort::SortRequest;
use crate::value::FilterValue;

/// Filter key that carries the search term.
pub const SEARCH_KEY: &str = "search";
/// Legacy filter key that carries the search term.
pub const MODIFIER_SEARCH: &str = "_MODIFIER_SEARCH";
/// Filter value that selects `NEMPTY`.
pub const MODIFIER_VAL_NOT_NULL: &str = "_MODIFIER_VAL_NOT_NULL";
/// Filter value that selects `EMPTY`.
pub const MODIFIER_VAL_NULL: &str = "_MODIFIER_VAL_NULL";

/// The decoded request a grid compiles.
pub trait FilterRequest {
    /// Simple conditions, implicitly AND-ed. Keys may carry an operator
    /// suffix (`int_gte`) and values may be null modifiers.
    fn simple_filter(&self) -> &BTreeMap<String, FilterValue>;

    /// Advanced condition groups: OR within a group, AND across groups.
    fn advanced_filter(&self) -> &[Vec<ConditionEntry>];

    /// Free-text search term.
    fn search(&self) -> Option<&str>;

    /// Sort entries in precedence order.
    fn order_by(&self) -> &[SortRequest];

    /// 1-indexed page.
    fn page(&self) -> u64;

    fn items_per_page(&self) -> u64;

    /// Receives the total row count computed for this request.
    fn set_total(&mut self, total: u64);
}

/// One advanced condition as it arrives on the wire.
///
/// Every field is optional so that incomplete entries reach the assembler
/// and fail there as malformed, instead of failing decoding.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConditionEntry {
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default, alias = "operation")]
    pub operator: Option<String>,
    /// `None` when the field is absent; `Some(Null)` for an explicit null.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub value: Option<FilterValue>,
}

fn present<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<FilterValue>, D::Error> {
    FilterValue::deserialize(d).map(Some)
}

impl ConditionEntry {
    pub fn new(column: impl Into<String>, operator: Operator, value: impl Into<FilterValue>) -> Self {
        ConditionEntry {
            column: Some(column.into()),
            operator: Some(operator.as_str().to_string()),
            value: Some(value.into()),
        }
    }

    /// A condition with no value, for `EMPTY` / `NEMPTY`.
    pub fn without_value(column: impl Into<String>, operator: Operator) -> Self {
        ConditionEntry {
            column: Some(column.into()),
            operator: Some(operator.as_str().to_string()),
            value: None,
        }
    }

    /// The parsed operator. Unknown names parse as `None`.
    pub fn parsed_operator(&self) -> Option<Operator> {
        self.operator.as_deref().and_then(Operator::parse)
    }
}

fn lenient_u64<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<u64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Option::<Raw>::deserialize(d)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s.trim().parse().map(Some).map_err(de::Error::custom),
    }
}

/// Raw request parameters, before decoding.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GridParams {
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default, alias = "advancedFilter")]
    pub advanced_filter: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, alias = "orderBy", alias = "order_by")]
    pub orderby: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub page: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub limit: Option<u64>,
}

impl GridParams {
    /// Collects query-string pairs. Unknown keys are ignored; the last
    /// occurrence of a key wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = GridParams::default();
        for (key, value) in pairs {
            let value = value.into();
            match key.as_ref() {
                "filter" => params.filter = Some(value),
                "advanced_filter" | "advancedFilter" => params.advanced_filter = Some(value),
                "search" => params.search = Some(value),
                "orderby" | "orderBy" | "order_by" => params.orderby = Some(value),
                "page" => params.page = parse_count("page", &value)?,
                "limit" => params.limit = parse_count("limit", &value)?,
                _ => {}
            }
        }
        Ok(params)
    }
}

fn parse_count(name: &str, value: &str) -> Result<Option<u64>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| GridError::request(format!("'{name}' must be a positive integer, got '{value}'")))
}

/// The bundled [`FilterRequest`].
///
/// ```
/// use standout_grid::{FilterRequest, GridRequest};
///
/// let request = GridRequest::from_json(
///     r#"{"filter": "{\"int_gte\": 8, \"search\": \"9\"}", "orderby": "-int", "page": "2"}"#,
/// )
/// .unwrap();
/// assert_eq!(request.search(), Some("9"));
/// assert_eq!(request.page(), 2);
/// assert_eq!(request.items_per_page(), 10);
/// assert!(request.simple_filter().contains_key("int_gte"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct GridRequest {
    filter: BTreeMap<String, FilterValue>,
    additional: BTreeMap<String, FilterValue>,
    effective: BTreeMap<String, FilterValue>,
    advanced: Vec<Vec<ConditionEntry>>,
    search: Option<String>,
    order_by: Vec<SortRequest>,
    page: Option<u64>,
    limit: Option<u64>,
    total: Option<u64>,
}

impl GridRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes raw parameters.
    pub fn from_params(params: GridParams) -> Result<Self> {
        let mut request = GridRequest::new();

        if let Some(filter) = params.filter.as_deref().filter(|f| !f.trim().is_empty()) {
            request.decode_filter(filter)?;
        }

        if let Some(advanced) = params
            .advanced_filter
            .as_deref()
            .filter(|f| !f.trim().is_empty())
        {
            request.advanced = decode_advanced(advanced)?;
        }

        if let Some(search) = params.search {
            request.search = Some(search);
        }

        if let Some(orderby) = params.orderby.as_deref() {
            request.order_by = SortRequest::parse_list(orderby);
        }

        request.page = params.page;
        request.limit = params.limit;
        request.refresh();
        Ok(request)
    }

    /// Decodes parameters from a JSON object.
    pub fn from_json(json: &str) -> Result<Self> {
        let params: GridParams =
            serde_json::from_str(json).map_err(|e| GridError::request(e.to_string()))?;
        Self::from_params(params)
    }

    /// Decodes parameters from query-string pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self::from_params(GridParams::from_pairs(pairs)?)
    }

    fn decode_filter(&mut self, filter: &str) -> Result<()> {
        let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(filter)
            .map_err(|e| GridError::request(format!("'filter' must be a JSON object: {e}")))?;

        for (key, raw) in object {
            let value = FilterValue::from_json(raw).ok_or_else(|| {
                GridError::request(format!("filter '{key}' must be a scalar or a list"))
            })?;
            if key == SEARCH_KEY || key == MODIFIER_SEARCH {
                self.search = Some(value.text());
            } else {
                self.filter.insert(key, value);
            }
        }
        Ok(())
    }

    fn refresh(&mut self) {
        self.effective = self.filter.clone();
        self.effective
            .extend(self.additional.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    /// Adds a client filter condition.
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.filter.insert(key.into(), value.into());
        self.refresh();
        self
    }

    /// Adds a server-side condition that overrides any client condition on
    /// the same key. Additional conditions are not echoed in header params.
    pub fn with_additional_filter(
        mut self,
        key: impl Into<String>,
        value: impl Into<FilterValue>,
    ) -> Self {
        self.additional.insert(key.into(), value.into());
        self.refresh();
        self
    }

    /// Appends an advanced condition group.
    pub fn with_condition_group(mut self, group: Vec<ConditionEntry>) -> Self {
        self.advanced.push(group);
        self
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn with_order(mut self, order: SortRequest) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn with_page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The total reported by the last fetch, if any.
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Request parameters to echo back to clients.
    ///
    /// `page` is null unless the client sent one. Filter values are
    /// rendered as text, lists comma-joined, and the search term appears
    /// under `filter.search`.
    pub fn params_for_header(&self) -> serde_json::Value {
        let mut filter: serde_json::Map<String, serde_json::Value> = self
            .filter
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.text())))
            .collect();
        if let Some(search) = &self.search {
            filter.insert(SEARCH_KEY.to_string(), serde_json::Value::String(search.clone()));
        }

        let orderby = (!self.order_by.is_empty()).then(|| SortRequest::format_list(&self.order_by));

        serde_json::json!({
            "filter": filter,
            "orderby": orderby,
            "page": self.page,
            "limit": self.items_per_page(),
            "total": self.total,
        })
    }
}

fn decode_advanced(json: &str) -> Result<Vec<Vec<ConditionEntry>>> {
    let groups: Vec<Vec<ConditionEntry>> = serde_json::from_str(json).map_err(|e| {
        GridError::request(format!("'advanced_filter' must be a list of condition groups: {e}"))
    })?;

    // Entries naming an operator this grid does not know are dropped.
    Ok(groups
        .into_iter()
        .map(|group| {
            group
                .into_iter()
                .filter(|entry| match entry.operator.as_deref() {
                    Some(name) => Operator::parse(name).is_some(),
                    None => true,
                })
                .collect()
        })
        .collect())
}

impl FilterRequest for GridRequest {
    fn simple_filter(&self) -> &BTreeMap<String, FilterValue> {
        &self.effective
    }

    fn advanced_filter(&self) -> &[Vec<ConditionEntry>] {
        &self.advanced
    }

    fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    fn order_by(&self) -> &[SortRequest] {
        &self.order_by
    }

    fn page(&self) -> u64 {
        self.page.unwrap_or(1)
    }

    fn items_per_page(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_ITEMS_PER_PAGE)
    }

    fn set_total(&mut self, total: u64) {
        self.total = Some(total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_filter_and_search_modifier() {
        let request = GridRequest::from_json(r#"{"filter": "{\"_MODIFIER_SEARCH\": \"9\"}"}"#).unwrap();
        assert_eq!(request.search(), Some("9"));
        assert!(request.simple_filter().is_empty());
    }

    #[test]
    fn decodes_list_values() {
        let request = GridRequest::from_json(r#"{"filter": "{\"int\": [6, 7, 8]}"}"#).unwrap();
        assert_eq!(
            request.simple_filter().get("int"),
            Some(&FilterValue::from(vec![6, 7, 8]))
        );
    }

    #[test]
    fn rejects_non_object_filter() {
        let err = GridRequest::from_json(r#"{"filter": "[1, 2]"}"#).unwrap_err();
        assert!(matches!(err, GridError::Request(_)));

        let err = GridRequest::from_json(r#"{"filter": "{\"a\": {\"b\": 1}}"}"#).unwrap_err();
        assert!(matches!(err, GridError::Request(_)));
    }

    #[test]
    fn page_and_limit_accept_strings_and_numbers() {
        let request = GridRequest::from_json(r#"{"page": "3", "limit": 2}"#).unwrap();
        assert_eq!(request.page(), 3);
        assert_eq!(request.items_per_page(), 2);

        let err = GridRequest::from_json(r#"{"page": "three"}"#).unwrap_err();
        assert!(matches!(err, GridError::Request(_)));
    }

    #[test]
    fn defaults() {
        let request = GridRequest::new();
        assert_eq!(request.page(), 1);
        assert_eq!(request.items_per_page(), 10);
        assert!(request.order_by().is_empty());
        assert_eq!(request.search(), None);
    }

    #[test]
    fn query_pairs() {
        let request = GridRequest::from_pairs([
            ("orderby", "+id"),
            ("page", "3"),
            ("limit", "2"),
            ("ignored", "x"),
        ])
        .unwrap();
        assert_eq!(request.order_by(), &[SortRequest::asc("id")]);
        assert_eq!(request.page(), 3);

        assert!(GridRequest::from_pairs([("limit", "-1")]).is_err());
    }

    #[test]
    fn condition_entries_accept_operation_alias_and_track_missing_values() {
        let request = GridRequest::from_json(
            &json!({
                "advanced_filter": json!([
                    [
                        {"column": "string", "operation": "LIKE", "value": "ri"},
                        {"column": "string", "operator": "EMPTY"},
                        {"column": "string", "operator": "EQ", "value": null}
                    ]
                ])
                .to_string()
            })
            .to_string(),
        )
        .unwrap();

        let group = &request.advanced_filter()[0];
        assert_eq!(group[0].parsed_operator(), Some(Operator::Like));
        assert_eq!(group[1].value, None);
        assert_eq!(group[2].value, Some(FilterValue::Null));
    }

    #[test]
    fn unknown_operators_are_dropped_on_decode() {
        let request = GridRequest::from_json(
            &json!({
                "advanced_filter": r#"[[{"column": "string", "operation": "FL"}]]"#
            })
            .to_string(),
        )
        .unwrap();
        assert_eq!(request.advanced_filter().len(), 1);
        assert!(request.advanced_filter()[0].is_empty());
    }

    #[test]
    fn additional_filters_override() {
        let request = GridRequest::new()
            .with_filter("string", MODIFIER_VAL_NOT_NULL)
            .with_additional_filter("string", FilterValue::Null);
        assert_eq!(
            request.simple_filter().get("string"),
            Some(&FilterValue::Null)
        );
    }

    #[test]
    fn header_params() {
        let mut request =
            GridRequest::from_json(r#"{"filter": "{\"int\": [6, 7, 8]}"}"#).unwrap();
        request.set_total(3);
        assert_eq!(
            request.params_for_header(),
            json!({
                "filter": {"int": "6,7,8"},
                "orderby": null,
                "page": null,
                "limit": 10,
                "total": 3
            })
        );

        let mut request = GridRequest::from_pairs([("orderby", "+id"), ("page", "3"), ("limit", "2")])
            .unwrap();
        request.set_total(10);
        assert_eq!(
            request.params_for_header(),
            json!({
                "filter": {},
                "orderby": "+id",
                "page": 3,
                "limit": 2,
                "total": 10
            })
        );
    }

    #[test]
    fn header_reports_search_inside_filter() {
        let request = GridRequest::from_json(r#"{"filter": "{\"search\": \"Unknown\"}"}"#).unwrap();
        assert_eq!(
            request.params_for_header()["filter"],
            json!({"search": "Unknown"})
        );
    }
}
