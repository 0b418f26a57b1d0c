//! Catalog query builder.
//!
//! A listing request arrives as a flat list of string pairs
//! (`keyword=phone&price[gte]=100&tags=summer,sale&page=2`). [`ProductQuery::parse`]
//! turns it into a [`ProductFilter`]: a conjunction of typed [`Criterion`]s plus a
//! sort order. The filter is storage-agnostic; `sql.rs` renders it as a SeaORM
//! condition and [`ProductFilter::matches`] evaluates it in memory.

mod sql;

use std::cmp::Ordering;

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Product, ProductStatus},
};

/// Keys consumed by the builder itself rather than treated as field filters.
const RESERVED_KEYS: [&str; 5] = ["keyword", "page", "limit", "sort", "fields"];

/// Product attributes a listing can filter on. Any other field is rejected.
const FILTER_FIELDS: [&str; 13] = [
    "price",
    "ratings",
    "stock",
    "numOfReviews",
    "name",
    "description",
    "category",
    "brand",
    "status",
    "isFeatured",
    "owner",
    "user",
    "tags",
];

/// Whether a listing hides non-active products when no `status` is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusScope {
    /// Storefront listing: `status == Active` unless the caller asks otherwise.
    ActiveByDefault,
    /// Admin listing: every status is visible.
    Unrestricted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    fn from_operator(op: &str) -> Option<Self> {
        match op {
            "gt" => Some(Comparison::Gt),
            "gte" => Some(Comparison::Gte),
            "lt" => Some(Comparison::Lt),
            "lte" => Some(Comparison::Lte),
            _ => None,
        }
    }

    pub fn holds(&self, left: f64, right: f64) -> bool {
        match self {
            Comparison::Eq => left == right,
            Comparison::Gt => left > right,
            Comparison::Gte => left >= right,
            Comparison::Lt => left < right,
            Comparison::Lte => left <= right,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericField {
    Price,
    Ratings,
    Stock,
    NumOfReviews,
}

impl NumericField {
    fn value_of(&self, product: &Product) -> f64 {
        match self {
            NumericField::Price => product.price as f64,
            NumericField::Ratings => product.ratings,
            NumericField::Stock => product.stock as f64,
            NumericField::NumOfReviews => product.num_of_reviews as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Name,
    Description,
    Category,
    Brand,
}

impl TextField {
    fn value_of<'a>(&self, product: &'a Product) -> &'a str {
        match self {
            TextField::Name => &product.name,
            TextField::Description => &product.description,
            TextField::Category => &product.category,
            TextField::Brand => &product.brand,
        }
    }
}

/// One conjunct of a product filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    /// Case-insensitive substring match on name OR description.
    Keyword(String),
    Numeric {
        field: NumericField,
        cmp: Comparison,
        value: f64,
    },
    Text {
        field: TextField,
        value: String,
    },
    Status(ProductStatus),
    Featured(bool),
    Owner(Uuid),
    /// At least one of the product's tags is in the set.
    TagsAny(Vec<String>),
}

impl Criterion {
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            Criterion::Keyword(keyword) => {
                let needle = keyword.to_lowercase();
                product.name.to_lowercase().contains(&needle)
                    || product.description.to_lowercase().contains(&needle)
            }
            Criterion::Numeric { field, cmp, value } => cmp.holds(field.value_of(product), *value),
            Criterion::Text { field, value } => field.value_of(product) == value,
            Criterion::Status(status) => product.status == *status,
            Criterion::Featured(flag) => product.is_featured == *flag,
            Criterion::Owner(owner) => product.owner == *owner,
            Criterion::TagsAny(tags) => product.tags.iter().any(|t| tags.contains(t)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Price,
    Ratings,
    Stock,
    Name,
    CreatedAt,
}

impl SortField {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "price" => Some(SortField::Price),
            "ratings" => Some(SortField::Ratings),
            "stock" => Some(SortField::Stock),
            "name" => Some(SortField::Name),
            "createdAt" | "created_at" => Some(SortField::CreatedAt),
            _ => None,
        }
    }

    fn compare(&self, a: &Product, b: &Product) -> Ordering {
        match self {
            SortField::Price => a.price.cmp(&b.price),
            SortField::Ratings => a.ratings.total_cmp(&b.ratings),
            SortField::Stock => a.stock.cmp(&b.stock),
            SortField::Name => a.name.cmp(&b.name),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

/// Conjunction of criteria plus an ordering. An empty filter matches everything.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFilter {
    criteria: Vec<Criterion>,
    sort: Vec<SortKey>,
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl ProductFilter {
    pub fn all() -> Self {
        Self {
            criteria: Vec::new(),
            sort: vec![SortKey {
                field: SortField::CreatedAt,
                descending: true,
            }],
        }
    }

    pub fn featured() -> Self {
        Self::all().with(Criterion::Featured(true))
    }

    pub fn with(mut self, criterion: Criterion) -> Self {
        self.criteria.push(criterion);
        self
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn sort_keys(&self) -> &[SortKey] {
        &self.sort
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.criteria.iter().all(|c| c.matches(product))
    }

    /// Ordering used by in-memory stores; ties fall back to the id so windows are stable.
    pub fn compare(&self, a: &Product, b: &Product) -> Ordering {
        for key in &self.sort {
            let ord = key.field.compare(a, b);
            let ord = if key.descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a.id.cmp(&b.id)
    }
}

/// A skip/limit slice over an ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub skip: u64,
    pub limit: u64,
}

impl Window {
    /// `page` is 1-based; values below 1 are treated as the first page.
    pub fn page(page: u64, per_page: u64) -> Self {
        Self {
            skip: per_page.saturating_mul(page.max(1) - 1),
            limit: per_page,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductQuery {
    pub filter: ProductFilter,
    pub page: u64,
}

impl ProductQuery {
    pub fn parse(params: &[(String, String)], scope: StatusScope) -> AppResult<Self> {
        let mut filter = ProductFilter::all();
        let mut page = 1;
        let mut status_given = false;

        for (key, value) in params {
            let key = key.trim();
            match key {
                "keyword" => {
                    let keyword = value.trim();
                    if !keyword.is_empty() {
                        filter.criteria.push(Criterion::Keyword(keyword.to_string()));
                    }
                }
                "page" => page = value.trim().parse::<u64>().ok().filter(|p| *p >= 1).unwrap_or(1),
                "sort" => filter.sort = parse_sort(value),
                _ if RESERVED_KEYS.contains(&key) => {}
                _ => {
                    if let Some(criterion) = parse_field(key, value)? {
                        if matches!(criterion, Criterion::Status(_)) {
                            status_given = true;
                        }
                        filter.criteria.push(criterion);
                    }
                }
            }
        }

        if scope == StatusScope::ActiveByDefault && !status_given {
            filter
                .criteria
                .push(Criterion::Status(ProductStatus::Active));
        }

        Ok(Self { filter, page })
    }

    pub fn window(&self, result_per_page: u64) -> Window {
        Window::page(self.page, result_per_page)
    }
}

/// Splits `field[op]` into its parts; anything else with a bracket is malformed.
fn split_bracket(key: &str) -> Option<(&str, &str)> {
    let (field, rest) = key.split_once('[')?;
    let op = rest.strip_suffix(']')?;
    if field.is_empty() || op.is_empty() || op.contains(['[', ']']) {
        return None;
    }
    Some((field, op))
}

fn parse_field(key: &str, value: &str) -> AppResult<Option<Criterion>> {
    let (field, cmp) = if key.contains('[') || key.contains(']') {
        let Some((field, op)) = split_bracket(key) else {
            tracing::debug!(key, "dropping malformed filter key");
            return Ok(None);
        };
        let Some(cmp) = Comparison::from_operator(op) else {
            tracing::debug!(key, op, "dropping unsupported filter operator");
            return Ok(None);
        };
        (field, cmp)
    } else {
        (key, Comparison::Eq)
    };

    if !FILTER_FIELDS.contains(&field) {
        return Err(unknown_field(field));
    }

    let numeric = match field {
        "price" => Some(NumericField::Price),
        "ratings" => Some(NumericField::Ratings),
        "stock" => Some(NumericField::Stock),
        "numOfReviews" => Some(NumericField::NumOfReviews),
        _ => None,
    };
    if let Some(field_kind) = numeric {
        let parsed = value.trim().parse::<f64>().ok().filter(|v| v.is_finite());
        let Some(parsed) = parsed else {
            return Err(AppError::validation(format!(
                "invalid numeric value '{value}' for {key}"
            )));
        };
        return Ok(Some(Criterion::Numeric {
            field: field_kind,
            cmp,
            value: parsed,
        }));
    }

    // Remaining fields only support plain equality.
    if cmp != Comparison::Eq {
        tracing::debug!(key, "dropping range operator on non-numeric field");
        return Ok(None);
    }

    let text = |field| Criterion::Text {
        field,
        value: value.to_string(),
    };
    let criterion = match field {
        "name" => text(TextField::Name),
        "description" => text(TextField::Description),
        "category" => text(TextField::Category),
        "brand" => text(TextField::Brand),
        "status" => {
            let status = value.parse::<ProductStatus>().map_err(AppError::Validation)?;
            Criterion::Status(status)
        }
        "isFeatured" => Criterion::Featured(value.trim() == "true"),
        "owner" | "user" => {
            let owner = value.trim().parse::<Uuid>().map_err(|_| {
                AppError::validation(format!("invalid id '{value}' for {key}"))
            })?;
            Criterion::Owner(owner)
        }
        "tags" => {
            let tags: Vec<String> = value
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
            if tags.is_empty() {
                return Ok(None);
            }
            Criterion::TagsAny(tags)
        }
        _ => return Err(unknown_field(field)),
    };
    Ok(Some(criterion))
}

fn unknown_field(field: &str) -> AppError {
    AppError::validation(format!("unknown filter field '{field}'"))
}

fn parse_sort(value: &str) -> Vec<SortKey> {
    let keys: Vec<SortKey> = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| {
            let (name, descending) = match s.strip_prefix('-') {
                Some(name) => (name, true),
                None => (s, false),
            };
            SortField::parse(name).map(|field| SortKey { field, descending })
        })
        .collect();

    if keys.is_empty() {
        ProductFilter::all().sort
    } else {
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn bracket_operators_become_range_criteria() {
        let q = ProductQuery::parse(
            &pairs(&[("price[gte]", "100"), ("price[lte]", "500"), ("ratings[gt]", "3")]),
            StatusScope::Unrestricted,
        )
        .unwrap();

        assert_eq!(
            q.filter.criteria(),
            &[
                Criterion::Numeric {
                    field: NumericField::Price,
                    cmp: Comparison::Gte,
                    value: 100.0
                },
                Criterion::Numeric {
                    field: NumericField::Price,
                    cmp: Comparison::Lte,
                    value: 500.0
                },
                Criterion::Numeric {
                    field: NumericField::Ratings,
                    cmp: Comparison::Gt,
                    value: 3.0
                },
            ]
        );
    }

    #[test]
    fn tags_and_featured_are_coerced() {
        let q = ProductQuery::parse(
            &pairs(&[("tags", "summer, sale,"), ("isFeatured", "true")]),
            StatusScope::Unrestricted,
        )
        .unwrap();

        assert_eq!(
            q.filter.criteria(),
            &[
                Criterion::TagsAny(vec!["summer".into(), "sale".into()]),
                Criterion::Featured(true),
            ]
        );

        let q = ProductQuery::parse(&pairs(&[("isFeatured", "yes")]), StatusScope::Unrestricted)
            .unwrap();
        assert_eq!(q.filter.criteria(), &[Criterion::Featured(false)]);
    }

    #[test]
    fn active_status_is_implied_only_for_storefront_scope() {
        let public = ProductQuery::parse(&[], StatusScope::ActiveByDefault).unwrap();
        assert_eq!(
            public.filter.criteria(),
            &[Criterion::Status(ProductStatus::Active)]
        );

        let explicit = ProductQuery::parse(
            &pairs(&[("status", "Out of Stock")]),
            StatusScope::ActiveByDefault,
        )
        .unwrap();
        assert_eq!(
            explicit.filter.criteria(),
            &[Criterion::Status(ProductStatus::OutOfStock)]
        );

        let admin = ProductQuery::parse(&[], StatusScope::Unrestricted).unwrap();
        assert!(admin.filter.criteria().is_empty());
    }

    #[test]
    fn reserved_and_malformed_keys_are_dropped() {
        let q = ProductQuery::parse(
            &pairs(&[
                ("limit", "50"),
                ("fields", "name"),
                ("price[gte", "10"),
                ("[lt]", "10"),
                ("price[ne]", "10"),
                ("category[gt]", "a"),
                ("keyword", "  "),
            ]),
            StatusScope::Unrestricted,
        )
        .unwrap();
        assert!(q.filter.criteria().is_empty());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        for key in ["colour", "colour[gte]", "sizes"] {
            let err = ProductQuery::parse(&pairs(&[(key, "red")]), StatusScope::Unrestricted)
                .unwrap_err();
            assert_eq!(err.kind(), "validation", "{key}");
        }
    }

    #[test]
    fn description_and_owner_filter_by_equality() {
        let owner = Uuid::new_v4();
        let owner_id = owner.to_string();
        let q = ProductQuery::parse(
            &pairs(&[("description", "no such text"), ("owner", owner_id.as_str())]),
            StatusScope::Unrestricted,
        )
        .unwrap();
        assert_eq!(
            q.filter.criteria(),
            &[
                Criterion::Text {
                    field: TextField::Description,
                    value: "no such text".into()
                },
                Criterion::Owner(owner),
            ]
        );

        let mut product = crate::test_support::product("Boots", 100, 3);
        product.description = "no such text".into();
        assert!(!q.filter.matches(&product));
        product.owner = owner;
        assert!(q.filter.matches(&product));

        let err = ProductQuery::parse(&pairs(&[("user", "nobody")]), StatusScope::Unrestricted)
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn unparsable_numeric_value_is_rejected() {
        let err = ProductQuery::parse(&pairs(&[("price[gte]", "cheap")]), StatusScope::Unrestricted)
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn page_and_window() {
        let q = ProductQuery::parse(&pairs(&[("page", "2")]), StatusScope::Unrestricted).unwrap();
        assert_eq!(q.window(5), Window { skip: 5, limit: 5 });

        let q = ProductQuery::parse(&pairs(&[("page", "0")]), StatusScope::Unrestricted).unwrap();
        assert_eq!(q.window(5), Window { skip: 0, limit: 5 });

        let q = ProductQuery::parse(&pairs(&[("page", "x")]), StatusScope::Unrestricted).unwrap();
        assert_eq!(q.page, 1);
    }

    #[test]
    fn sort_parses_known_fields_and_defaults_to_newest() {
        let q = ProductQuery::parse(&pairs(&[("sort", "-price,bogus,name")]), StatusScope::Unrestricted)
            .unwrap();
        assert_eq!(
            q.filter.sort_keys(),
            &[
                SortKey {
                    field: SortField::Price,
                    descending: true
                },
                SortKey {
                    field: SortField::Name,
                    descending: false
                },
            ]
        );

        let q = ProductQuery::parse(&pairs(&[("sort", "bogus")]), StatusScope::Unrestricted).unwrap();
        assert_eq!(q.filter.sort_keys(), ProductFilter::all().sort_keys());
    }

    #[test]
    fn keyword_matches_name_or_description_case_insensitively() {
        let criterion = Criterion::Keyword("PHONE".into());
        let mut product = crate::test_support::product("Smartphone X", 100, 3);
        assert!(criterion.matches(&product));

        product.name = "Gadget".into();
        product.description = "a phone case".into();
        assert!(criterion.matches(&product));

        product.description = "a laptop".into();
        assert!(!criterion.matches(&product));
    }
}
