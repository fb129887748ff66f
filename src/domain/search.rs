//! Search parameters for users and books
//!
//! Two request shapes end up here: the simple search form (`word` + `search`
//! method) and ransack-style filters (`q[name_cont]=...`). Both are reduced to
//! a list of [`Filter`]s which the repositories turn into SQL.

use std::collections::HashMap;

/// Match mode of the search form.
///
/// Any unrecognized mode falls back to [`SearchMethod::Partial`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMethod {
    /// Exact match
    Perfect,
    /// Prefix match
    Forward,
    /// Suffix match
    Backward,
    /// Substring match
    #[default]
    Partial,
}

impl SearchMethod {
    pub fn from_param(value: &str) -> Self {
        match value {
            "perfect" => SearchMethod::Perfect,
            "forward" => SearchMethod::Forward,
            "backward" => SearchMethod::Backward,
            _ => SearchMethod::Partial,
        }
    }

    pub fn predicate(self) -> Predicate {
        match self {
            SearchMethod::Perfect => Predicate::Eq,
            SearchMethod::Forward => Predicate::Start,
            SearchMethod::Backward => Predicate::End,
            SearchMethod::Partial => Predicate::Cont,
        }
    }
}

/// What the search form is looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchRange {
    #[default]
    User,
    Book,
}

impl SearchRange {
    pub fn from_param(value: &str) -> Self {
        if value.eq_ignore_ascii_case("book") {
            SearchRange::Book
        } else {
            SearchRange::User
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    Eq,
    NotEq,
    Cont,
    Start,
    End,
}

impl Predicate {
    // `not_eq` must be tried before `eq`
    const SUFFIXES: [(&'static str, Predicate); 5] = [
        ("_not_eq", Predicate::NotEq),
        ("_eq", Predicate::Eq),
        ("_cont", Predicate::Cont),
        ("_start", Predicate::Start),
        ("_end", Predicate::End),
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAttribute {
    Name,
    Introduction,
}

impl UserAttribute {
    fn from_param(value: &str) -> Option<Self> {
        match value {
            "name" => Some(UserAttribute::Name),
            "introduction" => Some(UserAttribute::Introduction),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter<A> {
    pub attribute: A,
    pub predicate: Predicate,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Structured user query built from request parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserQuery {
    pub filters: Vec<Filter<UserAttribute>>,
    pub sort: Option<(SortKey, SortDirection)>,
}

impl UserQuery {
    /// Build from raw query-string pairs. Unknown keys, unknown predicates
    /// and empty values are dropped.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let mut query = UserQuery::default();

        // Deterministic order regardless of HashMap iteration
        let mut keys: Vec<&String> = params.keys().collect();
        keys.sort();

        for key in keys {
            let value = &params[key];
            let Some(inner) = key.strip_prefix("q[").and_then(|k| k.strip_suffix(']')) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            if inner == "s" {
                query.sort = parse_sort(value);
                continue;
            }
            if let Some(filter) = parse_filter(inner, value) {
                query.filters.push(filter);
            }
        }

        query
    }

    /// `search_for(content, method)` on the name column
    pub fn name_search(content: &str, method: SearchMethod) -> Self {
        UserQuery {
            filters: vec![Filter {
                attribute: UserAttribute::Name,
                predicate: method.predicate(),
                value: content.to_string(),
            }],
            sort: None,
        }
    }

    pub fn and(mut self, other: UserQuery) -> Self {
        self.filters.extend(other.filters);
        if other.sort.is_some() {
            self.sort = other.sort;
        }
        self
    }
}

fn parse_filter(inner: &str, value: &str) -> Option<Filter<UserAttribute>> {
    Predicate::SUFFIXES.iter().find_map(|(suffix, predicate)| {
        let attribute = inner.strip_suffix(suffix)?;
        Some(Filter {
            attribute: UserAttribute::from_param(attribute)?,
            predicate: *predicate,
            value: value.to_string(),
        })
    })
}

fn parse_sort(value: &str) -> Option<(SortKey, SortDirection)> {
    let mut parts = value.split_whitespace();
    let key = match parts.next()? {
        "name" => SortKey::Name,
        "created_at" => SortKey::CreatedAt,
        _ => return None,
    };
    let direction = match parts.next() {
        Some("desc") => SortDirection::Desc,
        _ => SortDirection::Asc,
    };
    Some((key, direction))
}

/// Title search for books, same match modes as the user search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookQuery {
    pub title: String,
    pub method: SearchMethod,
}
