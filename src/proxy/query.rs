use std::{collections::BTreeMap, convert::Infallible, str::FromStr};

/// One row of a request builder. Rows with an empty name are dropped before the
/// request is built.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParam {
    pub name: String,
    pub value: String,
}

impl QueryParam {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Parses `name=value`; a missing `=` yields an empty value.
impl FromStr for QueryParam {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = s.split_once('=').unwrap_or((s, ""));
        Ok(Self::new(name, value))
    }
}

/// Collapses rows into query parameters. Later rows win on duplicate names.
#[must_use]
pub fn collect_params<I>(entries: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = QueryParam>,
{
    entries
        .into_iter()
        .filter(|entry| !entry.name.is_empty())
        .map(|entry| (entry.name, entry.value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_name_value_pairs() {
        assert_eq!(
            "ids=1,2".parse::<QueryParam>(),
            Ok(QueryParam::new("ids", "1,2"))
        );
        assert_eq!("lang".parse::<QueryParam>(), Ok(QueryParam::new("lang", "")));
        assert_eq!("a=b=c".parse::<QueryParam>(), Ok(QueryParam::new("a", "b=c")));
    }

    #[test]
    fn empty_names_are_dropped() {
        let params = collect_params(vec![
            QueryParam::new("", "ignored"),
            QueryParam::new("page", "1"),
            QueryParam::default(),
        ]);
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("page").map(String::as_str), Some("1"));
    }

    #[test]
    fn later_rows_win() {
        let params = collect_params(vec![
            QueryParam::new("page", "1"),
            QueryParam::new("page", "2"),
        ]);
        assert_eq!(params.get("page").map(String::as_str), Some("2"));
    }
}
