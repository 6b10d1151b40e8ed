//! The query grammar: `Type:value permission Type:value`.
//!
//! Queries are the textual requests the clearance broker sends to the
//! authority, e.g. `Bear:Pat enter House:cottage`. Malformed input
//! parses to `None`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::facts::TypedValue;

/// `Actor:value permission Resource:value`.
static QUERY_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\w+):(\w+)\s+(\w+)\s+(\w+):(\w+)").ok());

/// A structurally parsed query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedQuery {
    /// Who is asking.
    pub actor: TypedValue,
    /// What they want to do.
    pub permission: String,
    /// What they want to do it to.
    pub resource: TypedValue,
}

/// Parse a query line. Malformed input yields `None`.
pub fn parse_query(input: &str) -> Option<ParsedQuery> {
    let query_re = QUERY_RE.as_ref()?;
    let caps = query_re.captures(input)?;
    Some(ParsedQuery {
        actor: TypedValue::new(caps.get(1)?.as_str(), caps.get(2)?.as_str()),
        permission: caps.get(3)?.as_str().to_owned(),
        resource: TypedValue::new(caps.get(4)?.as_str(), caps.get(5)?.as_str()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_documented_shape() {
        let parsed = parse_query("Bear:Pat enter House:cottage");
        assert_eq!(
            parsed,
            Some(ParsedQuery {
                actor: TypedValue::new("Bear", "Pat"),
                permission: String::from("enter"),
                resource: TypedValue::new("House", "cottage"),
            })
        );
    }

    #[test]
    fn garbage_parses_to_none() {
        assert_eq!(parse_query("garbage"), None);
        assert_eq!(parse_query(""), None);
        assert_eq!(parse_query("Bear Pat enter"), None);
    }
}
