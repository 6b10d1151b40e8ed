//! The fact grammar: `name(Type{"value"}, Type{"value"}, ...)`.
//!
//! Facts are line-oriented strings the authority scans. The core treats
//! them as opaque text except for this fixed grammar; anything that does
//! not match parses to `None`, which downstream code treats as "never
//! match" rather than an error.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// `name(args)` -- captures the fact name and the raw argument list.
static FACT_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(\w+)\((.*)\)$").ok());

/// `Type{"value"}` -- captures one typed argument.
static ARG_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"(\w+)\{"(.*?)"\}"#).ok());

/// `Room{"name"` -- the fixed pattern for pulling a room name out of an
/// `is_in` fact.
static ROOM_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"Room\{"(\w+)""#).ok());

/// A typed argument: `Bear{"Smokey"}` parses to kind `Bear`, value
/// `Smokey`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedValue {
    /// The argument's type tag.
    #[serde(rename = "type")]
    pub kind: String,
    /// The quoted value.
    pub value: String,
}

impl TypedValue {
    /// Build a typed value from string slices.
    pub fn new(kind: &str, value: &str) -> Self {
        Self {
            kind: kind.to_owned(),
            value: value.to_owned(),
        }
    }
}

/// A structurally parsed fact. Two facts match when their parsed forms
/// are equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFact {
    /// The fact (predicate) name.
    pub name: String,
    /// The typed arguments, in order.
    pub args: Vec<TypedValue>,
}

/// Parse a fact line. Malformed input yields `None`.
///
/// Arguments that do not match `Type{"value"}` are simply skipped, the
/// way a lenient scanner would pass over noise between arguments.
pub fn parse_fact(input: &str) -> Option<ParsedFact> {
    let fact_re = FACT_RE.as_ref()?;
    let arg_re = ARG_RE.as_ref()?;
    let caps = fact_re.captures(input.trim())?;
    let name = caps.get(1)?.as_str().to_owned();
    let raw_args = caps.get(2)?.as_str();

    let args = arg_re
        .captures_iter(raw_args)
        .filter_map(|arg| {
            Some(TypedValue::new(arg.get(1)?.as_str(), arg.get(2)?.as_str()))
        })
        .collect();

    Some(ParsedFact { name, args })
}

/// Serialize a fact back into its line form.
pub fn format_fact(name: &str, args: &[TypedValue]) -> String {
    let rendered: Vec<String> = args
        .iter()
        .map(|arg| format!("{}{{\"{}\"}}", arg.kind, arg.value))
        .collect();
    format!("{name}({})", rendered.join(", "))
}

/// Extract the room name from a fact like
/// `is_in(Room{"foyer"}, House{"cottage"})`. Returns `None` when the
/// fact mentions no room.
pub fn room_name_from_fact(fact: &str) -> Option<String> {
    let room_re = ROOM_RE.as_ref()?;
    let caps = room_re.captures(fact)?;
    Some(caps.get(1)?.as_str().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_two_argument_fact() {
        let parsed = parse_fact(r#"is_resident(Bear{"Smokey"}, House{"cottage"})"#);
        assert_eq!(
            parsed,
            Some(ParsedFact {
                name: String::from("is_resident"),
                args: vec![
                    TypedValue::new("Bear", "Smokey"),
                    TypedValue::new("House", "cottage"),
                ],
            })
        );
    }

    #[test]
    fn garbage_parses_to_none() {
        assert_eq!(parse_fact("garbage"), None);
        assert_eq!(parse_fact(""), None);
        assert_eq!(parse_fact("no parens here"), None);
    }

    #[test]
    fn format_then_parse_is_identity() {
        let args = vec![
            TypedValue::new("Bear", "Pat"),
            TypedValue::new("House", "cottage"),
        ];
        let line = format_fact("is_resident", &args);
        assert_eq!(line, r#"is_resident(Bear{"Pat"}, House{"cottage"})"#);
        let back = parse_fact(&line);
        assert_eq!(back.map(|f| f.args), Some(args));
    }

    #[test]
    fn structural_equality_ignores_nothing() {
        let a = parse_fact(r#"is_in(Room{"kitchen"}, House{"cottage"})"#);
        let b = parse_fact(r#"is_in(Room{"kitchen"}, House{"cottage"})"#);
        let c = parse_fact(r#"is_in(Room{"pantry"}, House{"cottage"})"#);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn room_name_extraction() {
        assert_eq!(
            room_name_from_fact(r#"is_in(Room{"foyer"}, House{"cottage"})"#),
            Some(String::from("foyer"))
        );
        assert_eq!(
            room_name_from_fact(r#"is_resident(Bear{"Smokey"}, House{"cottage"})"#),
            None
        );
    }

    #[test]
    fn typed_value_serializes_with_a_type_field() {
        let json = serde_json::to_string(&TypedValue::new("Bear", "Pat")).ok();
        assert_eq!(
            json.as_deref(),
            Some(r#"{"type":"Bear","value":"Pat"}"#)
        );
    }
}
