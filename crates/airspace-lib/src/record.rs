//! Raw input records and payload parsing
//!
//! The upstream sheet export is a JSON array of loosely-typed objects. Any cell may be a
//! string, a number or missing; empty cells come through as empty strings. The endpoint
//! may also answer with a JSONP wrapper (`callback([...]);`).

use serde_json::{Map, Value};

use crate::compose::QuadSpec;
use crate::{CatalogError, Result, ValidationError};

/// Number of quads carried by every record
pub const QUAD_COUNT: usize = 4;

const FIELD_NAME: &str = "nom";
const FIELD_CATEGORY: &str = "categorie";
const FIELD_LAYER: &str = "couche";
const FIELD_COLOR: &str = "couleur";
const FIELD_FLOOR: &str = "plancher";
const FIELD_CEILING: &str = "plafond";
const PREFIX_BASE: &str = "p";
const PREFIX_INTERSECT: &str = "intp";
const PREFIX_EXCLUDE: &str = "exp";

/// One input row, before validation
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawRecord {
    pub name: Option<String>,
    pub category: Option<String>,
    pub layer: Option<String>,
    pub color: Option<String>,
    pub floor: Option<String>,
    pub ceiling: Option<String>,
    pub quads: [QuadSpec; QUAD_COUNT],
}

impl RawRecord {
    /// Read a record from one element of the payload array
    pub fn from_json(value: &Value) -> std::result::Result<Self, ValidationError> {
        let object = value.as_object().ok_or(ValidationError::NotAnObject)?;

        let quads = std::array::from_fn(|i| {
            let n = i + 1;
            QuadSpec {
                base: literal_field(object, &format!("{PREFIX_BASE}{n}")),
                intersect: literal_field(object, &format!("{PREFIX_INTERSECT}{n}")),
                exclude: literal_field(object, &format!("{PREFIX_EXCLUDE}{n}")),
            }
        });

        Ok(Self {
            name: text_field(object, FIELD_NAME),
            category: text_field(object, FIELD_CATEGORY),
            layer: text_field(object, FIELD_LAYER),
            color: text_field(object, FIELD_COLOR),
            floor: text_field(object, FIELD_FLOOR),
            ceiling: text_field(object, FIELD_CEILING),
            quads,
        })
    }
}

/// Text cell: strings as-is, numbers and booleans rendered, null/empty as missing
fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Geometry cell: null and blank strings are missing, anything else is a literal
fn literal_field(object: &Map<String, Value>, key: &str) -> Option<Value> {
    match object.get(key)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        other => Some(other.clone()),
    }
}

/// Parse a payload that is either a bare JSON array or a JSONP-wrapped array
pub fn parse_payload(text: &str) -> Result<Vec<Value>> {
    let body = strip_jsonp(text.trim())?;
    match serde_json::from_str::<Value>(body)? {
        Value::Array(items) => Ok(items),
        _ => Err(CatalogError::NotAnArray),
    }
}

fn strip_jsonp(text: &str) -> Result<&str> {
    if text.starts_with('[') || text.starts_with('{') {
        return Ok(text);
    }

    let open = text
        .find('(')
        .ok_or_else(|| CatalogError::Jsonp("missing opening parenthesis".to_string()))?;
    let callback = text[..open].trim();
    let is_identifier = !callback.is_empty()
        && callback
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.'));
    if !is_identifier {
        return Err(CatalogError::Jsonp(format!("invalid callback name {callback:?}")));
    }

    let tail = text.trim_end_matches(|c: char| c == ';' || c.is_whitespace());
    let close = tail
        .strip_suffix(')')
        .ok_or_else(|| CatalogError::Jsonp("missing closing parenthesis".to_string()))?;
    Ok(&close[open + 1..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_fields() {
        let record = RawRecord::from_json(&json!({
            "nom": "TMA 1",
            "categorie": "TMA",
            "couche": "",
            "couleur": "ff0000",
            "plancher": 1500,
            "plafond": "FL115",
            "p1": "[[0,0],[1,0],[1,1],[0,0]]",
            "intp1": "",
            "exp2": [[0, 0], [1, 1]],
            "p3": null
        }))
        .unwrap();

        assert_eq!(record.name.as_deref(), Some("TMA 1"));
        assert_eq!(record.layer, None);
        assert_eq!(record.floor.as_deref(), Some("1500"));
        assert_eq!(record.ceiling.as_deref(), Some("FL115"));
        assert!(record.quads[0].base.is_some());
        assert!(record.quads[0].intersect.is_none());
        assert!(record.quads[1].base.is_none());
        assert!(record.quads[1].exclude.is_some());
        assert!(record.quads[2].base.is_none());
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        assert_eq!(
            RawRecord::from_json(&json!([1, 2])),
            Err(ValidationError::NotAnObject)
        );
    }

    #[test]
    fn test_parse_bare_array() {
        let items = parse_payload(r#" [{"nom": "a"}, {"nom": "b"}] "#).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_parse_jsonp() {
        let items = parse_payload("handleData([{\"nom\": \"a\"}]);").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["nom"], "a");
    }

    #[test]
    fn test_parse_rejects_non_array() {
        assert!(matches!(
            parse_payload(r#"{"nom": "a"}"#),
            Err(CatalogError::NotAnArray)
        ));
        assert!(matches!(parse_payload("[1, 2"), Err(CatalogError::Json(_))));
        assert!(matches!(
            parse_payload("alert(1) + x"),
            Err(CatalogError::Jsonp(_))
        ));
    }
}
