//! Declarative shape repair for parsed generation output
//!
//! Models frequently return near-miss JSON: alternate field names
//! ("name" instead of "data_element"), booleans as strings ("true"),
//! objects serialized into strings, and "N/A" where null is expected.
//! Repairs are a versioned table of (scope, field, aliases, coercion)
//! entries evaluated against the parsed value, so a new provider quirk is
//! an additive rule rather than another inline patch.

use serde_json::Value;

/// Bump when the rule table changes shape or semantics
pub const REPAIR_RULES_VERSION: u32 = 1;

/// Strings treated as a null sentinel when re-parsing string-typed fields
const NULL_SENTINELS: &[&str] = &["", "null", "N/A", "n/a", "Not applicable"];

#[derive(Debug, Clone, Copy)]
enum Coercion {
    /// Alias rename only, no value coercion
    Rename,
    /// "true"/"yes" → true, anything else → false
    StringToBool,
    /// "true"/"yes" → true, "false"/"no" → false,
    /// "unknown"/"null"/"n/a" (or anything else) → null
    StringToBoolOrNull,
    /// Null sentinels → null; otherwise best-effort JSON re-parse of the
    /// string, falling back per `Fallback`
    ReparseJson(Fallback),
}

#[derive(Debug, Clone, Copy)]
enum Fallback {
    /// Unparseable string → null
    Null,
    /// Unparseable string → minimal wrapper object: the raw string under
    /// `value_key`, fixed defaults for the remaining keys
    Wrap {
        value_key: &'static str,
        defaults: &'static [(&'static str, &'static str)],
    },
}

#[derive(Debug, Clone, Copy)]
struct FieldRule {
    field: &'static str,
    /// Synonym source fields copied onto `field` when it is missing/empty
    aliases: &'static [&'static str],
    coercion: Coercion,
}

/// Rules for the objects inside one top-level array field
#[derive(Debug, Clone, Copy)]
struct ShapeRules {
    array_field: &'static str,
    rules: &'static [FieldRule],
}

/// v1 rule table: relationship-graph output (`data_elements`) and
/// classification output (`elements`)
static SHAPE_RULES: &[ShapeRules] = &[
    ShapeRules {
        array_field: "data_elements",
        rules: &[
            FieldRule {
                field: "data_element",
                aliases: &["name", "data_element_name"],
                coercion: Coercion::Rename,
            },
            FieldRule {
                field: "cross_border",
                aliases: &[],
                coercion: Coercion::StringToBool,
            },
        ],
    },
    ShapeRules {
        array_field: "elements",
        rules: &[
            FieldRule {
                field: "data_element_name",
                aliases: &["name", "data_element"],
                coercion: Coercion::Rename,
            },
            FieldRule {
                field: "retention_compliant",
                aliases: &[],
                coercion: Coercion::StringToBoolOrNull,
            },
            FieldRule {
                field: "cross_border_transfer",
                aliases: &[],
                coercion: Coercion::StringToBool,
            },
            FieldRule {
                field: "cross_border_details",
                aliases: &[],
                coercion: Coercion::ReparseJson(Fallback::Wrap {
                    value_key: "destination_country",
                    defaults: &[("transfer_mechanism", "unknown")],
                }),
            },
            FieldRule {
                field: "consent_mechanism",
                aliases: &[],
                coercion: Coercion::ReparseJson(Fallback::Wrap {
                    value_key: "type",
                    defaults: &[
                        ("collection_point", "unknown"),
                        ("withdrawal_method", "unknown"),
                    ],
                }),
            },
            FieldRule {
                field: "third_party_details",
                aliases: &[],
                coercion: Coercion::ReparseJson(Fallback::Null),
            },
        ],
    },
];

/// Apply the repair rule table in place
pub fn apply_repairs(value: &mut Value) {
    let Some(obj) = value.as_object_mut() else {
        return;
    };

    for shape in SHAPE_RULES {
        let Some(array) = obj.get_mut(shape.array_field).and_then(Value::as_array_mut) else {
            continue;
        };
        for element in array.iter_mut() {
            let Some(element) = element.as_object_mut() else {
                continue;
            };
            for rule in shape.rules {
                apply_aliases(element, rule);
                coerce_field(element, rule);
            }
        }
    }
}

/// Copy the first present alias onto the canonical field when the field is
/// missing, null, or an empty string
fn apply_aliases(element: &mut serde_json::Map<String, Value>, rule: &FieldRule) {
    let missing = match element.get(rule.field) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    };
    if !missing {
        return;
    }
    for alias in rule.aliases {
        if let Some(alias_value) = element.get(*alias) {
            if !alias_value.is_null() {
                let alias_value = alias_value.clone();
                element.insert(rule.field.to_string(), alias_value);
                return;
            }
        }
    }
}

fn coerce_field(element: &mut serde_json::Map<String, Value>, rule: &FieldRule) {
    let Some(Value::String(s)) = element.get(rule.field) else {
        return;
    };
    let s = s.clone();

    let replacement = match rule.coercion {
        Coercion::Rename => return,
        Coercion::StringToBool => Value::Bool(s == "true" || s == "yes"),
        Coercion::StringToBoolOrNull => match s.to_lowercase().as_str() {
            "true" | "yes" => Value::Bool(true),
            "false" | "no" => Value::Bool(false),
            _ => Value::Null,
        },
        Coercion::ReparseJson(fallback) => {
            if NULL_SENTINELS.contains(&s.as_str()) {
                Value::Null
            } else {
                match serde_json::from_str::<Value>(&s) {
                    Ok(parsed) => parsed,
                    Err(_) => match fallback {
                        Fallback::Null => Value::Null,
                        Fallback::Wrap {
                            value_key,
                            defaults,
                        } => {
                            let mut wrapper = serde_json::Map::new();
                            wrapper.insert(value_key.to_string(), Value::String(s.clone()));
                            for (key, default) in defaults {
                                wrapper
                                    .insert(key.to_string(), Value::String(default.to_string()));
                            }
                            Value::Object(wrapper)
                        }
                    },
                }
            }
        }
    };
    element.insert(rule.field.to_string(), replacement);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_alias_rename_in_relationship_graph() {
        let mut value = json!({
            "vertical_name": "HR",
            "data_elements": [
                {"name": "Employee Email", "cross_border": "yes"}
            ]
        });
        apply_repairs(&mut value);
        let el = &value["data_elements"][0];
        assert_eq!(el["data_element"], "Employee Email");
        assert_eq!(el["cross_border"], json!(true));
    }

    #[test]
    fn test_canonical_field_not_overwritten_by_alias() {
        let mut value = json!({
            "data_elements": [
                {"data_element": "Payroll Data", "name": "Something Else"}
            ]
        });
        apply_repairs(&mut value);
        assert_eq!(value["data_elements"][0]["data_element"], "Payroll Data");
    }

    #[test]
    fn test_retention_compliant_string_coercions() {
        let mut value = json!({
            "elements": [
                {"data_element_name": "a", "retention_compliant": "Yes"},
                {"data_element_name": "b", "retention_compliant": "no"},
                {"data_element_name": "c", "retention_compliant": "unknown"},
                {"data_element_name": "d", "retention_compliant": "N/A"}
            ]
        });
        apply_repairs(&mut value);
        let els = value["elements"].as_array().unwrap();
        assert_eq!(els[0]["retention_compliant"], json!(true));
        assert_eq!(els[1]["retention_compliant"], json!(false));
        assert_eq!(els[2]["retention_compliant"], Value::Null);
        assert_eq!(els[3]["retention_compliant"], Value::Null);
    }

    #[test]
    fn test_cross_border_details_reparsed_from_json_string() {
        let mut value = json!({
            "elements": [{
                "data_element_name": "a",
                "cross_border_details": "{\"destination_country\": \"USA\", \"transfer_mechanism\": \"SCC\"}"
            }]
        });
        apply_repairs(&mut value);
        assert_eq!(
            value["elements"][0]["cross_border_details"],
            json!({"destination_country": "USA", "transfer_mechanism": "SCC"})
        );
    }

    #[test]
    fn test_cross_border_details_wrapped_when_unparseable() {
        let mut value = json!({
            "elements": [{
                "data_element_name": "a",
                "cross_border_details": "Singapore"
            }]
        });
        apply_repairs(&mut value);
        assert_eq!(
            value["elements"][0]["cross_border_details"],
            json!({"destination_country": "Singapore", "transfer_mechanism": "unknown"})
        );
    }

    #[test]
    fn test_null_sentinels_become_null() {
        let mut value = json!({
            "elements": [{
                "data_element_name": "a",
                "cross_border_details": "Not applicable",
                "consent_mechanism": "N/A",
                "third_party_details": "null"
            }]
        });
        apply_repairs(&mut value);
        let el = &value["elements"][0];
        assert_eq!(el["cross_border_details"], Value::Null);
        assert_eq!(el["consent_mechanism"], Value::Null);
        assert_eq!(el["third_party_details"], Value::Null);
    }

    #[test]
    fn test_consent_mechanism_wrapped_when_unparseable() {
        let mut value = json!({
            "elements": [{
                "data_element_name": "a",
                "consent_mechanism": "Verbal consent"
            }]
        });
        apply_repairs(&mut value);
        assert_eq!(
            value["elements"][0]["consent_mechanism"],
            json!({
                "type": "Verbal consent",
                "collection_point": "unknown",
                "withdrawal_method": "unknown"
            })
        );
    }

    #[test]
    fn test_third_party_details_unparseable_falls_back_to_null() {
        let mut value = json!({
            "elements": [{
                "data_element_name": "a",
                "third_party_details": "ADP and AWS"
            }]
        });
        apply_repairs(&mut value);
        assert_eq!(value["elements"][0]["third_party_details"], Value::Null);
    }

    #[test]
    fn test_non_object_input_left_untouched() {
        let mut value = json!([1, 2, 3]);
        apply_repairs(&mut value);
        assert_eq!(value, json!([1, 2, 3]));
    }
}
