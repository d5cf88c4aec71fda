// src/core/schema.rs

use crate::{
    core::override_parser::names_match,
    models::{BuilderSchema, OptionDefinition, OptionMap, OptionType},
};
use serde_json::Value;
use std::fmt;

/// Which schema rule a value broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKeyword {
    Type,
    Enum,
    Required,
    AdditionalProperties,
}

/// A single schema-validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub keyword: ViolationKeyword,
    /// Location of the offending value, e.g. `.watch`. Empty for the options object itself.
    pub data_path: String,
    /// The option the violation is about.
    pub property: String,
    pub message: String,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.data_path.is_empty() {
            write!(f, "Data {}.", self.message)
        } else {
            write!(f, "Data path \"{}\" {}.", self.data_path, self.message)
        }
    }
}

impl BuilderSchema {
    pub fn find(&self, name: &str) -> Option<&OptionDefinition> {
        self.options.iter().find(|def| names_match(&def.name, name))
    }

    /// The `default` of every option that declares one.
    pub fn defaults(&self) -> OptionMap {
        self.options
            .iter()
            .filter_map(|def| def.default.clone().map(|v| (def.name.clone(), v)))
            .collect()
    }
}

/// Validates a fully merged option set against `schema`.
/// Returns every violation found; an empty list means the options are valid.
pub fn validate(schema: &BuilderSchema, options: &OptionMap) -> Vec<SchemaViolation> {
    let mut violations = Vec::new();

    for def in schema.options.iter().filter(|def| def.required) {
        if !options.keys().any(|key| names_match(&def.name, key)) {
            violations.push(SchemaViolation {
                keyword: ViolationKeyword::Required,
                data_path: String::new(),
                property: def.name.clone(),
                message: format!("should have required property '{}'", def.name),
            });
        }
    }

    for (key, value) in options {
        let Some(def) = schema.find(key) else {
            if !schema.additional_properties {
                violations.push(SchemaViolation {
                    keyword: ViolationKeyword::AdditionalProperties,
                    data_path: String::new(),
                    property: key.clone(),
                    message: format!("should NOT have additional properties({})", key),
                });
            }
            continue;
        };

        if !matches_type(def.kind, value) {
            violations.push(SchemaViolation {
                keyword: ViolationKeyword::Type,
                data_path: format!(".{}", key),
                property: key.clone(),
                message: format!("should be {}", def.kind),
            });
        } else if !matches_enum(def, value) {
            violations.push(SchemaViolation {
                keyword: ViolationKeyword::Enum,
                data_path: format!(".{}", key),
                property: key.clone(),
                message: format!(
                    "should be equal to one of the allowed values ({})",
                    def.enum_values.join(", ")
                ),
            });
        }
    }

    violations
}

fn matches_type(kind: OptionType, value: &Value) -> bool {
    match kind {
        OptionType::String => value.is_string(),
        OptionType::Boolean => value.is_boolean(),
        OptionType::Number => value.is_number(),
        OptionType::Integer => {
            value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        OptionType::Array => value.is_array(),
    }
}

fn matches_enum(def: &OptionDefinition, value: &Value) -> bool {
    if def.enum_values.is_empty() {
        return true;
    }
    let allowed = |v: &Value| {
        v.as_str()
            .is_some_and(|s| def.enum_values.iter().any(|e| e == s))
    };
    match value {
        Value::Array(items) => items.iter().all(allowed),
        other => allowed(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(additional_properties: bool) -> BuilderSchema {
        BuilderSchema {
            description: None,
            additional_properties,
            options: vec![
                OptionDefinition {
                    name: "watch".to_string(),
                    kind: OptionType::Boolean,
                    default: Some(json!(false)),
                    ..Default::default()
                },
                OptionDefinition {
                    name: "mode".to_string(),
                    enum_values: vec!["dev".to_string(), "prod".to_string()],
                    required: true,
                    ..Default::default()
                },
                OptionDefinition {
                    name: "port".to_string(),
                    kind: OptionType::Integer,
                    ..Default::default()
                },
            ],
        }
    }

    fn map(value: Value) -> OptionMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_valid_options_produce_no_violations() {
        let options = map(json!({"watch": true, "mode": "dev", "port": 4200}));
        assert!(validate(&schema(false), &options).is_empty());
    }

    #[test]
    fn test_each_keyword_is_reported() {
        let options = map(json!({"watch": "yes", "port": 1.5, "extra": 1}));
        let violations = validate(&schema(false), &options);
        let keywords: Vec<_> = violations.iter().map(|v| (v.keyword, v.property.as_str())).collect();

        assert!(keywords.contains(&(ViolationKeyword::Required, "mode")));
        assert!(keywords.contains(&(ViolationKeyword::Type, "watch")));
        assert!(keywords.contains(&(ViolationKeyword::Type, "port")));
        assert!(keywords.contains(&(ViolationKeyword::AdditionalProperties, "extra")));
        assert_eq!(violations.len(), 4);
    }

    #[test]
    fn test_enum_and_additional_properties_allowed() {
        let options = map(json!({"mode": "staging", "extra": 1}));
        let violations = validate(&schema(true), &options);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].keyword, ViolationKeyword::Enum);
        assert_eq!(
            violations[0].to_string(),
            "Data path \".mode\" should be equal to one of the allowed values (dev, prod)."
        );
    }

    #[test]
    fn test_option_keys_match_either_spelling() {
        let mut schema = schema(false);
        schema.options.push(OptionDefinition {
            name: "sourceMap".to_string(),
            kind: OptionType::Boolean,
            required: true,
            ..Default::default()
        });

        let options = map(json!({"mode": "dev", "source-map": true}));
        assert!(validate(&schema, &options).is_empty());

        let options = map(json!({"mode": "dev", "source-map": "yes"}));
        let violations = validate(&schema, &options);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].keyword, ViolationKeyword::Type);
        assert_eq!(violations[0].data_path, ".source-map");
    }

    #[test]
    fn test_defaults_and_lookup() {
        let schema = schema(false);
        assert_eq!(schema.defaults(), map(json!({"watch": false})));
        assert!(schema.find("mode").is_some());
        assert!(schema.find("nope").is_none());
    }
}
