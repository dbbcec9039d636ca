//! Step config resolved against a processor's parameter schema.

use serde_json::Value;
use tracing::warn;

use topicflow_shared::{JsonMap, Result, TopicflowError};

use crate::processor::{ParamSchema, ParamType, ProcessorDescriptor};

/// Parameters of one step: every schema key present, typed and in bounds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    processor: String,
    values: JsonMap,
}

impl Params {
    /// Resolve a raw step config. Missing or `null` keys take the schema
    /// default; unknown keys are ignored with a warning.
    pub fn resolve(descriptor: &ProcessorDescriptor, raw: &JsonMap) -> Result<Self> {
        let (values, problems) = resolve_values(descriptor, raw);
        if !problems.is_empty() {
            return Err(TopicflowError::invalid_params(
                &descriptor.id,
                problems.join("; "),
            ));
        }

        for key in raw.keys() {
            if !descriptor.schema.contains_key(key) {
                warn!(processor = %descriptor.id, key = %key, "ignoring unknown config key");
            }
        }

        Ok(Self {
            processor: descriptor.id.clone(),
            values,
        })
    }

    pub fn number(&self, key: &str) -> Result<f64> {
        self.get(key)?
            .as_f64()
            .ok_or_else(|| self.wrong_type(key, ParamType::Number))
    }

    /// An integer parameter; bounds guarantee it is non-negative.
    pub fn usize(&self, key: &str) -> Result<usize> {
        let n = self.number(key)?;
        if n < 0.0 || n.fract() != 0.0 {
            return Err(TopicflowError::invalid_params(
                &self.processor,
                format!("\"{key}\" must be a non-negative integer"),
            ));
        }
        Ok(n as usize)
    }

    pub fn boolean(&self, key: &str) -> Result<bool> {
        self.get(key)?
            .as_bool()
            .ok_or_else(|| self.wrong_type(key, ParamType::Boolean))
    }

    pub fn string(&self, key: &str) -> Result<&str> {
        self.get(key)?
            .as_str()
            .ok_or_else(|| self.wrong_type(key, ParamType::String))
    }

    pub fn string_list(&self, key: &str) -> Result<Vec<String>> {
        let list = self
            .get(key)?
            .as_array()
            .ok_or_else(|| self.wrong_type(key, ParamType::StringList))?;
        list.iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.wrong_type(key, ParamType::StringList))
            })
            .collect()
    }

    fn get(&self, key: &str) -> Result<&Value> {
        self.values.get(key).ok_or_else(|| {
            TopicflowError::invalid_params(&self.processor, format!("unknown parameter \"{key}\""))
        })
    }

    fn wrong_type(&self, key: &str, expected: ParamType) -> TopicflowError {
        TopicflowError::invalid_params(&self.processor, format!("\"{key}\" must be {expected}"))
    }
}

/// Schema problems in a raw step config, one message per offending key.
pub fn param_problems(descriptor: &ProcessorDescriptor, raw: &JsonMap) -> Vec<String> {
    resolve_values(descriptor, raw).1
}

fn resolve_values(descriptor: &ProcessorDescriptor, raw: &JsonMap) -> (JsonMap, Vec<String>) {
    let mut values = JsonMap::new();
    let mut problems = Vec::new();

    for (key, schema) in &descriptor.schema {
        match raw.get(key) {
            None | Some(Value::Null) => {
                values.insert(key.clone(), schema.default.clone());
            }
            Some(value) => match check_value(key, schema, value) {
                Ok(()) => {
                    values.insert(key.clone(), value.clone());
                }
                Err(problem) => problems.push(problem),
            },
        }
    }

    (values, problems)
}

fn check_value(key: &str, schema: &ParamSchema, value: &Value) -> std::result::Result<(), String> {
    match schema.param_type {
        ParamType::Number => {
            let n = value
                .as_f64()
                .ok_or_else(|| format!("\"{key}\" must be a number, got {value}"))?;
            if schema.is_integer() && n.fract() != 0.0 {
                return Err(format!("\"{key}\" must be an integer, got {n}"));
            }
            if let Some(min) = schema.min {
                if n < min {
                    return Err(format!("\"{key}\" must be at least {min}, got {n}"));
                }
            }
            if let Some(max) = schema.max {
                if n > max {
                    return Err(format!("\"{key}\" must be at most {max}, got {n}"));
                }
            }
        }
        ParamType::Boolean => {
            if !value.is_boolean() {
                return Err(format!("\"{key}\" must be a boolean, got {value}"));
            }
        }
        ParamType::String => {
            let s = value
                .as_str()
                .ok_or_else(|| format!("\"{key}\" must be a string, got {value}"))?;
            if !schema.options.is_empty() && !schema.options.iter().any(|o| o == s) {
                return Err(format!(
                    "\"{key}\" must be one of {}, got \"{s}\"",
                    schema.options.join(", ")
                ));
            }
        }
        ParamType::StringList => {
            let is_list = value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string));
            if !is_list {
                return Err(format!("\"{key}\" must be a list of strings, got {value}"));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::ProcessorKind;
    use serde_json::json;

    fn descriptor() -> ProcessorDescriptor {
        ProcessorDescriptor::new("demo", ProcessorKind::Transform, "Demo", "")
            .param("ratio", ParamSchema::number("Ratio", 0.5, 0.1, 0.9, 0.05))
            .param("size", ParamSchema::number("Size", 3.0, 1.0, 10.0, 1.0))
            .param("enabled", ParamSchema::boolean("Enabled", true))
            .param("mode", ParamSchema::choice("Mode", "fast", &["fast", "slow"]))
            .param("words", ParamSchema::string_list("Words", "add a word"))
    }

    fn raw(value: Value) -> JsonMap {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn defaults_fill_missing_keys() {
        let params = Params::resolve(&descriptor(), &JsonMap::new()).unwrap();
        assert_eq!(params.number("ratio").unwrap(), 0.5);
        assert_eq!(params.usize("size").unwrap(), 3);
        assert!(params.boolean("enabled").unwrap());
        assert_eq!(params.string("mode").unwrap(), "fast");
        assert!(params.string_list("words").unwrap().is_empty());
    }

    #[test]
    fn provided_values_win() {
        let config = raw(json!({
            "ratio": 0.7,
            "size": 5,
            "enabled": false,
            "mode": "slow",
            "words": ["a", "b"],
            "extra": 1
        }));
        let params = Params::resolve(&descriptor(), &config).unwrap();
        assert_eq!(params.number("ratio").unwrap(), 0.7);
        assert_eq!(params.usize("size").unwrap(), 5);
        assert!(!params.boolean("enabled").unwrap());
        assert_eq!(params.string("mode").unwrap(), "slow");
        assert_eq!(params.string_list("words").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn null_means_default() {
        let params = Params::resolve(&descriptor(), &raw(json!({"ratio": null}))).unwrap();
        assert_eq!(params.number("ratio").unwrap(), 0.5);
    }

    #[test]
    fn out_of_bounds_and_wrong_types_are_rejected() {
        let config = raw(json!({
            "ratio": 0.95,
            "size": 2.5,
            "enabled": "yes",
            "mode": "turbo",
            "words": ["ok", 3]
        }));
        let problems = param_problems(&descriptor(), &config);
        assert_eq!(problems.len(), 5, "{problems:?}");

        let err = Params::resolve(&descriptor(), &config).unwrap_err();
        assert!(matches!(err, TopicflowError::InvalidParams { ref processor, .. } if processor == "demo"));
        assert!(err.to_string().contains("\"ratio\" must be at most 0.9"));
    }

    #[test]
    fn unknown_getter_key_is_an_error() {
        let params = Params::resolve(&descriptor(), &JsonMap::new()).unwrap();
        assert!(params.number("missing").is_err());
        assert!(params.boolean("ratio").is_err());
    }
}
