//! Serde mirror of the subset of XGBoost's JSON model schema needed for inference.

use serde::{de::Error as _, Deserialize, Deserializer};
use serde_json::Value;
use serde_with::{serde_as, DisplayFromStr};

#[derive(Debug, Deserialize)]
pub(crate) struct ModelFile {
    pub learner: Learner,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Learner {
    #[serde(default)]
    pub feature_names: Vec<String>,
    pub gradient_booster: GradientBooster,
    pub objective: Objective,
    pub learner_model_param: LearnerModelParam,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "name", rename_all = "lowercase")]
pub(crate) enum GradientBooster {
    Gbtree {
        model: ModelTrees,
    },
    Dart {
        gbtree: DartTrees,
        #[serde(default)]
        weight_drop: Vec<f32>,
    },
    Gblinear {},
}

#[derive(Debug, Deserialize)]
pub(crate) struct DartTrees {
    pub model: ModelTrees,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ModelTrees {
    pub trees: Vec<TreeJson>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub(crate) struct TreeParam {
    #[serde_as(as = "DisplayFromStr")]
    pub num_nodes: usize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TreeJson {
    pub tree_param: TreeParam,
    pub left_children: Vec<i32>,
    pub right_children: Vec<i32>,
    pub split_indices: Vec<i64>,
    pub split_conditions: Vec<f32>,
    #[serde(deserialize_with = "deserialize_flags")]
    pub default_left: Vec<bool>,
    #[serde(default)]
    pub split_type: Vec<i32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Objective {
    pub name: String,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub(crate) struct LearnerModelParam {
    #[serde(deserialize_with = "deserialize_base_score")]
    pub base_score: f32,
    #[serde_as(as = "DisplayFromStr")]
    pub num_feature: usize,
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default)]
    pub num_class: i64,
}

/// base_score shows up as `0.5`, `"5E-1"`, `"[5E-1]"` or `[0.5]` depending on the writer version.
fn deserialize_base_score<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    scalar_from_value(&value).map_err(D::Error::custom)
}

fn scalar_from_value(value: &Value) -> Result<f32, String> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .map(|f| f as f32)
            .ok_or_else(|| format!("invalid number {n}")),
        Value::String(s) => {
            let t = s.trim();
            if let Ok(f) = t.parse::<f32>() {
                return Ok(f);
            }
            let inner = t
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
                .ok_or_else(|| format!("cannot parse base_score from string: {s}"))?;
            let first = inner.split(',').next().unwrap_or_default().trim();
            first
                .parse::<f32>()
                .map_err(|_| format!("cannot parse base_score from string: {s}"))
        }
        Value::Array(items) => match items.first() {
            Some(first) => scalar_from_value(first),
            None => Err("base_score array is empty".to_string()),
        },
        _ => Err("base_score must be a number, string, or array".to_string()),
    }
}

/// default_left is written as ints by most versions and as bools by a few.
fn deserialize_flags<'de, D>(deserializer: D) -> Result<Vec<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<Value>::deserialize(deserializer)?;
    values
        .iter()
        .map(|value| match value {
            Value::Bool(b) => Ok(*b),
            Value::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
            Value::String(s) => match s.trim() {
                "1" | "true" => Ok(true),
                "0" | "false" => Ok(false),
                other => Err(D::Error::custom(format!("cannot parse flag from '{other}'"))),
            },
            _ => Err(D::Error::custom("unsupported type for flag")),
        })
        .collect()
}
