use serde::{Deserialize, Serialize};

use crate::domain::{FormInput, Sex};

/// Body of a modal toggle callback: which button fired and the modal's current state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleModalRequest {
    #[serde(default)]
    pub triggered_id: Option<String>,
    #[serde(default)]
    pub is_open: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleModalResponse {
    pub is_open: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictAccuracyRequest {
    #[serde(default)]
    pub n_clicks: Option<u32>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub sex: Option<Sex>,
}

impl PredictAccuracyRequest {
    pub fn form(&self) -> FormInput {
        FormInput {
            weight: self.weight,
            height: self.height,
            age: self.age,
            sex: self.sex,
        }
    }
}

/// `children` is `None` while the predict button has never been clicked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictAccuracyResponse {
    pub children: Option<String>,
}
