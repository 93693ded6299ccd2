use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Sex {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "M" => Some(Self::Male),
            "F" => Some(Self::Female),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
        }
    }

    /// Numeric encoding the model was trained on.
    pub fn feature_code(self) -> f32 {
        match self {
            Self::Male => 1.0,
            Self::Female => 0.0,
        }
    }
}

/// Click sources on the page, keyed by the id of the button that fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    OpenModal,
    CloseModal,
    Predict,
}

impl Trigger {
    pub fn from_component_id(id: &str) -> Option<Self> {
        match id.trim() {
            "open-modal-button" => Some(Self::OpenModal),
            "close-modal-button" => Some(Self::CloseModal),
            "predict-button" => Some(Self::Predict),
            _ => None,
        }
    }

    pub fn component_id(self) -> &'static str {
        match self {
            Self::OpenModal => "open-modal-button",
            Self::CloseModal => "close-modal-button",
            Self::Predict => "predict-button",
        }
    }
}

/// Raw field values as last submitted. Anything absent or zero counts as unfilled.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FormInput {
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub age: Option<u32>,
    pub sex: Option<Sex>,
}

impl FormInput {
    /// Parses the four fields from their submitted text. Unparseable values are dropped.
    pub fn from_raw(weight: &str, height: &str, age: &str, sex: &str) -> Self {
        Self {
            weight: parse_number(weight),
            height: parse_number(height),
            age: parse_whole(age),
            sex: Sex::from_code(sex),
        }
    }

    /// Feature row in training order: weight, height, age, sex code.
    pub fn feature_row(&self) -> Option<Vec<f32>> {
        let (weight, height, age, sex) = self.filled()?;
        Some(vec![weight as f32, height as f32, age as f32, sex.feature_code()])
    }

    fn filled(&self) -> Option<(f64, f64, u32, Sex)> {
        let weight = self.weight.filter(|v| *v != 0.0)?;
        let height = self.height.filter(|v| *v != 0.0)?;
        let age = self.age.filter(|v| *v != 0)?;
        let sex = self.sex?;
        Some((weight, height, age, sex))
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn parse_whole(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<u32>() {
        return Some(value);
    }
    // number inputs may submit "30.0"
    let value = raw.parse::<f64>().ok()?;
    if value.fract() == 0.0 && value >= 0.0 && value <= f64::from(u32::MAX) {
        Some(value as u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_ids_round_trip_through_component_ids() {
        for trigger in [Trigger::OpenModal, Trigger::CloseModal, Trigger::Predict] {
            assert_eq!(
                Trigger::from_component_id(trigger.component_id()),
                Some(trigger)
            );
        }
        assert_eq!(Trigger::from_component_id("accuracy-output"), None);
    }

    #[test]
    fn sex_codes_map_to_features() {
        assert_eq!(Sex::from_code("M"), Some(Sex::Male));
        assert_eq!(Sex::from_code("F"), Some(Sex::Female));
        assert_eq!(Sex::from_code(""), None);
        assert_eq!(Sex::from_code("X"), None);
        assert_eq!(Sex::Male.feature_code(), 1.0);
        assert_eq!(Sex::Female.feature_code(), 0.0);
    }

    #[test]
    fn raw_fields_parse_leniently() {
        let form = FormInput::from_raw(" 150.5 ", "68", "30.0", "F");
        assert_eq!(form.weight, Some(150.5));
        assert_eq!(form.height, Some(68.0));
        assert_eq!(form.age, Some(30));
        assert_eq!(form.sex, Some(Sex::Female));

        let form = FormInput::from_raw("", "abc", "30.5", "");
        assert_eq!(form, FormInput::default());
    }

    #[test]
    fn zero_values_count_as_unfilled() {
        let form = FormInput {
            weight: Some(0.0),
            height: Some(68.0),
            age: Some(30),
            sex: Some(Sex::Male),
        };
        assert_eq!(form.feature_row(), None);
    }

    #[test]
    fn feature_row_keeps_training_order() {
        let form = FormInput {
            weight: Some(150.0),
            height: Some(68.0),
            age: Some(30),
            sex: Some(Sex::Female),
        };
        assert_eq!(form.feature_row(), Some(vec![150.0, 68.0, 30.0, 0.0]));
    }
}
