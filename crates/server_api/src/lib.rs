use std::{fmt, sync::Arc};

use predictor::{Predictor, PredictorError};
use shared::{
    domain::{FormInput, Trigger},
    error::ValidationError,
};
use tracing::debug;

#[derive(Clone)]
pub struct ApiContext {
    pub predictor: Arc<dyn Predictor>,
}

impl ApiContext {
    pub fn new(predictor: Arc<dyn Predictor>) -> Self {
        Self { predictor }
    }
}

/// What the output region shows after a predict callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PredictionOutput {
    Idle,
    Invalid(ValidationError),
    Predicted(f32),
}

impl PredictionOutput {
    pub fn children(&self) -> Option<String> {
        match self {
            Self::Idle => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for PredictionOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => Ok(()),
            Self::Invalid(err) => write!(f, "{err}"),
            Self::Predicted(value) => {
                write!(f, "Predicted treadmill calories accuracy: {value:.2}%")
            }
        }
    }
}

/// Everything the page needs to re-render, carried by the browser between events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageState {
    pub modal_open: bool,
    pub predict_clicks: u32,
    pub form: FormInput,
    pub output: String,
}

/// Open and close both invert the current state; every other trigger leaves it alone.
pub fn toggle_modal(trigger: Option<Trigger>, is_open: bool) -> bool {
    match trigger {
        Some(Trigger::OpenModal | Trigger::CloseModal) => !is_open,
        _ => is_open,
    }
}

pub fn predict_accuracy(
    ctx: &ApiContext,
    n_clicks: Option<u32>,
    form: &FormInput,
) -> Result<PredictionOutput, PredictorError> {
    if n_clicks.unwrap_or(0) == 0 {
        return Ok(PredictionOutput::Idle);
    }
    let Some(row) = form.feature_row() else {
        return Ok(PredictionOutput::Invalid(ValidationError::MissingFields));
    };

    let outputs = ctx.predictor.predict(&[row])?;
    let value = outputs.first().copied().ok_or(PredictorError::EmptyOutput)?;
    Ok(PredictionOutput::Predicted(value))
}

/// Routes one click to the handler that owns it and returns the next page state.
pub fn apply_event(
    ctx: &ApiContext,
    trigger: Option<Trigger>,
    mut state: PageState,
) -> Result<PageState, PredictorError> {
    debug!(trigger = ?trigger, modal_open = state.modal_open, "dispatching page event");
    match trigger {
        Some(Trigger::OpenModal | Trigger::CloseModal) => {
            state.modal_open = toggle_modal(trigger, state.modal_open);
        }
        Some(Trigger::Predict) => {
            state.predict_clicks = state.predict_clicks.saturating_add(1);
            state.output =
                predict_accuracy(ctx, Some(state.predict_clicks), &state.form)?.to_string();
        }
        None => {}
    }
    Ok(state)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
