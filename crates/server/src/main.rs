use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Form, Json, Router,
};
use predictor::load_predictor;
use serde::Deserialize;
use server_api::{apply_event, predict_accuracy, toggle_modal, ApiContext, PageState};
use shared::{
    domain::{FormInput, Trigger},
    error::{ApiError, ErrorCode},
    protocol::{
        PredictAccuracyRequest, PredictAccuracyResponse, ToggleModalRequest, ToggleModalResponse,
    },
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info};

mod app_state;
mod config;
mod view;

use app_state::AppState;
use config::{app_dir, load_settings, resolve_model_path};
use view::render_page;

const MAX_BODY_BYTES: usize = 16 * 1024;

/// Fields posted by the page form. Everything arrives as text and is parsed leniently.
#[derive(Debug, Default, Deserialize)]
struct PageForm {
    #[serde(default)]
    trigger: Option<String>,
    #[serde(default)]
    modal_open: Option<String>,
    #[serde(default)]
    predict_clicks: Option<String>,
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    weight: Option<String>,
    #[serde(default)]
    height: Option<String>,
    #[serde(default)]
    age: Option<String>,
    #[serde(default)]
    sex: Option<String>,
}

impl PageForm {
    fn into_event(self) -> (Option<Trigger>, PageState) {
        let trigger = self
            .trigger
            .as_deref()
            .and_then(Trigger::from_component_id);
        let state = PageState {
            modal_open: self.modal_open.as_deref().map(str::trim) == Some("true"),
            predict_clicks: self
                .predict_clicks
                .as_deref()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0),
            form: FormInput::from_raw(
                self.weight.as_deref().unwrap_or_default(),
                self.height.as_deref().unwrap_or_default(),
                self.age.as_deref().unwrap_or_default(),
                self.sex.as_deref().unwrap_or_default(),
            ),
            output: self.output.unwrap_or_default(),
        };
        (trigger, state)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = load_settings();
    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.as_str())
        .init();

    let model_path = resolve_model_path(&settings.model_path, &app_dir());
    let model = load_predictor(&model_path)
        .map_err(|error| {
            error!(
                path = %model_path.display(),
                %error,
                "failed to load prediction model; verify the model file exists and is an xgboost json model"
            );
            error
        })
        .with_context(|| format!("loading model from '{}'", model_path.display()))?;

    let state = AppState {
        api: ApiContext::new(Arc::new(model)),
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings
        .server_bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.server_bind))?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(%error, "failed to listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index).post(submit_page))
        .route("/healthz", get(healthz))
        .route("/callbacks/toggle-modal", post(http_toggle_modal))
        .route("/callbacks/predict-accuracy", post(http_predict_accuracy))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn index() -> Html<String> {
    Html(render_page(&PageState::default()))
}

async fn submit_page(
    State(state): State<Arc<AppState>>,
    Form(form): Form<PageForm>,
) -> Result<Html<String>, (StatusCode, String)> {
    let (trigger, page) = form.into_event();
    let next = apply_event(&state.api, trigger, page).map_err(|e| {
        error!(error = %e, "prediction failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("prediction failed: {e}"),
        )
    })?;
    Ok(Html(render_page(&next)))
}

async fn http_toggle_modal(Json(req): Json<ToggleModalRequest>) -> Json<ToggleModalResponse> {
    let trigger = req
        .triggered_id
        .as_deref()
        .and_then(Trigger::from_component_id);
    Json(ToggleModalResponse {
        is_open: toggle_modal(trigger, req.is_open),
    })
}

async fn http_predict_accuracy(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PredictAccuracyRequest>,
) -> Result<Json<PredictAccuracyResponse>, (StatusCode, Json<ApiError>)> {
    let output = predict_accuracy(&state.api, req.n_clicks, &req.form()).map_err(|e| {
        error!(error = %e, "prediction failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(ErrorCode::Internal, e.to_string())),
        )
    })?;
    Ok(Json(PredictAccuracyResponse {
        children: output.children(),
    }))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
