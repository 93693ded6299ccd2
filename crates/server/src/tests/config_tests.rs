use super::{apply_file_overrides, resolve_model_path, Settings};

use std::path::Path;

#[test]
fn defaults_bind_locally_and_point_at_notebook_model() {
    let settings = Settings::default();
    assert_eq!(settings.server_bind, "127.0.0.1:8050");
    assert_eq!(settings.model_path, "../notebooks/xgboost_model.json");
    assert_eq!(settings.log_filter, "info");
}

#[test]
fn relative_model_path_resolves_against_app_dir() {
    let resolved = resolve_model_path("../notebooks/model.json", Path::new("/opt/predictor/app"));
    assert_eq!(
        resolved,
        Path::new("/opt/predictor/app/../notebooks/model.json")
    );
}

#[test]
fn absolute_model_path_is_kept() {
    let resolved = resolve_model_path("/srv/models/model.json", Path::new("/opt/predictor/app"));
    assert_eq!(resolved, Path::new("/srv/models/model.json"));
}

#[test]
fn blank_model_path_falls_back_to_default() {
    let resolved = resolve_model_path("  ", Path::new("/opt/app"));
    assert_eq!(resolved, Path::new("/opt/app/../notebooks/xgboost_model.json"));
}

#[test]
fn file_overrides_replace_known_keys() {
    let mut settings = Settings::default();
    apply_file_overrides(
        &mut settings,
        "bind_addr = \"0.0.0.0:9000\"\nmodel_path = \"models/m.json\"\nunused = \"x\"\n",
    );
    assert_eq!(settings.server_bind, "0.0.0.0:9000");
    assert_eq!(settings.model_path, "models/m.json");
    assert_eq!(settings.log_filter, "info");
}

#[test]
fn malformed_file_is_ignored() {
    let mut settings = Settings::default();
    apply_file_overrides(&mut settings, "bind_addr = [not valid");
    assert_eq!(settings.server_bind, "127.0.0.1:8050");
}
