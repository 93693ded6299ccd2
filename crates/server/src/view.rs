//! HTML projection of `PageState`. Every control sits inside one form that posts back to `/`.

use server_api::PageState;
use shared::domain::{Sex, Trigger};

const BOOTSTRAP_CSS: &str =
    "https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css";

pub fn render_page(state: &PageState) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Treadmill Calories Accuracy Predictor</title>
<link rel="stylesheet" href="{css}">
</head>
<body>
<form method="post" action="/">
<input type="hidden" name="modal_open" value="{modal_open}">
<input type="hidden" name="predict_clicks" value="{predict_clicks}">
<input type="hidden" name="output" value="{output}">
<h1 class="text-center mt-5">Treadmill Calories Accuracy Predictor</h1>
<div class="text-center my-5">
<button type="submit" name="trigger" value="{open_id}" id="{open_id}" class="btn btn-primary">Open Modal</button>
</div>
{modal}
<div id="accuracy-output" class="text-center mt-4 p-2">{output}</div>
</form>
</body>
</html>
"#,
        css = BOOTSTRAP_CSS,
        modal_open = state.modal_open,
        predict_clicks = state.predict_clicks,
        output = escape_html(&state.output),
        open_id = Trigger::OpenModal.component_id(),
        modal = render_modal(state),
    )
}

fn render_modal(state: &PageState) -> String {
    let (class, style, backdrop) = if state.modal_open {
        (
            "modal show",
            "display: block",
            "\n<div class=\"modal-backdrop show\"></div>",
        )
    } else {
        ("modal", "display: none", "")
    };
    let form = &state.form;

    format!(
        r#"<div id="modal" class="{class}" style="{style}" tabindex="-1">
<div class="modal-dialog modal-dialog-centered">
<div class="modal-content">
<div class="modal-header">Enter Your Information</div>
<div class="modal-body">
<div class="mb-3">
<label for="weight">Weight (lbs)</label>
<input id="weight" name="weight" type="number" step="0.1" placeholder="Enter your weight" value="{weight}">
</div>
<div class="mb-3">
<label for="height">Height (inches)</label>
<input id="height" name="height" type="number" step="0.1" placeholder="Enter your height" value="{height}">
</div>
<div class="mb-3">
<label for="age">Age</label>
<input id="age" name="age" type="number" step="1" placeholder="Enter your age" value="{age}">
</div>
<div class="mb-3">
<label for="sex">Gender</label>
<select id="sex" name="sex">
<option value="">Select your gender</option>
{sex_options}
</select>
</div>
</div>
<div class="modal-footer">
<button type="submit" name="trigger" value="{close_id}" id="{close_id}" class="btn btn-secondary">Close</button>
<button type="submit" name="trigger" value="{predict_id}" id="{predict_id}" class="btn btn-primary">Predict</button>
</div>
</div>
</div>
</div>{backdrop}"#,
        weight = form.weight.map(|v| v.to_string()).unwrap_or_default(),
        height = form.height.map(|v| v.to_string()).unwrap_or_default(),
        age = form.age.map(|v| v.to_string()).unwrap_or_default(),
        sex_options = sex_options(form.sex),
        close_id = Trigger::CloseModal.component_id(),
        predict_id = Trigger::Predict.component_id(),
    )
}

fn sex_options(selected: Option<Sex>) -> String {
    [(Sex::Male, "Male"), (Sex::Female, "Female")]
        .iter()
        .map(|(sex, label)| {
            let marker = if selected == Some(*sex) { " selected" } else { "" };
            format!("<option value=\"{}\"{marker}>{label}</option>", sex.code())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::FormInput;

    #[test]
    fn closed_modal_is_hidden_but_keeps_fields() {
        let state = PageState {
            form: FormInput {
                weight: Some(150.5),
                ..FormInput::default()
            },
            ..PageState::default()
        };
        let html = render_page(&state);
        assert!(html.contains(r#"class="modal" style="display: none""#));
        assert!(html.contains(r#"value="150.5""#));
        assert!(!html.contains("modal-backdrop"));
    }

    #[test]
    fn open_modal_is_shown_with_selected_sex() {
        let state = PageState {
            modal_open: true,
            form: FormInput {
                sex: Some(Sex::Female),
                ..FormInput::default()
            },
            ..PageState::default()
        };
        let html = render_page(&state);
        assert!(html.contains(r#"class="modal show" style="display: block""#));
        assert!(html.contains(r#"<option value="F" selected>Female</option>"#));
        assert!(html.contains(r#"<option value="M">Male</option>"#));
        assert!(html.contains(r#"name="modal_open" value="true""#));
    }

    #[test]
    fn output_text_is_escaped() {
        let state = PageState {
            output: "<script>\"x\"</script>".to_string(),
            ..PageState::default()
        };
        let html = render_page(&state);
        assert!(html.contains("&lt;script&gt;&quot;x&quot;&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
