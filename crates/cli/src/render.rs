use anyhow::Result;
use metahint_engine::{MatchReason, PredictedHint, SessionView};
use metahint_protocol::{CurrentLocationContext, HintRecord};
use std::fmt::Write as _;

pub fn print_view(view: &SessionView<'_>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
    } else {
        print!("{}", describe_view(view));
    }
    Ok(())
}

pub fn describe_view(view: &SessionView<'_>) -> String {
    let mut out = String::new();
    match view.location_id {
        Some(id) => {
            let _ = writeln!(out, "Location: {id}");
        }
        None => {
            let _ = writeln!(out, "Location: none");
        }
    }
    if let Some(context) = describe_context(view.context) {
        let _ = writeln!(out, "Context: {context}");
    }
    let _ = writeln!(out, "Data: {}", view.status);

    let _ = writeln!(out, "Exact hints ({}):", view.exact.len());
    for hint in &view.exact {
        let _ = writeln!(out, "  - {}", describe_hint(hint));
        if !hint.description.is_empty() {
            let _ = writeln!(out, "      {}", hint.description);
        }
    }
    let _ = writeln!(out, "Predicted hints ({}):", view.predicted.len());
    for predicted in &view.predicted {
        let _ = writeln!(out, "  - {}", describe_prediction(predicted));
    }
    out
}

/// One-line summary used by `replay`.
pub fn summarize_view(view: &SessionView<'_>) -> String {
    let ids = |hints: Vec<&str>| {
        if hints.is_empty() {
            "-".to_string()
        } else {
            hints.join(",")
        }
    };
    format!(
        "location={} state={:?} exact={} predicted={}",
        view.location_id.map_or("-", |id| id.as_str()),
        view.lock_state,
        ids(view.exact.iter().map(|h| h.id.as_str()).collect()),
        ids(view.predicted.iter().map(|p| p.hint.id.as_str()).collect()),
    )
}

fn describe_context(context: &CurrentLocationContext) -> Option<String> {
    let mut parts: Vec<String> = [&context.country, &context.region, &context.road]
        .into_iter()
        .flatten()
        .cloned()
        .collect();
    if let Some(coords) = context.coordinates() {
        parts.push(format!("{:.5}, {:.5}", coords.lat, coords.lng));
    }
    (!parts.is_empty()).then(|| parts.join(" / "))
}

fn describe_hint(hint: &HintRecord) -> String {
    let mut line = format!("[{}] {}", hint.id, hint.title);
    let scope = hint.scope.map(|s| s.as_str());
    let country = (!hint.country.is_empty()).then_some(hint.country.as_str());
    let detail: Vec<&str> = [scope, country].into_iter().flatten().collect();
    if !detail.is_empty() {
        let _ = write!(line, " ({})", detail.join(", "));
    }
    line
}

fn describe_prediction(predicted: &PredictedHint<'_>) -> String {
    let reason = match predicted.reason {
        MatchReason::Distance { km } => format!("linked {km:.1} km away"),
        MatchReason::Country => "same country".to_string(),
        MatchReason::Region => "same region".to_string(),
        MatchReason::Road => "same road".to_string(),
    };
    format!("{}: {reason}", describe_hint(predicted.hint))
}
