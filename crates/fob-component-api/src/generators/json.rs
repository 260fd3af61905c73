//! JSON output for analyzed components.

use chrono::Utc;
use serde::Serialize;

use crate::{error::Result, model::ComponentDoc};

/// Pretty-printed JSON for a set of analyzed components, with version and
/// generation timestamp.
pub fn render_json(components: &[ComponentDoc]) -> Result<String> {
    let payload = JsonPayload {
        version: env!("CARGO_PKG_VERSION"),
        generated_at: Utc::now().to_rfc3339(),
        components,
    };

    Ok(serde_json::to_string_pretty(&payload)?)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonPayload<'a> {
    version: &'static str,
    generated_at: String,
    components: &'a [ComponentDoc],
}
