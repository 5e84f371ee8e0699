use log::info;
use std::collections::BTreeMap;
use std::ffi::OsString;

pub fn mask_api_key(key: &str) -> String {
    let visible: String = key.chars().take(5).collect();
    let hidden = key.chars().count().saturating_sub(5);
    format!("{}{}", visible, "*".repeat(hidden))
}

pub fn request_id() -> String {
    chrono::Utc::now().format("%Y%m%d%H%M%S%f").to_string()
}

/// Environment snapshot safe to log: the Gemini key keeps its first five
/// characters, anything else named like a key or secret is fully masked.
/// Names and values that are not valid Unicode are converted lossily.
pub fn masked_environment<I>(vars: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .map(|(key, value)| {
            let key = key.to_string_lossy().into_owned();
            let value = value.to_string_lossy().into_owned();
            let upper = key.to_uppercase();
            let value = if key == "GEMINI_API_KEY" {
                mask_api_key(&value)
            } else if upper.contains("KEY") || upper.contains("SECRET") || upper.contains("TOKEN") {
                "*".repeat(8)
            } else {
                value
            };
            (key, value)
        })
        .collect()
}

pub fn log_environment_variables() {
    let env_vars = masked_environment(std::env::vars_os());
    match serde_json::to_string_pretty(&env_vars) {
        Ok(pretty) => info!("Environment variables: {}", pretty),
        Err(e) => info!("Environment variables could not be rendered: {}", e),
    }
}
