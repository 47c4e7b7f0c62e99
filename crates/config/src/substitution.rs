use anyhow::{Context, Result};
use regex::{Captures, Regex};
use std::env;
use std::sync::OnceLock;
use tracing::{debug, warn};

const ENV_VAR_PATTERN: &str = r"\$\{(\w+)\}|\$(\w+)";

fn env_var_regex() -> Result<&'static Regex> {
    static RE: OnceLock<Regex> = OnceLock::new();
    if let Some(re) = RE.get() {
        return Ok(re);
    }
    let re = Regex::new(ENV_VAR_PATTERN).context("Invalid environment variable pattern")?;
    Ok(RE.get_or_init(|| re))
}

/// Substitute environment variables in the format ${VAR_NAME} or $VAR_NAME
///
/// Unset variables keep their placeholder so the YAML error points at them.
pub fn substitute_env_vars(content: &str) -> Result<String> {
    let re = env_var_regex()?;
    let mut missing_vars = Vec::new();

    let result = re.replace_all(content, |caps: &Captures| {
        let placeholder = &caps[0];
        let Some(var_name) = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str()) else {
            return placeholder.to_string();
        };

        match env::var(var_name) {
            Ok(value) => {
                debug!("Substituting environment variable: {} = \"{}\"", var_name, value);
                value
            }
            Err(_) => {
                warn!("Environment variable '{}' not set", var_name);
                missing_vars.push(var_name.to_string());
                placeholder.to_string()
            }
        }
    });

    if !missing_vars.is_empty() {
        debug!("Environment variables not set: {:?}", missing_vars);
    }

    Ok(result.into_owned())
}

/// Check if a string contains unresolved environment variable placeholders
pub fn has_unresolved_env_vars(content: &str) -> bool {
    env_var_regex().is_ok_and(|re| re.is_match(content))
}
