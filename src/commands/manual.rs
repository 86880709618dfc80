use colored::Colorize;
use segi9::logging::TracingSink;
use segi9::plugin::{Plugin, METRIC_KEY};
use segi9::executor::redact_url;
use segi9::EffectiveConfig;
use std::sync::Arc;
use tracing::info;

/// Execute the manual command
///
/// Performs one request with the relaxed manual-mode policy (10s timeout,
/// certificate verification off) and prints the body to stdout.
/// Returns the process exit code.
pub async fn execute(
    url: String,
    auth: String,
    user: Option<String>,
    pass: Option<String>,
) -> i32 {
    info!(url = %redact_url(&url), auth = %auth, "manual mode");

    let plugin = Plugin::new(EffectiveConfig::manual(), Arc::new(TracingSink));
    let params = build_params(url, auth, user, pass);

    match plugin.export(METRIC_KEY, &params).await {
        Ok(body) => {
            println!("{}", body);
            0
        }
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            1
        }
    }
}

/// Lay out CLI arguments in export parameter order
fn build_params(
    url: String,
    auth: String,
    user: Option<String>,
    pass: Option<String>,
) -> Vec<String> {
    let mut params = vec![url, auth];
    if user.is_some() || pass.is_some() {
        params.push(user.unwrap_or_default());
    }
    if let Some(pass) = pass {
        params.push(pass);
    }
    params
}
