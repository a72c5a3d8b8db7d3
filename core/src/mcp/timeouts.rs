use std::time::Duration;

/// Fallback when the batch default is unusable (non-finite or non-positive).
pub const FALLBACK_TIMEOUT_SECS: f64 = 300.0;

/// Ceiling for any resolved timeout.
pub const MAX_TIMEOUT_SECS: f64 = 24.0 * 60.0 * 60.0;

/// Minimum for a server name that is not in the table.
pub const DEFAULT_SERVER_TIMEOUT_SECS: f64 = 60.0;

/// Recommended minimum timeouts. Browser automation has a much slower cold start than
/// in-process or filesystem servers.
const SERVER_TIMEOUT_TABLE: &[(&str, f64)] = &[
    ("playwright", 120.0),
    ("puppeteer", 120.0),
    ("browser", 120.0),
    ("github", 60.0),
    ("fetch", 60.0),
    ("filesystem", 30.0),
    ("memory", 30.0),
    ("sequential-thinking", 30.0),
];

pub fn recommended_timeout_secs(server: &str) -> f64 {
    let key = server.trim().to_lowercase();
    SERVER_TIMEOUT_TABLE
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, secs)| *secs)
        .unwrap_or(DEFAULT_SERVER_TIMEOUT_SECS)
}

/// Effective timeout: the task's own timeout (or the batch default when unset), raised to the
/// largest recommended minimum among the requested servers and capped at [`MAX_TIMEOUT_SECS`].
pub fn resolve_timeout(task_timeout: Option<f64>, batch_default: f64, servers: &[String]) -> Duration {
    let usable = |t: &f64| t.is_finite() && *t > 0.0;
    let default = Some(batch_default)
        .filter(usable)
        .unwrap_or(FALLBACK_TIMEOUT_SECS);
    let base = task_timeout.filter(usable).unwrap_or(default);
    let secs = servers
        .iter()
        .map(|s| recommended_timeout_secs(s))
        .fold(base, f64::max)
        .min(MAX_TIMEOUT_SECS);
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::from_secs_f64(FALLBACK_TIMEOUT_SECS))
}
