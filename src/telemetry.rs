//! Log subscriber setup for the service.
//!
//! `LOG_LEVEL` takes `EnvFilter` directives; unset or unparsable falls back to
//! [`DEFAULT_FILTER`]. `LOG_FORMAT=json` emits one JSON object per event, any
//! other value keeps the human-readable format.
//!
//! Targets: `connections_backend` (service), `puzzle` (engine + loads),
//! `repository` (upstream API calls). Request spans come from tower-http.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,puzzle=debug,connections_backend=debug,repository=info,tower_http=info,axum=info";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_env_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let format = LogFormat::from_env_value(std::env::var("LOG_FORMAT").ok().as_deref());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true);

    match format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Pretty => subscriber.init(),
    }
}
