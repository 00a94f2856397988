//! Service configuration: optional TOML file plus environment overrides.
//!
//! Env variables:
//!   CONNECTIONS_CONFIG_PATH   : path to a TOML file (schema = `ServiceConfig`)
//!   CONNECTIONS_API_BASE_URL  : base URL of the Connections API
//!   PORT                      : u16
//!
//! A broken or missing file is logged and the defaults are used.

use std::time::Duration;

use serde::{de, Deserialize, Deserializer};
use tracing::{error, info};

use crate::engine::RevealPolicy;
use crate::loader::PollPolicy;

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServiceConfig {
  pub api_base_url: String,
  pub request_timeout_secs: u64,
  pub port: u16,
  pub poll: PollConfig,
  pub reveal: RevealConfig,
}

impl Default for ServiceConfig {
  fn default() -> Self {
    Self {
      api_base_url: "http://localhost:8080".into(),
      request_timeout_secs: 35,
      port: 3000,
      poll: PollConfig::default(),
      reveal: RevealConfig::default(),
    }
  }
}

/// Retry loop while a game is still being generated.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PollConfig {
  /// Seconds between polls, at least 1.
  #[serde(deserialize_with = "non_zero_secs")]
  pub interval_secs: u64,
  /// Unset means poll until the game is ready.
  pub max_attempts: Option<u32>,
}

impl Default for PollConfig {
  fn default() -> Self {
    Self { interval_secs: 10, max_attempts: None }
  }
}

fn non_zero_secs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
  match u64::deserialize(deserializer)? {
    0 => Err(de::Error::invalid_value(de::Unexpected::Unsigned(0), &"an interval of at least 1 second")),
    secs => Ok(secs),
  }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RevealMode {
  #[default]
  Always,
  AfterIncorrectGuesses,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RevealConfig {
  pub mode: RevealMode,
  /// Only read in `after_incorrect_guesses` mode.
  pub min_incorrect_guesses: u32,
}

impl Default for RevealConfig {
  fn default() -> Self {
    Self { mode: RevealMode::Always, min_incorrect_guesses: 4 }
  }
}

impl ServiceConfig {
  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.request_timeout_secs)
  }

  pub fn poll_policy(&self) -> PollPolicy {
    PollPolicy {
      interval: Duration::from_secs(self.poll.interval_secs),
      max_attempts: self.poll.max_attempts,
    }
  }

  pub fn reveal_policy(&self) -> RevealPolicy {
    match self.reveal.mode {
      RevealMode::Always => RevealPolicy::Always,
      RevealMode::AfterIncorrectGuesses => RevealPolicy::AfterIncorrectGuesses(self.reveal.min_incorrect_guesses),
    }
  }

  /// Apply env overrides. `lookup` is `std::env::var` outside of tests.
  pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
    if let Some(url) = lookup("CONNECTIONS_API_BASE_URL").filter(|u| !u.is_empty()) {
      self.api_base_url = url;
    }
    if let Some(port) = lookup("PORT").and_then(|p| p.parse::<u16>().ok()) {
      self.port = port;
    }
    self
  }
}

pub fn parse_config(text: &str) -> Result<ServiceConfig, toml::de::Error> {
  toml::from_str::<ServiceConfig>(text)
}

/// Read CONNECTIONS_CONFIG_PATH (if set), then apply env overrides.
pub fn load_config() -> ServiceConfig {
  let from_file = std::env::var("CONNECTIONS_CONFIG_PATH").ok().and_then(|path| {
    match std::fs::read_to_string(&path) {
      Ok(s) => match parse_config(&s) {
        Ok(cfg) => {
          info!(target: "connections_backend", %path, "Loaded service config (TOML)");
          Some(cfg)
        }
        Err(e) => {
          error!(target: "connections_backend", %path, error = %e, "Failed to parse TOML config");
          None
        }
      },
      Err(e) => {
        error!(target: "connections_backend", %path, error = %e, "Failed to read TOML config file");
        None
      }
    }
  });

  from_file
    .unwrap_or_default()
    .with_overrides(|key| std::env::var(key).ok())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_file_gives_defaults() {
    let cfg = parse_config("").unwrap();
    assert_eq!(cfg, ServiceConfig::default());
    assert_eq!(cfg.request_timeout(), Duration::from_secs(35));
    assert_eq!(cfg.poll_policy(), PollPolicy::default());
    assert_eq!(cfg.reveal_policy(), RevealPolicy::Always);
  }

  #[test]
  fn parses_partial_file() {
    let cfg = parse_config(
      r#"
        api_base_url = "https://api.example.com"

        [poll]
        max_attempts = 30

        [reveal]
        mode = "after_incorrect_guesses"
      "#,
    )
    .unwrap();

    assert_eq!(cfg.api_base_url, "https://api.example.com");
    assert_eq!(cfg.poll_policy(), PollPolicy { interval: Duration::from_secs(10), max_attempts: Some(30) });
    assert_eq!(cfg.reveal_policy(), RevealPolicy::AfterIncorrectGuesses(4));
    assert_eq!(cfg.port, 3000);
  }

  #[test]
  fn rejects_zero_poll_interval() {
    let err = parse_config("[poll]\ninterval_secs = 0").unwrap_err();
    assert!(err.to_string().contains("at least 1 second"), "{err}");

    let cfg = parse_config("[poll]\ninterval_secs = 3").unwrap();
    assert_eq!(cfg.poll_policy().interval, Duration::from_secs(3));
  }

  #[test]
  fn rejects_unknown_reveal_mode() {
    assert!(parse_config("[reveal]\nmode = \"never\"").is_err());
  }

  #[test]
  fn env_overrides_file() {
    let cfg = ServiceConfig::default().with_overrides(|key| match key {
      "CONNECTIONS_API_BASE_URL" => Some("https://games.example.org".into()),
      "PORT" => Some("not-a-port".into()),
      _ => None,
    });
    assert_eq!(cfg.api_base_url, "https://games.example.org");
    assert_eq!(cfg.port, 3000);

    let cfg = ServiceConfig::default().with_overrides(|key| (key == "PORT").then(|| "8081".to_string()));
    assert_eq!(cfg.port, 8081);
    assert_eq!(cfg.api_base_url, "http://localhost:8080");
  }
}
