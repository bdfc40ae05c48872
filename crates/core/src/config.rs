//! Plugin options as handed over by the host build tool.
//!
//! Options arrive as the JSON object attached to the plugin entry in the host
//! configuration. Each known key is read on its own: a key with the wrong type
//! is reported and falls back to its default without affecting the others.
//! Legacy keys are remapped with a deprecation warning, and options missing
//! from the object fall back to `RELAY_HOT_*` environment variables.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::ConfigError;

/// Poll interval used when the options do not name one.
pub const DEFAULT_WATCH_INTERVAL_MS: u64 = 2000;

const ENV_SCHEMA: &str = "RELAY_HOT_SCHEMA";
const ENV_WATCH_INTERVAL_MS: &str = "RELAY_HOT_WATCH_INTERVAL_MS";
const ENV_VERBOSE: &str = "RELAY_HOT_VERBOSE";

const KEY_SCHEMA: &str = "schema";
const KEY_LEGACY_SCHEMA: &str = "schemaJsonFilepath";
const KEY_WATCH_INTERVAL_MS: &str = "watchIntervalMs";
const KEY_LEGACY_WATCH_INTERVAL: &str = "watchInterval";
const KEY_VERBOSE: &str = "verbose";

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn non_blank(s: String) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Remove `key` from the option map and convert it with `convert`.
///
/// Absent and `null` keys yield `None` silently. A value `convert` rejects
/// yields `None` plus an [`ConfigWarning::InvalidOption`].
fn take_key<T>(
    map: &mut Map<String, Value>,
    key: &'static str,
    expected: &'static str,
    warnings: &mut Vec<ConfigWarning>,
    convert: impl FnOnce(&Value) -> Option<T>,
) -> Option<T> {
    match map.remove(key) {
        None | Some(Value::Null) => None,
        Some(value) => {
            let converted = convert(&value);
            if converted.is_none() {
                warnings.push(ConfigWarning::InvalidOption {
                    key,
                    expected,
                    value: value.to_string(),
                });
            }
            converted
        }
    }
}

fn as_string(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

/// Integral milliseconds, any sign, any width JSON allows.
fn as_interval(value: &Value) -> Option<i128> {
    value
        .as_u64()
        .map(i128::from)
        .or_else(|| value.as_i64().map(i128::from))
}

// ── Options ───────────────────────────────────────────────────

/// Resolved plugin options.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginOptions {
    /// Schema file to load and watch. `None` leaves the plugin inert.
    #[serde(rename = "schema")]
    pub schema_path: Option<PathBuf>,
    /// Poll interval in milliseconds; `0` disables watching.
    pub watch_interval_ms: u64,
    /// Emit informational messages at `info` instead of `debug`.
    pub verbose: bool,
    /// Options this crate does not interpret, forwarded to the transformer factory.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            schema_path: None,
            watch_interval_ms: DEFAULT_WATCH_INTERVAL_MS,
            verbose: false,
            extra: Map::new(),
        }
    }
}

impl PluginOptions {
    /// Options pointing at `schema_path` with every other setting at its default.
    pub fn new(schema_path: impl Into<PathBuf>) -> Self {
        Self {
            schema_path: Some(schema_path.into()),
            ..Self::default()
        }
    }

    pub fn with_watch_interval_ms(mut self, interval_ms: u64) -> Self {
        self.watch_interval_ms = interval_ms;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Resolve options from the host-supplied object, falling back to the
    /// process environment for unset keys.
    pub fn from_value(value: &Value) -> Result<(Self, Vec<ConfigWarning>), ConfigError> {
        Self::from_value_with(value, env_opt)
    }

    /// Same as [`from_value`](Self::from_value) with an explicit environment lookup.
    pub fn from_value_with<F>(
        value: &Value,
        lookup: F,
    ) -> Result<(Self, Vec<ConfigWarning>), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut map = match value {
            Value::Null => Map::new(),
            Value::Object(map) => map.clone(),
            other => return Err(ConfigError::NotAnObject(json_type_name(other))),
        };
        let mut warnings = Vec::new();

        let schema = take_key(&mut map, KEY_SCHEMA, "a string", &mut warnings, as_string);
        let legacy_schema =
            take_key(&mut map, KEY_LEGACY_SCHEMA, "a string", &mut warnings, as_string);
        let interval_ms = take_key(
            &mut map,
            KEY_WATCH_INTERVAL_MS,
            "an integer",
            &mut warnings,
            as_interval,
        );
        let legacy_interval = take_key(
            &mut map,
            KEY_LEGACY_WATCH_INTERVAL,
            "an integer",
            &mut warnings,
            as_interval,
        );
        let verbose = take_key(&mut map, KEY_VERBOSE, "a boolean", &mut warnings, Value::as_bool);

        // Schema path: `schema` wins over the legacy key, env fills the gap.
        // Blank candidates do not shadow later ones.
        if legacy_schema.is_some() {
            warnings.push(ConfigWarning::DeprecatedKey {
                key: KEY_LEGACY_SCHEMA,
                replacement: KEY_SCHEMA,
            });
        }
        let schema_path = schema
            .and_then(non_blank)
            .or_else(|| legacy_schema.and_then(non_blank))
            .or_else(|| lookup(ENV_SCHEMA).and_then(non_blank))
            .map(PathBuf::from);
        if schema_path.is_none() {
            warnings.push(ConfigWarning::MissingSchemaPath);
        }

        if legacy_interval.is_some() {
            warnings.push(ConfigWarning::DeprecatedKey {
                key: KEY_LEGACY_WATCH_INTERVAL,
                replacement: KEY_WATCH_INTERVAL_MS,
            });
        }
        let interval = match interval_ms.or(legacy_interval) {
            Some(ms) => Some(ms),
            None => lookup(ENV_WATCH_INTERVAL_MS).and_then(|v| match v.trim().parse::<i128>() {
                Ok(ms) => Some(ms),
                Err(_) => {
                    warnings.push(ConfigWarning::InvalidEnv {
                        key: ENV_WATCH_INTERVAL_MS,
                        value: v,
                    });
                    None
                }
            }),
        };
        let watch_interval_ms = match interval {
            Some(ms) if ms < 0 => {
                warnings.push(ConfigWarning::NegativeWatchInterval(
                    i64::try_from(ms).unwrap_or(i64::MIN),
                ));
                0
            }
            Some(ms) => u64::try_from(ms).unwrap_or(u64::MAX),
            None => DEFAULT_WATCH_INTERVAL_MS,
        };

        let verbose = match verbose {
            Some(v) => v,
            None => lookup(ENV_VERBOSE)
                .and_then(|v| match parse_bool(&v) {
                    Some(b) => Some(b),
                    None => {
                        warnings.push(ConfigWarning::InvalidEnv {
                            key: ENV_VERBOSE,
                            value: v,
                        });
                        None
                    }
                })
                .unwrap_or(false),
        };

        Ok((
            Self {
                schema_path,
                watch_interval_ms,
                verbose,
                extra: map,
            },
            warnings,
        ))
    }

    pub fn schema_path(&self) -> Option<&Path> {
        self.schema_path.as_deref()
    }

    /// Poll interval, or `None` when watching is disabled.
    pub fn watch_interval(&self) -> Option<Duration> {
        (self.watch_interval_ms > 0).then(|| Duration::from_millis(self.watch_interval_ms))
    }

    /// Whether a schema watcher should run for these options.
    pub fn watch_enabled(&self) -> bool {
        self.watch_interval_ms > 0 && self.schema_path.is_some()
    }
}

// ── Warnings ──────────────────────────────────────────────────

/// Non-fatal configuration problem, reported once at activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// No schema path was configured; the plugin stays inert.
    MissingSchemaPath,
    /// A legacy key was used and remapped.
    DeprecatedKey {
        key: &'static str,
        replacement: &'static str,
    },
    /// A known key had the wrong type; its default is used instead.
    InvalidOption {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
    /// A negative interval was given; watching is disabled.
    NegativeWatchInterval(i64),
    /// An environment fallback could not be parsed and was ignored.
    InvalidEnv { key: &'static str, value: String },
}

impl ConfigWarning {
    pub fn log(&self) {
        warn!("{}", self);
    }
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::MissingSchemaPath => write!(
                f,
                "no `schema` option configured, tagged templates will not be transformed. \
                 Add it to the plugin options, e.g. \
                 {{\"schema\": \"./schema.json\", \"watchIntervalMs\": {}}}",
                DEFAULT_WATCH_INTERVAL_MS
            ),
            ConfigWarning::DeprecatedKey { key, replacement } => write!(
                f,
                "option `{}` is deprecated, use `{}` instead",
                key, replacement
            ),
            ConfigWarning::InvalidOption {
                key,
                expected,
                value,
            } => write!(
                f,
                "ignoring option `{}`: expected {}, got {}, using the default",
                key, expected, value
            ),
            ConfigWarning::NegativeWatchInterval(ms) => write!(
                f,
                "`watchIntervalMs` is negative ({}), schema watching is disabled",
                ms
            ),
            ConfigWarning::InvalidEnv { key, value } => {
                write!(f, "ignoring {}={:?}: not a valid value", key, value)
            }
        }
    }
}
