use std::time::Duration;

const OTEL_SDK_DISABLED: &str = "OTEL_SDK_DISABLED";
const LOG_FORMAT: &str = "RUST_LOG_FORMAT";
const DEFAULT_FILTER: &str = "INFO";
const METRICS_EXPORT_INTERVAL: Duration = Duration::from_secs(10);

/// Output format of the stdout log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

/// Settings for logging, tracing and metrics export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    pub service_name: String,
    pub service_version: String,
    pub log_format: LogFormat,
    /// Export traces and metrics over OTLP.
    ///
    /// Off unless `OTEL_SDK_DISABLED=false`.
    pub otlp_export: bool,
    pub metrics_interval: Duration,
    /// Filter used when `RUST_LOG` is not set.
    pub default_filter: String,
}

impl ObservabilityConfig {
    pub fn from_env(service_name: impl Into<String>, service_version: impl Into<String>) -> Self {
        Self::from_lookup(service_name, service_version, |key| std::env::var(key).ok())
    }

    /// Build the configuration reading variables through `lookup`.
    pub fn from_lookup(
        service_name: impl Into<String>,
        service_version: impl Into<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let log_format = match lookup(LOG_FORMAT).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        };

        let otlp_export = lookup(OTEL_SDK_DISABLED).is_some_and(|v| v == "false");

        Self {
            service_name: service_name.into(),
            service_version: service_version.into(),
            log_format,
            otlp_export,
            metrics_interval: METRICS_EXPORT_INTERVAL,
            default_filter: DEFAULT_FILTER.to_string(),
        }
    }
}
