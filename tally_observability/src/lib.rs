//! Logging, tracing and metrics setup shared by the tally crates.
//!
//! Logs always go to stdout. Traces and metrics are exported over OTLP only
//! when `OTEL_SDK_DISABLED=false`; otherwise the providers are installed
//! without exporters so instrumented code runs unchanged.

use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{InstrumentationScope, global};
use opentelemetry_otlp::{ExporterBuildError, MetricExporter, SpanExporter};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::trace::SdkTracerProvider;
use snafu::{ResultExt, Snafu};
use tracing::{Subscriber, warn};
use tracing_opentelemetry::MetricsLayer;
use tracing_subscriber::{EnvFilter, Layer};
use tracing_subscriber::{prelude::*, registry::LookupSpan};

pub use opentelemetry::{
    KeyValue,
    metrics::{Counter, Histogram, Meter},
};

pub use crate::config::{LogFormat, ObservabilityConfig};
pub use crate::error_kind::ErrorKind;
pub use crate::metrics::{counter, duration_histogram, meter};

mod config;
mod error_kind;
mod metrics;

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

#[derive(Debug, Snafu)]
pub enum ObservabilityError {
    #[snafu(display("Failed to build exporter"))]
    Exporter { source: ExporterBuildError },
    #[snafu(display("Failed to install tracing subscriber"))]
    Subscriber {
        source: tracing_subscriber::util::TryInitError,
    },
}

/// Keeps the trace and meter providers alive.
///
/// Call [`ObservabilityGuard::shutdown`] before exiting so pending spans and
/// metrics are exported.
pub struct ObservabilityGuard {
    tracer_provider: SdkTracerProvider,
    meter_provider: SdkMeterProvider,
}

impl ObservabilityGuard {
    pub fn shutdown(self) {
        if let Err(err) = self.tracer_provider.shutdown() {
            warn!(err = ?err, "failed to shut down tracer provider");
        }
        if let Err(err) = self.meter_provider.shutdown() {
            warn!(err = ?err, "failed to shut down meter provider");
        }
    }
}

/// Install the global subscriber configured from the environment.
pub fn init_observability(
    service_name: &str,
    service_version: &str,
) -> Result<ObservabilityGuard, ObservabilityError> {
    init_with_config(&ObservabilityConfig::from_env(service_name, service_version))
}

pub fn init_with_config(
    config: &ObservabilityConfig,
) -> Result<ObservabilityGuard, ObservabilityError> {
    let resource = Resource::builder()
        .with_service_name(config.service_name.clone())
        .build();

    let tracer_provider = tracer_provider(config, resource.clone())?;
    let meter_provider = meter_provider(config, resource)?;
    global::set_meter_provider(meter_provider.clone());

    let scope = InstrumentationScope::builder(config.service_name.clone())
        .with_version(config.service_version.clone())
        .build();
    let tracer = tracer_provider.tracer_with_scope(scope);

    let otel_layer = env_filter(config)
        .and_then(MetricsLayer::new(meter_provider.clone()))
        .and_then(tracing_opentelemetry::layer().with_tracer(tracer))
        .boxed();

    tracing_subscriber::registry()
        .with(vec![stdout_layer(config), otel_layer])
        .try_init()
        .context(SubscriberSnafu {})?;

    Ok(ObservabilityGuard {
        tracer_provider,
        meter_provider,
    })
}

fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.default_filter))
}

fn stdout_layer<S>(config: &ObservabilityConfig) -> BoxedLayer<S>
where
    S: Subscriber,
    for<'a> S: LookupSpan<'a>,
{
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .json()
            .with_filter(env_filter(config))
            .boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_filter(env_filter(config))
            .boxed(),
    }
}

fn tracer_provider(
    config: &ObservabilityConfig,
    resource: Resource,
) -> Result<SdkTracerProvider, ObservabilityError> {
    let builder = SdkTracerProvider::builder().with_resource(resource);

    if !config.otlp_export {
        return Ok(builder.build());
    }

    let exporter = SpanExporter::builder()
        .with_tonic()
        .build()
        .context(ExporterSnafu {})?;

    Ok(builder.with_batch_exporter(exporter).build())
}

fn meter_provider(
    config: &ObservabilityConfig,
    resource: Resource,
) -> Result<SdkMeterProvider, ObservabilityError> {
    let builder = SdkMeterProvider::builder().with_resource(resource);

    if !config.otlp_export {
        return Ok(builder.build());
    }

    let exporter = MetricExporter::builder()
        .with_tonic()
        .build()
        .context(ExporterSnafu {})?;
    let reader = PeriodicReader::builder(exporter)
        .with_interval(config.metrics_interval)
        .build();

    Ok(builder.with_reader(reader).build())
}
