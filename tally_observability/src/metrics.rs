use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
};

/// Returns a meter from the global meter provider.
///
/// Before `init_observability` runs this is a no-op meter, so instruments can
/// be created unconditionally.
pub fn meter(name: &'static str) -> Meter {
    global::meter(name)
}

/// A monotonic `u64` counter.
pub fn counter(
    meter: &Meter,
    name: &'static str,
    unit: &'static str,
    description: &'static str,
) -> Counter<u64> {
    meter
        .u64_counter(name)
        .with_unit(unit)
        .with_description(description)
        .build()
}

/// A histogram of durations in seconds.
pub fn duration_histogram(
    meter: &Meter,
    name: &'static str,
    description: &'static str,
) -> Histogram<f64> {
    meter
        .f64_histogram(name)
        .with_unit("s")
        .with_description(description)
        .build()
}
