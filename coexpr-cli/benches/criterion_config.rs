use criterion::Criterion;
use std::time::Duration;

/// Each iteration spawns the `coexpr` binary and writes a full result
/// directory, so samples are few and long.
pub fn configure_criterion() -> Criterion {
    Criterion::default()
        .measurement_time(Duration::from_secs(30))
        .warm_up_time(Duration::from_secs(2))
        .sample_size(10)
        .noise_threshold(0.05)
        .without_plots()
}
