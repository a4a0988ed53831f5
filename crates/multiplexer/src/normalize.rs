//! Unit normalization applied once per upstream batch

use catalog::metric_names::INGRESS_JITTER_AVG;
use contracts::TelemetryMessage;

/// Scale the average ingress jitter reported by the switch down to display
/// units: `round(value / 1000)`. Non-positive values are left alone.
///
/// Rewrites in place and returns the number of items changed. Not idempotent:
/// call it exactly once per received message.
pub fn normalize(message: &mut TelemetryMessage) -> usize {
    let mut changed = 0;
    for item in message
        .metrics
        .iter_mut()
        .filter(|item| item.metric_name == INGRESS_JITTER_AVG && item.value > 0.0)
    {
        item.value = (item.value / 1000.0).round();
        changed += 1;
    }
    changed
}
