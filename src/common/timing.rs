// src/common/timing.rs

use core::time::Duration;

// Values from the SCD30 interface description. The device stretches the
// clock while it prepares a read, but the host must still leave a gap
// between the command write and the read header.

// === Command/Response Timing ===

/// Minimum pause between writing a read command and reading its response.
pub const COMMAND_EXECUTION_TIME: Duration = Duration::from_millis(3);

// === Continuous Measurement ===

/// Measurement interval the device starts with.
pub const MEASUREMENT_INTERVAL_DEFAULT: Duration = Duration::from_secs(2);
/// Shortest interval the device accepts.
pub const MEASUREMENT_INTERVAL_MIN: Duration = Duration::from_secs(2);
/// Longest interval the device accepts.
pub const MEASUREMENT_INTERVAL_MAX: Duration = Duration::from_secs(1800);

// === Forced Recalibration Workflow ===

/// Total length of a forced recalibration session run by the `frc` command.
pub const FORCED_RECALIBRATION_TOTAL: Duration = Duration::from_secs(3 * 60);
/// Offset into the session at which the reference value is written.
/// The device should have been in continuous mode for at least two minutes.
pub const FORCED_RECALIBRATION_DELAY: Duration = Duration::from_secs(2 * 60);

/// Returns true if `interval` is a whole number of seconds within the device limits.
pub fn is_valid_measurement_interval(interval: Duration) -> bool {
    interval.subsec_nanos() == 0
        && interval >= MEASUREMENT_INTERVAL_MIN
        && interval <= MEASUREMENT_INTERVAL_MAX
}
