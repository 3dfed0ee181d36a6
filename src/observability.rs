use std::net::SocketAddr;

// ── Booking flow metrics ────────────────────────────────────────

/// Counter: successful bookings.
pub const BOOKINGS_TOTAL: &str = "slotbook_bookings_total";

/// Counter: booking attempts rejected (lost race, blocked, past, already reserved).
pub const BOOKING_REJECTIONS_TOTAL: &str = "slotbook_booking_rejections_total";

/// Counter: cancellations (consumer- and provider-initiated).
pub const CANCELLATIONS_TOTAL: &str = "slotbook_cancellations_total";

/// Counter: successful rebooks (atomic moves).
pub const REBOOKS_TOTAL: &str = "slotbook_rebooks_total";

/// Counter: slots transitioned to Blocked by block-period calls.
pub const SLOTS_BLOCKED_TOTAL: &str = "slotbook_slots_blocked_total";

// ── Window publication metrics ──────────────────────────────────

/// Counter: availability windows published.
pub const WINDOWS_PUBLISHED_TOTAL: &str = "slotbook_windows_published_total";

/// Counter: slots generated from published windows.
pub const SLOTS_GENERATED_TOTAL: &str = "slotbook_slots_generated_total";

/// Counter: window submissions rejected for validation or conflict reasons.
pub const WINDOW_REJECTIONS_TOTAL: &str = "slotbook_window_rejections_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

/// Install a plain fmt tracing subscriber. Safe to call more than once;
/// later calls are no-ops. Mostly useful for embedders and tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}
