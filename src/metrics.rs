use lazy_static::lazy_static;
use prometheus::{
    Encoder, IntCounter, IntCounterVec, IntGauge, TextEncoder, register_int_counter,
    register_int_counter_vec, register_int_gauge,
};

lazy_static! {
    pub static ref REQUEST_TOTAL: IntCounter =
        register_int_counter!("forecast_requests_total", "Total number of requests").unwrap();
    pub static ref RATE_LIMIT_DECISIONS: IntCounterVec = register_int_counter_vec!(
        "forecast_rate_limit_decisions_total",
        "Rate limiter decisions by reason",
        &["reason"]
    )
    .unwrap();
    pub static ref RATE_WINDOWS: IntGauge =
        register_int_gauge!("forecast_rate_windows", "Current number of tracked rate windows")
            .unwrap();
    pub static ref RATE_WINDOWS_EVICTED: IntCounter = register_int_counter!(
        "forecast_rate_windows_evicted_total",
        "Idle rate windows removed by the sweeper"
    )
    .unwrap();
}

// Render every registered metric in the prometheus text format
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
