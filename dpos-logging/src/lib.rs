// Copyright (c) 2021 MASSA LABS <info@massa.net>

/// Emit a structured trace event: an event name followed by a JSON object of parameters.
///
/// ```
/// # use dpos_logging::dpos_trace;
/// dpos_trace!("consensus.block_processed", { "height": 2, "id": "1234" });
/// ```
#[macro_export]
macro_rules! dpos_trace {
    ($evt:expr, $params:tt) => {
        tracing::trace!("dpos_trace:{}:{}", $evt, serde_json::json!($params));
    };
}
