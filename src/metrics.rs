//! 进程内指标，`GET /metrics` 以 Prometheus 文本格式输出

use std::{
    collections::BTreeMap,
    fmt::Write as _,
    sync::{Mutex, MutexGuard, OnceLock},
};

static METRICS: OnceLock<Mutex<MetricsState>> = OnceLock::new();

/// 上游时延分桶上界（毫秒），最后一个桶是 +Inf
const LATENCY_BOUNDS_MS: [u128; 5] = [50, 100, 250, 500, 1000];

#[derive(Default)]
struct MetricsState {
    requests: u64,
    errors: u64,
    per_endpoint: BTreeMap<&'static str, u64>,
    per_endpoint_err: BTreeMap<&'static str, u64>,
    // 节点 RPC 成功/失败与时延
    upstream_ok: u64,
    upstream_err: u64,
    upstream_retries: u64,
    upstream_latency_sum_ms: u128,
    upstream_hist_buckets: [u64; 6],
    // 标准化
    entries_normalized: u64,
    broadcast_ok: u64,
    broadcast_err: u64,
}

fn state() -> MutexGuard<'static, MetricsState> {
    let m = METRICS.get_or_init(|| Mutex::new(MetricsState::default()));
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(), // 避免因锁污染导致 panic
    }
}

pub fn count_ok(endpoint: &'static str) {
    let mut s = state();
    s.requests += 1;
    *s.per_endpoint.entry(endpoint).or_insert(0) += 1;
}

pub fn count_err(endpoint: &'static str) {
    let mut s = state();
    s.requests += 1;
    s.errors += 1;
    *s.per_endpoint.entry(endpoint).or_insert(0) += 1;
    *s.per_endpoint_err.entry(endpoint).or_insert(0) += 1;
}

pub fn observe_upstream_latency_ms(latency_ms: u128, ok: bool) {
    let mut s = state();
    if ok {
        s.upstream_ok += 1;
    } else {
        s.upstream_err += 1;
    }
    s.upstream_latency_sum_ms += latency_ms;
    let bucket = LATENCY_BOUNDS_MS
        .iter()
        .position(|bound| latency_ms < *bound)
        .unwrap_or(LATENCY_BOUNDS_MS.len());
    s.upstream_hist_buckets[bucket] += 1;
}

pub fn inc_upstream_retry() {
    state().upstream_retries += 1;
}

pub fn add_entries_normalized(count: usize) {
    state().entries_normalized += count as u64;
}

pub fn inc_broadcast(ok: bool) {
    let mut s = state();
    if ok {
        s.broadcast_ok += 1;
    } else {
        s.broadcast_err += 1;
    }
}

fn counter(out: &mut String, name: &str, help: &str, value: impl std::fmt::Display) {
    let _ = writeln!(out, "# HELP {} {}", name, help);
    let _ = writeln!(out, "# TYPE {} counter", name);
    let _ = writeln!(out, "{} {}", name, value);
}

pub fn render_prometheus() -> String {
    let s = state();
    let mut out = String::new();

    counter(&mut out, "gxc_adapter_requests_total", "Total requests", s.requests);
    counter(&mut out, "gxc_adapter_errors_total", "Total error responses", s.errors);

    out.push_str("# HELP gxc_adapter_endpoint_requests_total Requests per endpoint\n");
    out.push_str("# TYPE gxc_adapter_endpoint_requests_total counter\n");
    for (k, v) in s.per_endpoint.iter() {
        let _ = writeln!(out, "gxc_adapter_endpoint_requests_total{{endpoint=\"{}\"}} {}", k, v);
    }
    out.push_str("# HELP gxc_adapter_endpoint_errors_total Errors per endpoint\n");
    out.push_str("# TYPE gxc_adapter_endpoint_errors_total counter\n");
    for (k, v) in s.per_endpoint_err.iter() {
        let _ = writeln!(out, "gxc_adapter_endpoint_errors_total{{endpoint=\"{}\"}} {}", k, v);
    }

    // 节点 RPC
    out.push_str("# HELP gxc_adapter_node_requests_total Node RPC requests\n");
    out.push_str("# TYPE gxc_adapter_node_requests_total counter\n");
    let _ = writeln!(out, "gxc_adapter_node_requests_total{{result=\"ok\"}} {}", s.upstream_ok);
    let _ = writeln!(out, "gxc_adapter_node_requests_total{{result=\"err\"}} {}", s.upstream_err);
    counter(
        &mut out,
        "gxc_adapter_node_retries_total",
        "Node RPC retries",
        s.upstream_retries,
    );
    counter(
        &mut out,
        "gxc_adapter_node_latency_ms_sum",
        "Sum of node RPC latency in ms",
        s.upstream_latency_sum_ms,
    );

    out.push_str("# HELP gxc_adapter_node_latency_ms_bucket Node RPC latency histogram buckets\n");
    out.push_str("# TYPE gxc_adapter_node_latency_ms_bucket histogram\n");
    let mut cumulative = 0u64;
    for (i, bound) in LATENCY_BOUNDS_MS.iter().enumerate() {
        cumulative += s.upstream_hist_buckets[i];
        let _ = writeln!(
            out,
            "gxc_adapter_node_latency_ms_bucket{{le=\"{}\"}} {}",
            bound, cumulative
        );
    }
    let _ = writeln!(
        out,
        "gxc_adapter_node_latency_ms_bucket{{le=\"+Inf\"}} {}",
        s.upstream_hist_buckets.iter().sum::<u64>()
    );

    counter(
        &mut out,
        "gxc_adapter_entries_normalized_total",
        "Ledger entries produced",
        s.entries_normalized,
    );
    out.push_str("# HELP gxc_adapter_broadcast_total Transactions broadcast\n");
    out.push_str("# TYPE gxc_adapter_broadcast_total counter\n");
    let _ = writeln!(out, "gxc_adapter_broadcast_total{{result=\"ok\"}} {}", s.broadcast_ok);
    let _ = writeln!(out, "gxc_adapter_broadcast_total{{result=\"err\"}} {}", s.broadcast_err);

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_counters() {
        count_ok("metrics_test");
        observe_upstream_latency_ms(75, true);
        add_entries_normalized(2);
        let text = render_prometheus();
        assert!(text.contains("gxc_adapter_endpoint_requests_total{endpoint=\"metrics_test\"}"));
        assert!(text.contains("gxc_adapter_node_latency_ms_bucket{le=\"+Inf\"}"));
        assert!(text.contains("# TYPE gxc_adapter_entries_normalized_total counter"));
    }
}
