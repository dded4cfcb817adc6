//! Prometheus text exposition format.
//!
//! Renders a [`MetricsSnapshot`] for scraping by a Prometheus server or for
//! dumping next to a generated topology file.

use std::fmt::Write;

use crate::recorder::MetricsSnapshot;

fn header(out: &mut String, name: &str, help: &str, kind: &str) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} {kind}");
}

fn flag(v: bool) -> u8 {
    u8::from(v)
}

/// Render a snapshot into Prometheus text format.
pub fn render_prometheus(snapshot: &MetricsSnapshot) -> String {
    let mut out = String::new();

    header(
        &mut out,
        "topograph_requests_total",
        "Total number of topology generation requests.",
        "counter",
    );
    for (key, stats) in &snapshot.requests {
        let _ = writeln!(
            out,
            "topograph_requests_total{{provider=\"{}\",engine=\"{}\",status=\"{}\"}} {}",
            key.provider, key.engine, key.status, stats.count
        );
    }

    header(
        &mut out,
        "topograph_request_duration_seconds",
        "Topology generator request duration in seconds.",
        "summary",
    );
    for (key, stats) in &snapshot.requests {
        let labels = format!(
            "provider=\"{}\",engine=\"{}\",status=\"{}\"",
            key.provider, key.engine, key.status
        );
        let _ = writeln!(out, "topograph_request_duration_seconds_sum{{{labels}}} {:.6}", stats.sum_seconds);
        let _ = writeln!(out, "topograph_request_duration_seconds_count{{{labels}}} {}", stats.count);
    }

    header(
        &mut out,
        "topograph_missing_topology",
        "Total number of nodes with missing topology information.",
        "gauge",
    );
    for (provider, count) in &snapshot.missing_topology {
        let _ = writeln!(out, "topograph_missing_topology{{provider=\"{provider}\"}} {count}");
    }

    header(
        &mut out,
        "topograph_blocksize_error_total",
        "Total number of blocksize validation errors.",
        "counter",
    );
    for (kind, count) in &snapshot.blocksize_errors {
        let _ = writeln!(out, "topograph_blocksize_error_total{{type=\"{kind}\"}} {count}");
    }

    header(
        &mut out,
        "topograph_resource_status_not_found",
        "Whether the provider reported no resource status for the instance.",
        "gauge",
    );
    for (instance, missing) in &snapshot.resource_status_not_found {
        let _ = writeln!(
            out,
            "topograph_resource_status_not_found{{instance=\"{instance}\"}} {}",
            flag(*missing)
        );
    }

    header(
        &mut out,
        "topograph_physical_host_not_found",
        "Whether the instance resource status lacked a physical host.",
        "gauge",
    );
    for (instance, missing) in &snapshot.physical_host_not_found {
        let _ = writeln!(
            out,
            "topograph_physical_host_not_found{{instance=\"{instance}\"}} {}",
            flag(*missing)
        );
    }

    header(
        &mut out,
        "topograph_api_latency_seconds",
        "Provider API call latency in seconds.",
        "summary",
    );
    for (call, stats) in &snapshot.api_latency {
        let _ = writeln!(out, "topograph_api_latency_seconds_sum{{call=\"{call}\"}} {:.6}", stats.sum_seconds);
        let _ = writeln!(out, "topograph_api_latency_seconds_count{{call=\"{call}\"}} {}", stats.count);
    }

    out
}
