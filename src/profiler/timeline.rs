//! HTML rendering of a memory trace.
//!
//! The page carries a summary table and an inline SVG timeline of live
//! bytes, one bar per sample, colored by growth since the previous sample.

use std::fmt::Write;

use chrono::{TimeZone, Utc};

use crate::profiler::trace::Trace;

const WIDTH: f64 = 1200.0;
const HEIGHT: f64 = 400.0;

pub fn render_html(trace: &Trace) -> String {
    let started = Utc
        .timestamp_millis_opt(trace.header.started_at_ms as i64)
        .single()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "unknown".to_string());

    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Memory profile</title>\n\
         <style>body{{font-family:sans-serif;margin:2em}}td{{padding:2px 12px}}\
         rect:hover{{opacity:0.6}}</style>\n</head>\n<body>\n\
         <h1>Memory profile</h1>\n<table>\n"
    );
    for (label, value) in [
        ("Started", started),
        ("Duration", format!("{} ms", trace.duration_ms())),
        ("Samples", trace.samples.len().to_string()),
        ("Peak memory", format_bytes(trace.peak_bytes())),
        ("Retained since start", format_signed_bytes(trace.retained_bytes())),
        (
            "Mode",
            if trace.header.leaks { "leaks" } else { "allocations" }.to_string(),
        ),
    ] {
        let _ = writeln!(html, "<tr><td>{}</td><td>{}</td></tr>", label, value);
    }
    html.push_str("</table>\n");
    html.push_str(&render_svg(trace));
    html.push_str("</body>\n</html>\n");
    html
}

fn render_svg(trace: &Trace) -> String {
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
        w = WIDTH,
        h = HEIGHT
    );

    let max = trace.peak_bytes().max(1) as f64;
    let count = trace.samples.len().max(1) as f64;
    let bar_width = WIDTH / count;
    let mut previous = 0u64;

    for (i, sample) in trace.samples.iter().enumerate() {
        let height = sample.current_bytes as f64 / max * HEIGHT;
        let color = if sample.current_bytes > previous {
            "#e8590c"
        } else {
            "#f2a65a"
        };
        let _ = writeln!(
            svg,
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\">\
             <title>{} ms: {}</title></rect>",
            i as f64 * bar_width,
            HEIGHT - height,
            bar_width,
            height,
            color,
            sample.elapsed_ms,
            format_bytes(sample.current_bytes)
        );
        previous = sample.current_bytes;
    }

    svg.push_str("</svg>\n");
    svg
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

fn format_signed_bytes(bytes: i64) -> String {
    if bytes < 0 {
        format!("-{}", format_bytes(bytes.unsigned_abs()))
    } else {
        format_bytes(bytes as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiler::trace::{TraceHeader, TraceSample, VERSION};

    #[test]
    fn formats_sizes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KiB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MiB");
        assert_eq!(format_signed_bytes(-2048), "-2.00 KiB");
    }

    #[test]
    fn renders_one_bar_per_sample() {
        let trace = Trace {
            header: TraceHeader {
                version: VERSION,
                leaks: false,
                started_at_ms: 0,
            },
            samples: (0..3)
                .map(|i| TraceSample {
                    elapsed_ms: i * 100,
                    current_bytes: i * 1024,
                    peak_bytes: i * 1024,
                    allocations: i,
                    deallocations: 0,
                })
                .collect(),
        };

        let html = render_html(&trace);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert_eq!(html.matches("<rect").count(), 3);
        assert!(html.contains("2.00 KiB"));
    }
}
