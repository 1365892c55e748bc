//! Example: Driving chart hooks from a channel
//!
//! This example demonstrates how to embed checkview in your own
//! application by pushing page snapshots through a channel and letting
//! the hooks follow them, without a terminal.
//!
//! This is useful when you want to:
//! - Bridge pages from a websocket or message queue
//! - Generate synthetic check results for testing
//! - Inspect the chart specs a page resolves to
//!
//! # Usage
//!
//! ```bash
//! cargo run --example channel_source
//! ```

use std::collections::BTreeMap;
use std::thread;
use std::time::{Duration, Instant};

use checkview::source::MountSnapshot;
use checkview::{App, ChannelSource, HookKind, HookOptions, MountId, PageSnapshot, Theme};
use ratatui::layout::Rect;

fn synthetic_page(round: u64) -> PageSnapshot {
    let labels: Vec<String> = (0..8).map(|i| format!("09:{:02}", (round + i) % 60)).collect();
    let values: Vec<f64> = (0..8).map(|i| 100.0 + ((round + i) % 5) as f64 * 12.5).collect();
    let success: Vec<u8> = (0..8).map(|i| u8::from((round + i) % 7 != 0)).collect();

    let mut attrs = BTreeMap::new();
    attrs.insert("labels".to_string(), serde_json::to_string(&labels).unwrap());
    attrs.insert("values".to_string(), serde_json::to_string(&values).unwrap());
    attrs.insert("success".to_string(), serde_json::to_string(&success).unwrap());
    attrs.insert("average".to_string(), "125".to_string());
    attrs.insert("alertThreshold".to_string(), r#"{"upper":150,"lower":100}"#.to_string());
    attrs.insert("alertType".to_string(), "anomaly".to_string());

    PageSnapshot {
        mounts: vec![
            MountSnapshot {
                id: "latency".into(),
                hook: HookKind::CheckChart,
                attrs,
            },
            MountSnapshot {
                id: "query-editor".into(),
                hook: HookKind::SqlEditor,
                attrs: BTreeMap::new(),
            },
        ],
        fields: BTreeMap::from([("query-input".to_string(), "SELECT 1".to_string())]),
        scripts: BTreeMap::new(),
    }
}

fn main() {
    println!("Channel source example");
    println!("Generating synthetic check results...\n");

    // Create a channel source - this returns both a sender and the source
    let (tx, source) = ChannelSource::create("synthetic-page");

    // Spawn a thread to publish a new page every second
    thread::spawn(move || {
        let mut round = 0u64;
        loop {
            if tx.send(synthetic_page(round)).is_err() {
                break; // Receiver dropped
            }
            round += 1;
            thread::sleep(Duration::from_secs(1));
        }
    });

    let mut app = App::new(Box::new(source), HookOptions::default(), Theme::dark());
    let content = Rect::new(0, 0, 100, 30);
    let latency = MountId::from("latency");

    println!("Receiving pages (press Ctrl+C to stop):\n");

    loop {
        let now = Instant::now();
        if let Ok(true) = app.reload_data(now) {
            println!("Page updated, {} mount points", app.mounts().len());
        }
        app.layout(content);
        app.tick(Instant::now());

        if let Some(chart) = app.registry.chart(&latency) {
            if let Some(spec) = app.registry.renderer().spec_for(&latency) {
                let series: Vec<&str> = spec.series.iter().map(|s| s.label.as_str()).collect();
                println!(
                    "  {} [{:?}] renders={} series={:?}",
                    latency,
                    chart.state(),
                    chart.renders(),
                    series
                );
            }
        }

        thread::sleep(Duration::from_millis(250));
    }
}
