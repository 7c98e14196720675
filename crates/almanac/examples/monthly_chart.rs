//! Almanac with a simulation thread and a UI thread.
//!
//! Demonstrates:
//!   1. Starting a session over an enum-backed demo catalog
//!   2. Splitting it into a Recorder (simulation thread) and a Viewer (UI thread)
//!   3. Monthly sampling driven by a fast in-world clock
//!   4. Rendering axis ticks and downsampled curves while sampling continues
//!   5. Saving the history to an archive and loading it into a fresh session
//!
//! Run with:
//!   RUST_LOG=info cargo run --example monthly_chart

use std::sync::Arc;
use std::thread;

use almanac::prelude::*;
use almanac::types::calendar::add_hours;
use almanac_test_utils::{DemoCatalog, DemoCity, DemoMetric};
use chrono::{NaiveDate, NaiveDateTime};
use crossbeam_channel::bounded;

// ─── Clock ──────────────────────────────────────────────────────

const HOURS_PER_STEP: i64 = 6;
const YEARS: i32 = 6;
const STEPS_PER_FRAME: usize = 4 * 30;

fn start_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

// ─── City model ─────────────────────────────────────────────────

fn advance_city(city: &mut DemoCity, step: usize) {
    let t = step as f64;
    city.population = 1000.0 + t * 0.8 + 50.0 * (t / 200.0).sin();
    city.treasury += 3.0 - 0.002 * t;
    city.happiness = (step % 2000 > 150).then_some(60.0 + 20.0 * (t / 500.0).cos());
    city.tourism_enabled = step > 3000;
    if city.tourism_enabled {
        city.tourist_visits = 10.0 * (t - 3000.0).sqrt();
    }
}

// ─── Printing ───────────────────────────────────────────────────

fn print_chart(chart: &RenderOutput, now: NaiveDateTime) {
    let time = chart.time_axis();
    let value = chart.value_axis();
    println!(
        "[{now}] time axis {} .. {} by {:?}; value axis {} .. {} by {}",
        time.start, time.end, time.step, value.start, value.end, value.increment
    );
    let labels: Vec<&str> = chart.value_ticks.iter().map(|t| t.label.as_str()).collect();
    println!("    value labels: {}", labels.join(" "));
    for (series, curve) in chart.series.iter().zip(&chart.curves) {
        println!(
            "    {:?}: {} points, {} runs, {} isolated markers",
            DemoMetric::from_id(series.metric),
            series.points.len(),
            curve.runs.len(),
            curve.markers().count()
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let catalog = Arc::new(DemoCatalog::new(DemoCity::default()));
    let session = Session::start(SessionConfig::default(), catalog.clone())?;
    let (mut recorder, viewer) = session.split();

    // The UI asks for a redraw every simulated month.
    let (frames, redraws) = bounded::<NaiveDateTime>(4);

    let sim = thread::spawn(move || {
        let end = NaiveDate::from_ymd_opt(2000 + YEARS, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        let mut now = start_time();
        let mut step = 0;
        while now < end {
            catalog.update(|city| advance_city(city, step));
            if let Err(e) = recorder.on_tick(now) {
                eprintln!("sample failed at {now}: {e}");
            }
            if step % STEPS_PER_FRAME == 0 && frames.send(now).is_err() {
                break;
            }
            now = add_hours(now, HOURS_PER_STEP);
            step += 1;
        }
        recorder
    });

    let ui = {
        let viewer = viewer.clone();
        thread::spawn(move || {
            let request = RenderRequest::new(
                DisplayRange::All,
                DemoMetric::ALL.iter().map(|m| m.id()),
            );
            let mut last = None;
            for (frame, now) in redraws.iter().enumerate() {
                match viewer.render(&request, now) {
                    Ok(chart) if frame % 12 == 0 => print_chart(&chart, now),
                    Ok(chart) => last = Some((chart, now)),
                    Err(e) => eprintln!("render failed: {e}"),
                }
            }
            if let Some((chart, now)) = last {
                print_chart(&chart, now);
            }
        })
    };

    let _recorder = sim.join().map_err(|_| "simulation thread panicked")?;
    ui.join().map_err(|_| "ui thread panicked")?;
    println!("recorded {} monthly snapshots", viewer.len());

    // Zoom into the last two years.
    let zoom = RenderRequest::new(
        DisplayRange::since_year(2000 + YEARS - 2),
        [DemoMetric::Treasury.id()],
    );
    let chart = viewer.render(&zoom, start_time())?;
    print_chart(&chart, start_time());

    // Round-trip the history through an archive.
    let mut archive = Vec::new();
    let saved = viewer.save(&mut archive)?;
    println!(
        "saved {} snapshots in {} blocks ({} bytes)",
        saved.records,
        saved.blocks,
        archive.len()
    );

    let restored_catalog = Arc::new(DemoCatalog::new(DemoCity::default()));
    let mut restored = Session::start(SessionConfig::default(), restored_catalog)?;
    let report = restored.load(archive.as_slice())?;
    println!(
        "loaded {} snapshots (format v{}, {} skipped, truncated: {})",
        report.loaded, report.version, report.skipped, report.truncated
    );
    restored.end();
    Ok(())
}
