use atlas_toolbox_core::AtlasError;
use atlas_toolbox_core::prelude::*;
use image::{DynamicImage, Rgba, RgbaImage};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn solid(w: u32, h: u32, c: u8) -> DynamicImage {
    let mut img = RgbaImage::new(w, h);
    for p in img.pixels_mut() {
        *p = Rgba([c, c, c, 255]);
    }
    DynamicImage::ImageRgba8(img)
}

fn job(name: &str, sizes: &[(u32, u32)]) -> BatchJob {
    BatchJob {
        name: name.into(),
        sprites: sizes
            .iter()
            .enumerate()
            .map(|(i, &(w, h))| InputSprite {
                key: format!("{name}/{i}"),
                image: solid(w, h, (i * 40 + 20) as u8),
            })
            .collect(),
    }
}

fn cfg() -> PackerConfig {
    PackerConfig::builder().texture_padding(0).trim(false).build()
}

#[test]
fn every_job_is_reported_in_submission_order() {
    let jobs = vec![
        job("alpha", &[(16, 16), (8, 8)]),
        job("beta", &[(24, 12)]),
        job("gamma", &[(10, 10), (10, 10), (10, 10)]),
    ];
    let report = run_batch(jobs, &cfg(), &BatchOptions::default(), &RunContext::new());
    let names: Vec<&str> = report.jobs.iter().map(|j| j.name.as_str()).collect();
    assert_eq!(names, ["alpha", "beta", "gamma"]);
    assert_eq!(report.succeeded(), 3);
    assert_eq!(report.failed(), 0);
    for j in &report.jobs {
        let out = j.result.as_ref().expect("job output");
        assert!(!out.atlas.frames.is_empty());
    }
}

#[test]
fn one_failure_does_not_stop_the_rest() {
    let mut c = cfg();
    c.size = SizePolicy::Manual {
        width: 40,
        height: 40,
    };
    let jobs = vec![
        job("ok0", &[(16, 16)]),
        job("broken", &[(64, 64)]),
        job("ok1", &[(20, 20)]),
    ];
    let report = run_batch(jobs, &c, &BatchOptions::default(), &RunContext::new());
    assert_eq!(report.failed(), 1);
    assert_eq!(report.succeeded(), 2);
    let broken = report.jobs.iter().find(|j| j.name == "broken").unwrap();
    assert!(matches!(
        broken.result,
        Err(AtlasError::InsufficientSpace { .. })
    ));
}

#[test]
fn abort_on_error_skips_queued_jobs() {
    let mut c = cfg();
    c.size = SizePolicy::Manual {
        width: 40,
        height: 40,
    };
    let jobs = vec![
        job("broken", &[(64, 64)]),
        job("later0", &[(16, 16)]),
        job("later1", &[(16, 16)]),
    ];
    let opts = BatchOptions {
        workers: 1,
        abort_on_error: true,
        ..BatchOptions::default()
    };
    let report = run_batch(jobs, &c, &opts, &RunContext::new());
    assert_eq!(report.jobs.len(), 3);
    assert!(report.jobs[0].result.is_err());
    for j in &report.jobs[1..] {
        assert!(matches!(j.result, Err(AtlasError::Cancelled)), "{}", j.name);
    }
}

#[test]
fn pre_cancelled_context_processes_nothing() {
    let ctx = RunContext::new();
    ctx.cancel();
    let jobs = vec![job("a", &[(8, 8)]), job("b", &[(8, 8)])];
    let report = run_batch(jobs, &cfg(), &BatchOptions::default(), &ctx);
    assert_eq!(report.jobs.len(), 2);
    assert!(report
        .jobs
        .iter()
        .all(|j| matches!(j.result, Err(AtlasError::Cancelled))));
}

#[test]
fn memory_throttled_batch_still_completes() {
    // Every job exceeds the limit on its own; solo admission must keep the
    // pool moving instead of deadlocking.
    let jobs = vec![
        job("a", &[(64, 64)]),
        job("b", &[(64, 64)]),
        job("c", &[(64, 64)]),
    ];
    let opts = BatchOptions {
        workers: 2,
        memory_limit_bytes: 1024,
        ..BatchOptions::default()
    };
    let report = run_batch(jobs, &cfg(), &opts, &RunContext::new());
    assert_eq!(report.succeeded(), 3);
}

#[test]
fn progress_counters_see_every_job() {
    let done = Arc::new(AtomicUsize::new(0));
    let started = Arc::new(AtomicUsize::new(0));
    let sink: Arc<dyn ProgressSink> = {
        let done = done.clone();
        let started = started.clone();
        Arc::new(move |ev: ProgressEvent| match ev {
            ProgressEvent::JobStarted { .. } => {
                started.fetch_add(1, Ordering::Relaxed);
            }
            ProgressEvent::JobFinished { .. } => {
                done.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        })
    };
    let ctx = RunContext::with_progress(sink);
    let jobs = vec![
        job("a", &[(8, 8)]),
        job("b", &[(8, 8)]),
        job("c", &[(8, 8)]),
        job("d", &[(8, 8)]),
    ];
    let report = run_batch(jobs, &cfg(), &BatchOptions::default(), &ctx);
    assert_eq!(report.succeeded(), 4);
    assert_eq!(started.load(Ordering::Relaxed), 4);
    assert_eq!(done.load(Ordering::Relaxed), 4);
}
