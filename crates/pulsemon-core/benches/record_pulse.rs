//! Hot-path benchmarks: the telemetry core runs inside a fixed-rate loop,
//! so per-pulse recording and section enter/exit must stay cheap at every
//! monitoring level.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pulsemon_core::{MonitorConfig, MonitorLevel, ProfRegistry, PulseMonitor};

fn monitor_at(level: MonitorLevel) -> PulseMonitor {
    let config = MonitorConfig::builder()
        .pulses_per_second(10)
        .level(level)
        .dynamic(false)
        .build();
    PulseMonitor::new(&config).expect("valid bench config")
}

fn bench_record_pulse(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_pulse");

    for level in [
        MonitorLevel::Off,
        MonitorLevel::OverBudgetOnly,
        MonitorLevel::Sampled,
        MonitorLevel::Full,
    ] {
        let mut monitor = monitor_at(level);
        let mut value = 0.0f64;
        group.bench_function(level.as_str(), |b| {
            b.iter(|| {
                value = (value + 7.3) % 400.0;
                monitor.record_pulse(black_box(value));
            });
        });
    }

    group.finish();
}

fn bench_profiling(c: &mut Criterion) {
    let config = MonitorConfig::default();
    let mut registry = ProfRegistry::new(&config);
    let handle = registry.get_or_create("bench").expect("non-empty id");

    c.bench_function("section_enter_exit", |b| {
        b.iter(|| {
            registry.enter(black_box(handle));
            registry.exit(black_box(handle));
        });
    });

    c.bench_function("registry_reset_64_sections", |b| {
        let mut registry = ProfRegistry::new(&config);
        for i in 0..64 {
            let handle = registry.get_or_create(&format!("section-{i}")).unwrap();
            registry.enter(handle);
            registry.exit(handle);
        }
        b.iter(|| registry.reset_all_pulse());
    });
}

fn bench_report(c: &mut Criterion) {
    let mut monitor = monitor_at(MonitorLevel::Full);
    for i in 0..3600 {
        monitor.record_pulse(f64::from(i % 250));
    }
    let mut buf = [0u8; 8192];
    c.bench_function("render_pulse_history_report", |b| {
        b.iter(|| black_box(monitor.recorder().render_report(&mut buf)));
    });
}

criterion_group!(benches, bench_record_pulse, bench_profiling, bench_report);
criterion_main!(benches);
