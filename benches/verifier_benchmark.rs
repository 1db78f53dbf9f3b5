use criterion::{Criterion, black_box, criterion_group, criterion_main};
use std::time::Duration;

use library_acceptance::driver::{MockDriver, MockElement, MockPage, Strategy};
use library_acceptance::library::locators;
use library_acceptance::locator;
use library_acceptance::verify::{self, Indicator};

fn benchmark_verifier(c: &mut Criterion) {
    let indicators: Vec<Indicator> = (0..32)
        .map(|i| Indicator::new(format!("indicator_{}", i), 1.0 + (i % 3) as f64, i % 2 == 0))
        .collect();

    c.bench_function("verdict_32_indicators", |b| {
        b.iter(|| verify::evaluate(black_box(&indicators), black_box(20.0)))
    });
}

fn benchmark_resolution(c: &mut Criterion) {
    // Only the last candidate matches, so every candidate gets a lookup
    let page = MockPage::new("http://library.test/")
        .with_element(MockElement::new("search").matching(Strategy::css("input[placeholder*=\"Search\"]")));
    let mut driver = MockDriver::new(page);
    let spec = locators::search_input();

    c.bench_function("resolve_last_candidate", |b| {
        b.iter(|| {
            let handle = locator::resolve_within(
                black_box(&spec),
                &mut driver,
                Duration::ZERO,
                Duration::ZERO,
            );
            assert!(handle.is_ok());
        })
    });
}

criterion_group!(benches, benchmark_verifier, benchmark_resolution);
criterion_main!(benches);
