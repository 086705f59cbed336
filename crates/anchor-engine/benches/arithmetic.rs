use std::hint::black_box;

use anchor_engine::{stops, AnchoredInstant, Granularity, RecurrenceSpec, ShiftUnit};
use chrono::{NaiveDate, Weekday};
use criterion::{criterion_group, criterion_main, Criterion};

fn criterion_benchmark(c: &mut Criterion) {
    let reading = NaiveDate::from_ymd_opt(2026, 3, 7)
        .unwrap()
        .and_hms_micro_opt(9, 30, 0, 148540)
        .unwrap();
    let value = AnchoredInstant::anchor(reading, "America/New_York").unwrap();

    c.bench_function("anchor named zone", |b| {
        b.iter(|| AnchoredInstant::anchor(black_box(reading), "America/New_York"))
    });

    c.bench_function("shift next day across dst", |b| {
        b.iter(|| black_box(value).next(ShiftUnit::Day))
    });

    c.bench_function("shift next friday x4", |b| {
        b.iter(|| {
            black_box(value).shift(
                anchor_engine::Direction::Next,
                ShiftUnit::Weekday(Weekday::Fri),
                4,
            )
        })
    });

    c.bench_function("truncate month", |b| {
        b.iter(|| black_box(value).truncate(Granularity::Month))
    });

    c.bench_function("shift zone", |b| {
        b.iter(|| black_box(value).shift_zone("Asia/Tokyo"))
    });

    c.bench_function("stops daily x365", |b| {
        let spec = RecurrenceSpec::daily()
            .count(365)
            .start(reading)
            .zone("America/New_York");
        b.iter(|| {
            let stops = stops(black_box(&spec)).unwrap();
            stops.iter().count()
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
