//! Benchmarks for the matching engine.
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//!
//! # Run a specific group
//! cargo bench -- single_match
//! ```
//!
//! Results are saved to `target/criterion/` with HTML reports.

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use lobcore::{Book, Id, Price, Side, Volume};

// ============================================================================
// Helpers - deterministic book population and message generation
// ============================================================================

/// Rests `count` sell orders at ascending price levels starting at
/// `base_price`.
fn populate_asks(book: &mut Book, count: usize, base_price: Price, quantity: Volume) {
    for i in 0..count {
        let id = 1_000_000 + i as Id;
        book.place_order(id, 1, Side::Sell, base_price + i as Price, quantity);
    }
}

/// Rests `count` buy orders at descending price levels starting at
/// `base_price`.
fn populate_bids(book: &mut Book, count: usize, base_price: Price, quantity: Volume) {
    for i in 0..count {
        let id = 2_000_000 + i as Id;
        book.place_order(id, 1, Side::Buy, base_price - i as Price, quantity);
    }
}

/// One simulated message for the throughput benchmark.
#[derive(Clone, Copy)]
struct NewOrder {
    order_id: Id,
    side: Side,
    price: Price,
    volume: Volume,
}

/// Generates a reproducible batch of orders spread around a mid price of
/// 10_000 ticks; roughly half will cross.
fn generate_order_batch(count: usize, seed: u64) -> Vec<NewOrder> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut orders = Vec::with_capacity(count);

    for i in 0..count {
        let side = if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
        let price = rng.gen_range(9_990u32..=10_010);
        let volume = rng.gen_range(1u64..=1_000);
        orders.push(NewOrder {
            order_id: (i + 1) as Id,
            side,
            price,
            volume,
        });
    }

    orders
}

fn replay(book: &mut Book, orders: &[NewOrder]) -> usize {
    let mut trade_count = 0;
    for order in orders {
        trade_count += book
            .place_order(order.order_id, 1, order.side, order.price, order.volume)
            .len();
    }
    trade_count
}

// ============================================================================
// Single-match latency
// ============================================================================

fn bench_single_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_match");
    group.measurement_time(Duration::from_secs(10));

    // Match one order against the best ask of a deep book
    group.bench_function("against_1k_orders", |b| {
        b.iter_batched(
            || {
                let mut book = Book::with_capacity(2_000);
                populate_asks(&mut book, 1_000, 10_000, 100);
                book
            },
            |mut book| {
                black_box(book.place_order(999_999, 2, Side::Buy, 10_000, 100).len())
            },
            BatchSize::SmallInput,
        );
    });

    // Sweep ~10 levels in one call
    group.bench_function("multi_level_sweep", |b| {
        b.iter_batched(
            || {
                let mut book = Book::with_capacity(200);
                populate_asks(&mut book, 100, 10_000, 10);
                book
            },
            |mut book| {
                black_box(book.place_order(999_999, 2, Side::Buy, 10_010, 100).len())
            },
            BatchSize::SmallInput,
        );
    });

    // Order priced below the best ask rests without matching
    group.bench_function("no_match_rest_on_book", |b| {
        b.iter_batched(
            || {
                let mut book = Book::with_capacity(2_000);
                populate_asks(&mut book, 1_000, 10_000, 100);
                book
            },
            |mut book| {
                black_box(book.place_order(999_999, 2, Side::Buy, 9_900, 100).len())
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

// ============================================================================
// Order operations
// ============================================================================

fn bench_order_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("order_operations");
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("place_into_empty_book", |b| {
        b.iter_batched(
            || Book::with_capacity(100),
            |mut book| {
                black_box(book.place_order(1, 1, Side::Buy, 10_000, 100).len())
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("place_into_1k_book", |b| {
        b.iter_batched(
            || {
                let mut book = Book::with_capacity(2_000);
                populate_asks(&mut book, 500, 10_001, 100);
                populate_bids(&mut book, 500, 10_000, 100);
                book
            },
            |mut book| {
                black_box(book.place_order(999_999, 2, Side::Buy, 9_700, 100).len())
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("cancel_order", |b| {
        b.iter_batched(
            || {
                let mut book = Book::with_capacity(2_000);
                populate_bids(&mut book, 1_000, 10_000, 100);
                book
            },
            |mut book| {
                // id in the middle of the populated range
                book.delete_order(2_000_500);
                black_box(book.get_resting_orders_count())
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

// ============================================================================
// Message throughput
// ============================================================================

fn bench_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("throughput");
    group.measurement_time(Duration::from_secs(15));
    group.sample_size(50);

    for batch_size in [1_000usize, 10_000, 50_000] {
        group.throughput(Throughput::Elements(batch_size as u64));
        group.bench_with_input(BenchmarkId::new("orders", batch_size), &batch_size, |b, &size| {
            let orders = generate_order_batch(size, 42);

            b.iter_batched(
                || Book::with_capacity(size * 2),
                |mut book| black_box(replay(&mut book, &orders)),
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

// ============================================================================
// Large book
// ============================================================================

fn bench_large_book(c: &mut Criterion) {
    let mut group = c.benchmark_group("large_book");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(50);

    group.bench_function("match_in_100k_book", |b| {
        // 100k resting orders over 500 price levels per side
        let mut book = Book::with_capacity(120_000);
        for i in 0..50_000usize {
            let id = 1_000_000 + i as Id;
            book.place_order(id, 1, Side::Sell, 100_000 + (i % 500) as Price, 1_000_000_000);
        }
        for i in 0..50_000usize {
            let id = 2_000_000 + i as Id;
            book.place_order(id, 1, Side::Buy, 99_999 - (i % 500) as Price, 1_000_000_000);
        }

        let mut next_id: Id = 10_000_000;
        b.iter(|| {
            next_id += 1;
            // small fill against a huge resting head; the book shape is
            // effectively stable across iterations
            black_box(book.place_order(next_id, 2, Side::Buy, 100_000, 10).len())
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_match,
    bench_order_operations,
    bench_throughput,
    bench_large_book
);

criterion_main!(benches);
