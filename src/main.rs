//! Order book simulation harness.
//!
//! Generates a reproducible stream of NEW/CANCEL messages, feeds it to a
//! [`Book`] and reports latency/throughput metrics. The stream mixes
//! passive orders spread over a price band with aggressive orders priced
//! around the current mid so a configurable share of them match.
//!
//! ```bash
//! cargo run --release -- --messages 10000000
//! RUST_LOG=info cargo run --release -- --messages 1000000 --cancel-rate 0.2
//! ```

use std::time::Instant;

use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use lobcore::types::price::from_ticks;
use lobcore::{Book, Id, Price, Side, Volume};

#[derive(Parser)]
#[clap(name = "lobcore-sim")]
#[clap(about = "Limit order book simulation and benchmarking harness")]
struct Cli {
    /// Total number of messages to generate
    #[clap(long, default_value_t = 10_000_000)]
    messages: usize,

    /// Fraction of messages that are cancels
    #[clap(long, default_value_t = 0.10)]
    cancel_rate: f64,

    /// Fraction of new orders priced to cross the book
    #[clap(long, default_value_t = 0.40)]
    match_rate: f64,

    /// Lower edge of the passive price band (ticks)
    #[clap(long, default_value_t = 9_990)]
    price_min: Price,

    /// Upper edge of the passive price band (ticks)
    #[clap(long, default_value_t = 10_010)]
    price_max: Price,

    /// Minimum order volume
    #[clap(long, default_value_t = 1)]
    min_volume: Volume,

    /// Maximum order volume
    #[clap(long, default_value_t = 1_000)]
    max_volume: Volume,

    /// Number of distinct agent ids
    #[clap(long, default_value_t = 1_000)]
    agents: u64,

    /// RNG seed (same seed, same stream)
    #[clap(long, default_value_t = 42)]
    seed: u64,

    /// Initial order capacity of the book
    #[clap(long, default_value_t = 100_000)]
    capacity: usize,

    /// Messages replayed against a throwaway book before measuring
    #[clap(long, default_value_t = 10_000)]
    warmup: usize,
}

enum Message {
    New {
        order_id: Id,
        agent_id: Id,
        side: Side,
        price: Price,
        volume: Volume,
    },
    Cancel {
        order_id: Id,
    },
}

fn generate_messages(cli: &Cli) -> Vec<Message> {
    let mut rng = ChaCha8Rng::seed_from_u64(cli.seed);
    let mut messages = Vec::with_capacity(cli.messages);
    let mut active_orders: Vec<Id> = Vec::new();
    let mut next_order_id: Id = 1;
    let mut current_mid = (cli.price_min + cli.price_max) / 2;

    for i in 0..cli.messages {
        if !active_orders.is_empty() && rng.gen_bool(cli.cancel_rate) {
            // cancel a random live order, swap-remove for O(1)
            let index = rng.gen_range(0..active_orders.len());
            let order_id = active_orders.swap_remove(index);
            messages.push(Message::Cancel { order_id });
            continue;
        }

        let side = if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
        let price = if rng.gen_bool(cli.match_rate) {
            // aggressive: straddle the mid so it is likely to cross
            let offset = rng.gen_range(-5i64..=5);
            let raw = match side {
                Side::Buy => i64::from(current_mid) + offset,
                Side::Sell => i64::from(current_mid) - offset,
            };
            raw.max(1) as Price
        } else {
            rng.gen_range(cli.price_min..=cli.price_max)
        };
        let volume = rng.gen_range(cli.min_volume..=cli.max_volume);
        let agent_id = rng.gen_range(1..=cli.agents);

        messages.push(Message::New {
            order_id: next_order_id,
            agent_id,
            side,
            price,
            volume,
        });
        active_orders.push(next_order_id);
        next_order_id += 1;

        if i % 1_000 == 0 {
            current_mid = rng.gen_range(cli.price_min..=cli.price_max);
        }
    }

    messages
}

#[derive(Default)]
struct Metrics {
    messages_processed: usize,
    orders_placed: usize,
    orders_cancelled: usize,
    trades_generated: usize,
    total_time_secs: f64,
    peak_resting_orders: usize,
    final_resting_orders: usize,
    peak_levels: usize,
    final_levels: usize,
}

fn apply(book: &mut Book, message: &Message) -> usize {
    match message {
        Message::New {
            order_id,
            agent_id,
            side,
            price,
            volume,
        } => book.place_order(*order_id, *agent_id, *side, *price, *volume).len(),
        Message::Cancel { order_id } => {
            book.delete_order(*order_id);
            0
        }
    }
}

fn run_simulation(cli: &Cli, messages: &[Message]) -> Metrics {
    // warmup on a throwaway book so the measured run starts hot
    let warmup_count = cli.warmup.min(messages.len());
    let mut warmup_book = Book::with_capacity(cli.capacity);
    for message in &messages[..warmup_count] {
        apply(&mut warmup_book, message);
    }

    let mut book = Book::with_capacity(cli.capacity);
    let mut metrics = Metrics::default();

    let start = Instant::now();
    for message in messages {
        let trades = apply(&mut book, message);
        metrics.trades_generated += trades;
        match message {
            Message::New { .. } => metrics.orders_placed += 1,
            Message::Cancel { .. } => metrics.orders_cancelled += 1,
        }
        metrics.messages_processed += 1;

        let resting = book.get_resting_orders_count();
        if resting > metrics.peak_resting_orders {
            metrics.peak_resting_orders = resting;
        }
        let levels = book.get_buy_levels_count() + book.get_sell_levels_count();
        if levels > metrics.peak_levels {
            metrics.peak_levels = levels;
        }

        if metrics.messages_processed % 10_000_000 == 0 {
            info!(
                processed = metrics.messages_processed,
                total = messages.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "progress"
            );
        }
    }
    metrics.total_time_secs = start.elapsed().as_secs_f64();

    metrics.final_resting_orders = book.get_resting_orders_count();
    metrics.final_levels = book.get_buy_levels_count() + book.get_sell_levels_count();

    info!(
        best_bid = %from_ticks(book.get_best_buy()),
        best_ask = %from_ticks(book.get_best_sell()),
        mid = book.get_mid_price() / f64::from(lobcore::types::price::TICKS_PER_UNIT),
        "final top of book"
    );

    metrics
}

fn print_report(cli: &Cli, metrics: &Metrics) {
    let avg_latency_ns = metrics.total_time_secs * 1e9 / metrics.messages_processed as f64;
    let ops_per_sec = metrics.messages_processed as f64 / metrics.total_time_secs;
    let trades_per_sec = metrics.trades_generated as f64 / metrics.total_time_secs;

    println!("{}", "=".repeat(72));
    println!("ORDER BOOK SIMULATION");
    println!("{}", "=".repeat(72));
    println!();
    println!("--- Parameters ---");
    println!("  Messages:             {:>14}", cli.messages);
    println!("  Cancel rate:          {:>13.1}%", cli.cancel_rate * 100.0);
    println!("  Match rate:           {:>13.1}%", cli.match_rate * 100.0);
    println!("  Price band:           {:>8} - {}", cli.price_min, cli.price_max);
    println!("  Volume range:         {:>8} - {}", cli.min_volume, cli.max_volume);
    println!("  Agents:               {:>14}", cli.agents);
    println!("  Seed:                 {:>14}", cli.seed);
    println!();
    println!("--- Performance ---");
    println!("  Total time:           {:>12.2} s", metrics.total_time_secs);
    println!("  Avg latency:          {:>12.1} ns/message", avg_latency_ns);
    println!("  Throughput:           {:>12.2} M msgs/s", ops_per_sec / 1e6);
    println!("  Trade rate:           {:>12.2} M trades/s", trades_per_sec / 1e6);
    println!();
    println!("--- Activity ---");
    println!("  Orders placed:        {:>14}", metrics.orders_placed);
    println!("  Orders cancelled:     {:>14}", metrics.orders_cancelled);
    println!("  Trades generated:     {:>14}", metrics.trades_generated);
    println!();
    println!("--- Book state ---");
    println!("  Peak resting orders:  {:>14}", metrics.peak_resting_orders);
    println!("  Final resting orders: {:>14}", metrics.final_resting_orders);
    println!("  Peak price levels:    {:>14}", metrics.peak_levels);
    println!("  Final price levels:   {:>14}", metrics.final_levels);
    println!("{}", "=".repeat(72));
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();

    info!(messages = cli.messages, seed = cli.seed, "generating message stream");
    let messages = generate_messages(&cli);

    info!(warmup = cli.warmup, capacity = cli.capacity, "starting simulation");
    let metrics = run_simulation(&cli, &messages);

    print_report(&cli, &metrics);
}
