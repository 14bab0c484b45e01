//! Benchmark for reading-order reconstruction.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use labelcheck::{reading_order, LayoutOptions, Token};

/// Synthetic token cloud: `rows x cols` words scattered out of order.
fn token_grid(rows: usize, cols: usize) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            let left = 40.0 + col as f32 * 90.0;
            let top = 30.0 + row as f32 * 42.0;
            tokens.push(Token::from_rect(
                format!("w{row}x{col}"),
                0.9,
                left,
                top,
                left + 70.0,
                top + 24.0,
            ));
        }
    }
    // Reverse so the input is far from reading order.
    tokens.reverse();
    tokens
}

fn bench_reading_order(c: &mut Criterion) {
    let options = LayoutOptions::default();

    let small = token_grid(10, 6);
    c.bench_function("reading_order_60_tokens", |b| {
        b.iter(|| reading_order(black_box(&small), 800.0, 600.0, &options))
    });

    let large = token_grid(40, 10);
    c.bench_function("reading_order_400_tokens", |b| {
        b.iter(|| reading_order(black_box(&large), 1000.0, 1800.0, &options))
    });
}

criterion_group!(benches, bench_reading_order);
criterion_main!(benches);
