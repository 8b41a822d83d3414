use common::Money;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use domain::fraud::{HistorySnapshot, LineProfile, OrderProfile, evaluate};

fn bench_evaluate(c: &mut Criterion) {
    let order = OrderProfile {
        total: Some(Money::from_cents(250_000)),
        lines: (0..20)
            .map(|i| LineProfile {
                product_name: format!("Product {i}"),
                quantity: (i % 6) as u32,
                unit_price: Money::from_cents(5_000 + i * 2_500),
            })
            .collect(),
        shipping_address: "1 Main St".to_string(),
    };
    let history = HistorySnapshot {
        total_orders: 0,
        total_spent: Money::zero(),
    };

    c.bench_function("fraud_evaluate_20_lines", |b| {
        b.iter(|| evaluate(black_box(&order), black_box(&history)))
    });
}

criterion_group!(benches, bench_evaluate);
criterion_main!(benches);
