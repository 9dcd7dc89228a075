use chrono::Utc;
use common::{CartId, UserId, Version};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Cart, CartOwner, Money, Order, Product, line_total};

fn catalog(size: usize) -> Vec<Product> {
    (0..size)
        .map(|i| {
            Product::new(
                format!("SKU-{i:04}"),
                format!("Product {i}"),
                Money::from_cents(199 + i as i64),
            )
        })
        .collect()
}

fn stored_cart() -> Cart {
    let mut cart = Cart::new(CartOwner::User(UserId::generate()));
    cart.mark_saved(CartId::generate(), Version::first());
    cart
}

fn bench_line_total(c: &mut Criterion) {
    let price = Money::from_cents(1999);
    c.bench_function("domain/line_total", |b| {
        b.iter(|| line_total(std::hint::black_box(price), std::hint::black_box(7)).unwrap());
    });
}

fn bench_add_items(c: &mut Criterion) {
    let products = catalog(50);

    c.bench_function("domain/add_50_lines", |b| {
        b.iter(|| {
            let mut cart = stored_cart();
            for product in &products {
                cart.add_item(product, 2).unwrap();
            }
            cart
        });
    });
}

fn bench_merge_same_product(c: &mut Criterion) {
    let product = Product::new("SKU-BENCH", "Benchmark Widget", Money::from_cents(1000));

    c.bench_function("domain/merge_same_product", |b| {
        let mut cart = stored_cart();
        cart.add_item(&product, 1).unwrap();
        b.iter(|| {
            cart.update_quantity(&product.id, 1, Some(&product)).unwrap();
            cart.add_item(&product, 1).unwrap();
        });
    });
}

fn bench_totals_and_snapshot(c: &mut Criterion) {
    let mut cart = stored_cart();
    for product in &catalog(100) {
        cart.add_item(product, 3).unwrap();
    }

    c.bench_function("domain/total_price_100_lines", |b| {
        b.iter(|| std::hint::black_box(&cart).total_price());
    });

    c.bench_function("domain/order_from_cart_100_lines", |b| {
        b.iter(|| Order::from_cart(std::hint::black_box(&cart), Utc::now()).unwrap());
    });
}

criterion_group!(
    benches,
    bench_line_total,
    bench_add_items,
    bench_merge_same_product,
    bench_totals_and_snapshot
);
criterion_main!(benches);
