use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::json;
use std::hint::black_box;
use strata_core::{Filter, ListParams, SortDirection};

fn bench_params() -> ListParams {
    ListParams::new()
        .with_page(7)
        .with_per_page(25)
        .with_order_by("created_at")
        .with_order_direction(SortDirection::Asc)
        .with_search("alice")
        .with_filter(
            Filter::new()
                .with("active", json!(true))
                .with("role", json!("admin"))
                .with("profile", json!({"zip": "10115", "city": "Berlin"})),
        )
}

fn bench_list_key_fragment(c: &mut Criterion) {
    let params = bench_params();

    c.bench_function("params/cache_fragment", |b| {
        b.iter(|| {
            let normalized = black_box(&params).normalize("id");
            black_box(normalized.cache_fragment());
        });
    });
}

criterion_group!(benches, bench_list_key_fragment);
criterion_main!(benches);
