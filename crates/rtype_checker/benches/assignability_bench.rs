//! Benchmark harness for value checks.
//!
//! Run with: cargo bench -p rtype_checker

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rtype_checker::{Checker, Mutability, TypeId, Value};

/// `{ name: string; phone: number } | { name: string; email: string }` and the
/// record `{ owner: string; contacts: Contact[] }`.
fn contact_book(checker: &mut Checker) -> (TypeId, TypeId) {
    let str_ = checker.type_table.string_type;
    let number = checker.type_table.number_type;
    let phone = checker.type_table.record_of(&[("name", str_, false), ("phone", number, false)]);
    let email = checker.type_table.record_of(&[("name", str_, false), ("email", str_, false)]);
    let contact = checker.type_table.union([phone, email]);
    let contacts = checker.type_table.array(contact);
    let book = checker.type_table.record_of(&[("owner", str_, false), ("contacts", contacts, false)]);
    (contact, book)
}

fn make_book(size: usize) -> Value {
    let contacts = (0..size).map(|i| {
        if i % 2 == 0 {
            Value::record([("name", Value::from(format!("c{}", i))), ("phone", Value::from(i as f64))])
        } else {
            Value::record([("name", Value::from(format!("c{}", i))), ("email", Value::from("x@example.com"))])
        }
    });
    Value::record([("owner", Value::from("Mike")), ("contacts", Value::array(contacts))])
}

// ============================================================================
// Value Check Benchmarks
// ============================================================================

fn bench_check_assignable(c: &mut Criterion) {
    let mut group = c.benchmark_group("check_assignable");

    let mut checker = Checker::new();
    let number = checker.type_table.number_type;
    let pair = checker.type_table.tuple(vec![number, number]);
    let (_, book) = contact_book(&mut checker);

    group.bench_function("primitive", |b| {
        let value = Value::from(42);
        b.iter(|| checker.check_assignable(black_box(&value), number))
    });

    group.bench_function("tuple_length_mismatch", |b| {
        let value = Value::array([Value::from(1), Value::from(2), Value::from(3)]);
        b.iter(|| checker.check_assignable(black_box(&value), pair))
    });

    group.bench_function("contact_book", |b| {
        let value = make_book(16);
        b.iter(|| checker.check_assignable(black_box(&value), book))
    });

    group.finish();
}

// ============================================================================
// Inference Benchmarks
// ============================================================================

fn bench_infer(c: &mut Criterion) {
    let mut group = c.benchmark_group("infer_type");
    let value = make_book(16);

    group.bench_function("contact_book", |b| {
        b.iter(|| {
            let mut checker = Checker::new();
            checker.infer_type(black_box(&value), Mutability::Immutable)
        })
    });

    group.finish();
}

// ============================================================================
// Scaling Benchmarks
// ============================================================================

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scaling");

    let mut checker = Checker::new();
    let (_, book) = contact_book(&mut checker);

    for size in [10, 100, 1000] {
        let value = make_book(size);
        group.bench_with_input(BenchmarkId::new("contacts", size), &value, |b, value| {
            b.iter(|| checker.check_assignable(black_box(value), book))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_check_assignable, bench_infer, bench_scaling);
criterion_main!(benches);
