use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pgtable::{Field, Table};

/// A table with one id column followed by `n` value columns, all read from a
/// `Vec<i64>` record.
fn wide_table(n: usize) -> Table<Vec<i64>> {
    let mut builder = Table::builder("wide")
        .schema("bench")
        .field(Field::new("id").id().value(|r: &Vec<i64>| r[0]));
    for i in 1..=n {
        builder = builder.field(Field::new(format!("col{i}")).value(move |r: &Vec<i64>| r[i]));
    }
    match builder.build() {
        Ok(table) => table,
        Err(e) => panic!("bench table is invalid: {e}"),
    }
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("statements/build");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(wide_table(n)));
        });
    }

    group.finish();
}

fn bench_args(c: &mut Criterion) {
    let mut group = c.benchmark_group("statements/args");

    for n in [1, 5, 10, 50, 100] {
        let table = wide_table(n);
        let record: Vec<i64> = (0..=n as i64).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &record, |b, record| {
            b.iter(|| black_box(table.args(record)));
        });
    }

    group.finish();
}

fn bench_additional_fields(c: &mut Criterion) {
    let table = wide_table(20);
    c.bench_function("statements/additional_fields", |b| {
        b.iter(|| black_box(table.additional_fields(Some("w"), "wide_", true)));
    });
}

criterion_group!(benches, bench_build, bench_args, bench_additional_fields);
criterion_main!(benches);
