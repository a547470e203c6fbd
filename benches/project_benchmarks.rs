use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use datafusion::prelude::{DataFrame, SessionConfig, SessionContext};
use preproc_engine::preprocess::apply_preprocessing;
use preproc_engine::transformers::variable_discretization::EqualFrequencyDiscretizer;
use tokio::runtime::Runtime;

const NAMES: [&str; 4] = [
    "Braund, Mr. Owen Harris",
    "Cumings, Mrs. John Bradley",
    "Heikkinen, Miss. Laina",
    "Palsson, Master. Gosta Leonard",
];

/// Builds a synthetic titanic table with `rows` passengers.
fn titanic_frame(rows: usize) -> DataFrame {
    let schema = Arc::new(Schema::new(vec![
        Field::new("PassengerId", DataType::Int64, false),
        Field::new("Survived", DataType::Int64, false),
        Field::new("Name", DataType::Utf8, false),
        Field::new("Sex", DataType::Utf8, false),
        Field::new("Age", DataType::Float64, true),
        Field::new("SibSp", DataType::Int64, false),
        Field::new("Parch", DataType::Int64, false),
        Field::new("Ticket", DataType::Utf8, false),
        Field::new("Fare", DataType::Float64, false),
        Field::new("Cabin", DataType::Utf8, true),
        Field::new("Embarked", DataType::Utf8, true),
    ]));
    let ids: Vec<i64> = (0..rows as i64).collect();
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(ids.clone())),
        Arc::new(Int64Array::from_iter_values(ids.iter().map(|i| i % 2))),
        Arc::new(StringArray::from_iter_values(
            ids.iter().map(|i| NAMES[*i as usize % NAMES.len()]),
        )),
        Arc::new(StringArray::from_iter_values(
            ids.iter().map(|i| if i % 3 == 0 { "female" } else { "male" }),
        )),
        Arc::new(Float64Array::from_iter(ids.iter().map(|i| {
            if i % 5 == 0 {
                None
            } else {
                Some((i % 70) as f64 + 1.0)
            }
        }))),
        Arc::new(Int64Array::from_iter_values(ids.iter().map(|i| i % 3))),
        Arc::new(Int64Array::from_iter_values(ids.iter().map(|i| i % 2))),
        Arc::new(StringArray::from_iter_values(ids.iter().map(|i| format!("T{}", i)))),
        Arc::new(Float64Array::from_iter_values(
            ids.iter().map(|i| (i % 500) as f64 * 0.73 + 5.0),
        )),
        Arc::new(StringArray::from_iter(ids.iter().map(|i| {
            if i % 4 == 0 {
                Some(format!("C{}", i % 90))
            } else {
                None
            }
        }))),
        Arc::new(StringArray::from_iter(ids.iter().map(|i| match i % 7 {
            0 => None,
            1 | 2 => Some("C"),
            3 => Some("Q"),
            _ => Some("S"),
        }))),
    ];
    let batch = RecordBatch::try_new(schema, columns).expect("valid batch");
    let ctx = SessionContext::new_with_config(SessionConfig::new().with_target_partitions(1));
    ctx.read_batch(batch).expect("readable batch")
}

fn bench_titanic_preprocessing(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("titanic_preprocessing");
    for rows in [1_000usize, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, &rows| {
            b.to_async(&rt).iter(|| async move {
                let output = apply_preprocessing("titanic", titanic_frame(rows), "Survived")
                    .await
                    .expect("preprocessing succeeds");
                output.table.collect().await.expect("collect succeeds")
            });
        });
    }
    group.finish();
}

fn bench_equal_frequency_fit(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");
    let df = titanic_frame(100_000);
    c.bench_function("equal_frequency_fit_100k", |b| {
        b.to_async(&rt).iter(|| async {
            let mut discretizer = EqualFrequencyDiscretizer::new("Fare", "FareBin", 10);
            discretizer.fit(&df).await.expect("fit succeeds");
        });
    });
}

criterion_group!(
    benches,
    bench_titanic_preprocessing,
    bench_equal_frequency_fit
);
criterion_main!(benches);
