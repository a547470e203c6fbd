use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use datafusion::prelude::*;
use datafusion::scalar::ScalarValue;

use preproc_engine::exceptions::{PreprocError, PreprocResult};
use preproc_engine::transformers::variable_discretization::{
    ArbitraryDiscretizer, EqualFrequencyDiscretizer,
};

fn create_df(values: Vec<Option<f64>>) -> DataFrame {
    let labels: Vec<String> = (0..values.len()).map(|i| format!("r{}", i)).collect();
    let schema = Arc::new(Schema::new(vec![
        Field::new("x", DataType::Float64, true),
        Field::new("label", DataType::Utf8, false),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Float64Array::from(values)),
            Arc::new(StringArray::from(labels)),
        ],
    )
    .unwrap();
    let ctx = SessionContext::new_with_config(SessionConfig::new().with_target_partitions(1));
    ctx.read_batch(batch).unwrap()
}

async fn values(df: &DataFrame, name: &str) -> Vec<ScalarValue> {
    let batches = df.clone().collect().await.unwrap();
    let mut out = Vec::new();
    for batch in &batches {
        let idx = batch.schema().index_of(name).unwrap();
        for i in 0..batch.num_rows() {
            out.push(ScalarValue::try_from_array(batch.column(idx), i).unwrap());
        }
    }
    out
}

#[tokio::test]
async fn test_equal_frequency_bins_are_balanced() -> PreprocResult<()> {
    let df = create_df((1..=100).map(|v| Some(v as f64)).collect());
    let mut discretizer = EqualFrequencyDiscretizer::new("x", "xBin", 4);
    discretizer.fit(&df).await?;
    approx::assert_relative_eq!(discretizer.edges[1], 25.75);

    let binned = discretizer.transform(df)?;
    let mut counts: HashMap<ScalarValue, usize> = HashMap::new();
    for v in values(&binned, "xBin").await {
        *counts.entry(v).or_default() += 1;
    }
    assert_eq!(counts.len(), 4);
    for label in 0..4_i64 {
        let count = counts[&ScalarValue::Int64(Some(label))];
        assert!((24..=26).contains(&count), "bin {} has {} values", label, count);
    }
    Ok(())
}

#[tokio::test]
async fn test_equal_frequency_rejects_duplicate_edges() {
    let df = create_df(vec![Some(1.0); 10]);
    let mut discretizer = EqualFrequencyDiscretizer::new("x", "xBin", 4);
    assert!(matches!(
        discretizer.fit(&df).await,
        Err(PreprocError::InvalidData(_))
    ));
}

#[tokio::test]
async fn test_arbitrary_bins_include_lowest_edge() -> PreprocResult<()> {
    let df = create_df(vec![Some(0.0), Some(5.0), Some(10.0), Some(15.0), Some(20.0)]);
    let mut discretizer =
        ArbitraryDiscretizer::new("x", "xBin", vec![0.0, 10.0, f64::INFINITY], vec![0, 1]);
    discretizer.fit(&df).await?;
    let binned = discretizer.transform(df)?;

    // Right-closed bins: 10 belongs to the first bin.
    let expected: Vec<ScalarValue> = [0, 0, 0, 1, 1]
        .iter()
        .map(|v| ScalarValue::Int64(Some(*v)))
        .collect();
    assert_eq!(values(&binned, "xBin").await, expected);
    // The source column is kept by the discretizer itself.
    assert_eq!(binned.schema().fields().len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_values_outside_edges_are_rejected() {
    let df = create_df(vec![Some(-1.0), Some(5.0)]);
    let mut discretizer = ArbitraryDiscretizer::new("x", "xBin", vec![0.0, 10.0], vec![0]);
    assert!(matches!(
        discretizer.fit(&df).await,
        Err(PreprocError::InvalidData(_))
    ));
}

#[tokio::test]
async fn test_missing_values_cannot_be_binned() {
    let with_gap = vec![Some(1.0), None, Some(3.0), Some(4.0), Some(5.0)];

    let mut quantiles = EqualFrequencyDiscretizer::new("x", "xBin", 2);
    assert!(matches!(
        quantiles.fit(&create_df(with_gap.clone())).await,
        Err(PreprocError::InvalidData(_))
    ));

    let mut edges = ArbitraryDiscretizer::new("x", "xBin", vec![0.0, 3.0, 10.0], vec![0, 1]);
    assert!(matches!(
        edges.fit(&create_df(with_gap)).await,
        Err(PreprocError::InvalidData(_))
    ));
}

#[tokio::test]
async fn test_mismatched_labels_are_rejected() {
    let df = create_df(vec![Some(1.0)]);
    let mut discretizer = ArbitraryDiscretizer::new("x", "xBin", vec![0.0, 10.0, 20.0], vec![0]);
    assert!(matches!(
        discretizer.fit(&df).await,
        Err(PreprocError::InvalidParameter(_))
    ));
}

#[tokio::test]
async fn test_binning_a_text_column_is_a_data_error() {
    let df = create_df(vec![Some(1.0)]);
    let mut discretizer = EqualFrequencyDiscretizer::new("label", "labelBin", 2);
    assert!(matches!(
        discretizer.fit(&df).await,
        Err(PreprocError::InvalidData(_))
    ));
}
