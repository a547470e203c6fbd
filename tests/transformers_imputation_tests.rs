use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use datafusion::datasource::memory::MemTable;
use datafusion::prelude::*;
use datafusion::scalar::ScalarValue;

use preproc_engine::exceptions::{PreprocError, PreprocResult};
use preproc_engine::transformers::imputation::{
    fill_group_median, ArbitraryValueImputer, DropMissingData, GroupMedianImputer, ModeImputer,
};

/// Creates an in-memory DataFrame with three columns:
///   - "group": Utf8 group keys (one missing).
///   - "value": Float64 with missing values.
///   - "port": Utf8 with a missing value.
async fn create_dataframe() -> DataFrame {
    let schema = Arc::new(Schema::new(vec![
        Field::new("group", DataType::Utf8, true),
        Field::new("value", DataType::Float64, true),
        Field::new("port", DataType::Utf8, true),
    ]));

    let group: ArrayRef = Arc::new(StringArray::from(vec![
        Some("G1"),
        Some("G1"),
        Some("G1"),
        Some("G2"),
        Some("G2"),
        None,
    ]));
    let value: ArrayRef = Arc::new(Float64Array::from(vec![
        Some(1.0),
        Some(3.0),
        None,
        None,
        None,
        None,
    ]));
    let port: ArrayRef = Arc::new(StringArray::from(vec![
        Some("S"),
        Some("C"),
        None,
        Some("S"),
        Some("Q"),
        Some("C"),
    ]));

    let batch = RecordBatch::try_new(schema.clone(), vec![group, value, port]).unwrap();
    let mem_table = MemTable::try_new(schema, vec![vec![batch]]).unwrap();
    let ctx = SessionContext::new_with_config(SessionConfig::new().with_target_partitions(1));
    ctx.register_table("t", Arc::new(mem_table)).unwrap();
    ctx.table("t").await.unwrap()
}

/// Reads every value of a column, in row order.
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

fn floats(values: &[Option<f64>]) -> Vec<ScalarValue> {
    values.iter().map(|v| ScalarValue::Float64(*v)).collect()
}

#[tokio::test]
async fn test_group_median_falls_back_to_overall_median() -> PreprocResult<()> {
    let df = create_dataframe().await;
    let filled = fill_group_median(df, "value", "group").await?;

    // G1 median is 2 (from 1 and 3); G2 and the missing group fall back to the overall median, 2.
    assert_eq!(
        values(&filled, "value").await,
        floats(&[Some(1.0), Some(3.0), Some(2.0), Some(2.0), Some(2.0), Some(2.0)])
    );
    // The group column is untouched.
    assert_eq!(values(&filled, "group").await[5], ScalarValue::Utf8(None));
    Ok(())
}

#[tokio::test]
async fn test_group_median_averages_even_counts() -> PreprocResult<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("title", DataType::Utf8, false),
        Field::new("age", DataType::Float64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(vec!["Mr", "Mr", "Mr", "Miss", "Miss"])),
            Arc::new(Float64Array::from(vec![
                Some(20.0),
                Some(30.0),
                None,
                Some(5.0),
                None,
            ])),
        ],
    )?;
    let ctx = SessionContext::new_with_config(SessionConfig::new().with_target_partitions(1));
    let df = ctx.read_batch(batch)?;

    let mut imputer = GroupMedianImputer::new("age", "title");
    imputer.fit(&df).await?;
    assert_eq!(imputer.overall_median, Some(20.0));
    let filled = imputer.transform(df)?;
    assert_eq!(
        values(&filled, "age").await,
        floats(&[Some(20.0), Some(30.0), Some(25.0), Some(5.0), Some(5.0)])
    );
    Ok(())
}

#[tokio::test]
async fn test_group_median_rejects_text_column() {
    let df = create_dataframe().await;
    let mut imputer = GroupMedianImputer::new("port", "group");
    assert!(matches!(
        imputer.fit(&df).await,
        Err(PreprocError::InvalidData(_))
    ));
}

#[tokio::test]
async fn test_mode_imputation() -> PreprocResult<()> {
    let df = create_dataframe().await;
    let mut imputer = ModeImputer::new(vec!["port".to_string()]);
    imputer.fit(&df).await?;

    // "S" and "C" both appear twice; ties go to the smallest value.
    assert_eq!(imputer.impute_values["port"], ScalarValue::from("C"));
    let filled = imputer.transform(df)?;
    assert_eq!(values(&filled, "port").await[2], ScalarValue::from("C"));
    Ok(())
}

#[tokio::test]
async fn test_mode_of_empty_column_is_an_error() -> PreprocResult<()> {
    let df = create_dataframe().await.filter(col("group").eq(lit("G2")))?;
    let mut imputer = ModeImputer::new(vec!["value".to_string()]);
    assert!(matches!(
        imputer.fit(&df).await,
        Err(PreprocError::InvalidData(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_fixed_value_imputation() -> PreprocResult<()> {
    let df = create_dataframe().await;
    let mut imputer = ArbitraryValueImputer::new(vec!["value".to_string()], 0.0);
    imputer.fit(&df).await?;
    let filled = imputer.transform(df)?;
    assert_eq!(
        values(&filled, "value").await,
        floats(&[Some(1.0), Some(3.0), Some(0.0), Some(0.0), Some(0.0), Some(0.0)])
    );
    Ok(())
}

#[tokio::test]
async fn test_transform_before_fit() {
    let df = create_dataframe().await;
    let imputer = ModeImputer::new(vec!["port".to_string()]);
    assert!(matches!(
        imputer.transform(df),
        Err(PreprocError::FitNotCalled)
    ));
}

#[tokio::test]
async fn test_drop_missing_rows_keeps_order() -> PreprocResult<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("target", DataType::Float64, true),
        Field::new("id", DataType::Utf8, false),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Float64Array::from(vec![Some(1.0), None, Some(3.0)])),
            Arc::new(StringArray::from(vec!["a", "b", "c"])),
        ],
    )?;
    let ctx = SessionContext::new_with_config(SessionConfig::new().with_target_partitions(1));
    let df = ctx.read_batch(batch)?;

    let mut dropper = DropMissingData::with_columns(vec!["target".to_string()]);
    dropper.fit(&df).await?;
    let kept = dropper.transform(df)?;
    assert_eq!(
        values(&kept, "id").await,
        vec![ScalarValue::from("a"), ScalarValue::from("c")]
    );
    Ok(())
}

#[tokio::test]
async fn test_missing_column_is_reported() {
    let df = create_dataframe().await;
    let mut dropper = DropMissingData::with_columns(vec!["nope".to_string()]);
    assert!(matches!(
        dropper.fit(&df).await,
        Err(PreprocError::MissingColumn(_))
    ));
}
