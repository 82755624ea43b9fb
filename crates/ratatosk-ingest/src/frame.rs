//! Text-column helpers over polars frames.
//!
//! Record sets hold every column as nullable text; numeric interpretation
//! happens at comparison time.

use std::collections::HashSet;

use polars::prelude::{
    AnyValue, BooleanChunked, Column, DataFrame, IntoColumn, NamedFrom, NewChunkedArray,
    PolarsResult, Series,
};
use ratatosk_common::any_to_text;

/// Reads a column as trimmed text, blanks as `None`.
pub fn text_column(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let column = df.column(name)?;
    let mut values = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        values.push(any_to_text(column.get(idx).unwrap_or(AnyValue::Null)));
    }
    Ok(values)
}

/// Adds or replaces a text column.
pub fn set_text_column(df: &mut DataFrame, name: &str, values: Vec<Option<String>>) -> PolarsResult<()> {
    let series = Series::new(name.into(), values);
    df.with_column(series)?;
    Ok(())
}

pub fn filter_rows(df: &mut DataFrame, keep: &[bool]) -> PolarsResult<()> {
    let mask = BooleanChunked::from_slice("keep".into(), keep);
    *df = df.filter(&mask)?;
    Ok(())
}

/// Builds a frame from named text columns of equal length.
pub fn text_frame(columns: Vec<(String, Vec<Option<String>>)>) -> PolarsResult<DataFrame> {
    let columns: Vec<Column> = columns
        .into_iter()
        .map(|(name, values)| Series::new(name.as_str().into(), values).into_column())
        .collect();
    DataFrame::new(columns)
}

/// Lower-cases column names and converts every column to text.
///
/// When two headers collide after lower-casing, the first one is kept.
pub fn normalize_frame(df: &DataFrame) -> PolarsResult<DataFrame> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for name in df.get_column_names_owned() {
        let lowered = name.as_str().trim().to_lowercase();
        if lowered.is_empty() || !seen.insert(lowered.clone()) {
            continue;
        }
        columns.push((lowered, text_column(df, name.as_str())?));
    }
    text_frame(columns)
}

/// Drops rows whose key columns repeat an earlier row. Returns the number dropped.
pub fn deduplicate<S: AsRef<str>>(df: &mut DataFrame, keys: &[S]) -> PolarsResult<usize> {
    if keys.is_empty() || df.height() == 0 {
        return Ok(0);
    }
    let mut key_columns = Vec::with_capacity(keys.len());
    for key in keys {
        if df.column(key.as_ref()).is_ok() {
            key_columns.push(text_column(df, key.as_ref())?);
        }
    }
    if key_columns.is_empty() {
        return Ok(0);
    }
    let mut seen: HashSet<Vec<Option<String>>> = HashSet::new();
    let mut keep = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let key: Vec<Option<String>> = key_columns.iter().map(|values| values[idx].clone()).collect();
        keep.push(seen.insert(key));
    }
    let dropped = keep.iter().filter(|kept| !**kept).count();
    if dropped > 0 {
        filter_rows(df, &keep)?;
    }
    Ok(dropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        text_frame(vec![
            ("MeContext".to_string(), vec![Some("A".into()), Some("A".into()), Some("B".into())]),
            ("VALUE".to_string(), vec![Some("1".into()), None, Some(" 3 ".into())]),
        ])
        .expect("frame")
    }

    #[test]
    fn normalize_lowercases_and_trims() {
        let normalized = normalize_frame(&frame()).expect("normalize");
        assert_eq!(
            normalized
                .get_column_names()
                .iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>(),
            vec!["mecontext", "value"]
        );
        assert_eq!(
            text_column(&normalized, "value").expect("value"),
            vec![Some("1".to_string()), None, Some("3".to_string())]
        );
    }

    #[test]
    fn deduplicate_keeps_first() {
        let mut df = frame();
        let dropped = deduplicate(&mut df, &["MeContext"]).expect("dedupe");
        assert_eq!(dropped, 1);
        assert_eq!(df.height(), 2);
        assert_eq!(
            text_column(&df, "VALUE").expect("value"),
            vec![Some("1".to_string()), Some("3".to_string())]
        );
    }
}
