//! Marshalling of driver rows into ordered JSON objects.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde_json::{Map, Number, Value};
use sqlx::any::{AnyRow, AnyTypeInfoKind};
use sqlx::{Column, Row, TypeInfo};

use crate::error::Result;

/// Converts a row into a column-name → value mapping, preserving the
/// driver's reported column order (the JSON map keeps insertion order).
pub fn row_to_object(row: &AnyRow) -> Result<Map<String, Value>> {
    let mut object = Map::new();
    for column in row.columns() {
        let value = decode_column(row, column.ordinal(), column.type_info().kind())?;
        object.insert(column.name().to_string(), value);
    }
    Ok(object)
}

fn decode_column(row: &AnyRow, ordinal: usize, kind: AnyTypeInfoKind) -> Result<Value> {
    let value = match kind {
        AnyTypeInfoKind::Null => Value::Null,
        AnyTypeInfoKind::Bool => row
            .try_get::<Option<bool>, _>(ordinal)?
            .map(Value::Bool)
            .unwrap_or(Value::Null),
        AnyTypeInfoKind::SmallInt => int_value(row.try_get::<Option<i16>, _>(ordinal)?.map(i64::from)),
        AnyTypeInfoKind::Integer => int_value(row.try_get::<Option<i32>, _>(ordinal)?.map(i64::from)),
        AnyTypeInfoKind::BigInt => int_value(row.try_get::<Option<i64>, _>(ordinal)?),
        AnyTypeInfoKind::Real => float_value(row.try_get::<Option<f32>, _>(ordinal)?.map(f64::from)),
        AnyTypeInfoKind::Double => float_value(row.try_get::<Option<f64>, _>(ordinal)?),
        AnyTypeInfoKind::Text => row
            .try_get::<Option<String>, _>(ordinal)?
            .map(Value::String)
            .unwrap_or(Value::Null),
        AnyTypeInfoKind::Blob => row
            .try_get::<Option<Vec<u8>>, _>(ordinal)?
            .map(|bytes| Value::String(BASE64.encode(bytes)))
            .unwrap_or(Value::Null),
        #[allow(unreachable_patterns)]
        _ => row
            .try_get::<Option<String>, _>(ordinal)?
            .map(Value::String)
            .unwrap_or(Value::Null),
    };
    Ok(value)
}

fn int_value(v: Option<i64>) -> Value {
    v.map(|n| Value::Number(Number::from(n))).unwrap_or(Value::Null)
}

fn float_value(v: Option<f64>) -> Value {
    v.and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
