use mysql_async::Value;

use crate::types::Row;

/// Render any column value as bytes, the way the text protocol would send it.
///
/// NULL becomes an empty value. Dates whose time part is zero render as a bare
/// `YYYY-MM-DD`.
#[must_use]
pub fn value_to_bytes(value: Value) -> Vec<u8> {
    match value {
        Value::NULL => Vec::new(),
        Value::Bytes(bytes) => bytes,
        Value::Int(n) => n.to_string().into_bytes(),
        Value::UInt(n) => n.to_string().into_bytes(),
        Value::Float(f) => f.to_string().into_bytes(),
        Value::Double(d) => d.to_string().into_bytes(),
        Value::Date(year, month, day, hour, min, sec, micro) => {
            let mut out = format!("{year:04}-{month:02}-{day:02}");
            if hour != 0 || min != 0 || sec != 0 || micro != 0 {
                out.push_str(&format!(" {hour:02}:{min:02}:{sec:02}"));
                if micro != 0 {
                    out.push_str(&format!(".{micro:06}"));
                }
            }
            out.into_bytes()
        }
        Value::Time(negative, days, hours, min, sec, micro) => {
            let sign = if negative { "-" } else { "" };
            let hours = days * 24 + u32::from(hours);
            let mut out = format!("{sign}{hours:02}:{min:02}:{sec:02}");
            if micro != 0 {
                out.push_str(&format!(".{micro:06}"));
            }
            out.into_bytes()
        }
    }
}

/// Pair column names with values positionally.
#[must_use]
pub fn decode_values(columns: &[String], values: Vec<Value>) -> Row {
    columns
        .iter()
        .cloned()
        .zip(values.into_iter().map(value_to_bytes))
        .collect()
}

/// Decode a whole result set, reading the column metadata once.
#[must_use]
pub fn decode_rows(rows: Vec<mysql_async::Row>, capacity: usize) -> Vec<Row> {
    let mut decoded = Vec::with_capacity(capacity.min(rows.len()));
    let Some(first) = rows.first() else {
        return decoded;
    };
    let columns = column_names(first);
    for row in rows {
        decoded.push(decode_values(&columns, row.unwrap()));
    }
    decoded
}

fn column_names(row: &mysql_async::Row) -> Vec<String> {
    row.columns_ref()
        .iter()
        .map(|col| col.name_str().into_owned())
        .collect()
}
