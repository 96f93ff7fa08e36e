mod row;

pub use row::{decode_rows, decode_values, value_to_bytes};
