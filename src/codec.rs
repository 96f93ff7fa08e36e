//! Field pairs: the write-path view of a `Values` map.
//!
//! Pairs are ordered by field name so the generated column list, the bound
//! arguments, and therefore the statement-cache key are identical for every
//! call with the same set of fields.

use crate::types::Values;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPair<'a> {
    pub field: &'a str,
    pub value: &'a [u8],
}

#[must_use]
pub fn field_pairs(values: &Values) -> Vec<FieldPair<'_>> {
    let mut pairs: Vec<FieldPair<'_>> = values
        .iter()
        .map(|(field, value)| FieldPair {
            field: field.as_str(),
            value: value.as_slice(),
        })
        .collect();
    pairs.sort_unstable_by(|a, b| a.field.cmp(b.field));
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(items: &[(&str, &str)]) -> Values {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.as_bytes().to_vec()))
            .collect()
    }

    #[test]
    fn pairs_are_sorted_by_field_name() {
        let vals = values(&[("FIELD2", "c"), ("FIELD0", "a"), ("FIELD10", "d"), ("FIELD1", "b")]);
        let fields: Vec<_> = field_pairs(&vals).iter().map(|p| p.field).collect();
        assert_eq!(fields, ["FIELD0", "FIELD1", "FIELD10", "FIELD2"]);
    }

    #[test]
    fn values_stay_attached_to_their_field() {
        let vals = values(&[("b", "two"), ("a", "one")]);
        let pairs = field_pairs(&vals);
        assert_eq!(
            pairs,
            [
                FieldPair {
                    field: "a",
                    value: b"one"
                },
                FieldPair {
                    field: "b",
                    value: b"two"
                },
            ]
        );
    }

    #[test]
    fn empty_map_gives_no_pairs() {
        assert!(field_pairs(&Values::new()).is_empty());
    }
}
