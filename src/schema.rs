use std::sync::LazyLock;

use regex::Regex;

use crate::error::KvBenchError;

/// One `NAME:TYPE` item at the head of the remaining spec text.
static FIELD_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*([A-Za-z_][A-Za-z0-9_]*)\s*:\s*([A-Za-z]+(?:\s*\(\s*\d+\s*(?:,\s*\d+\s*)?\))?(?:\s+UNSIGNED)?)\s*(,|$)",
    )
    .expect("field spec pattern compiles")
});

/// A column declared through the `fields` property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub sql_type: String,
}

/// Explicit column layout, e.g. `FIELD0:VARCHAR(100),FLAG:BOOLEAN,PRICE:DECIMAL(10,2)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    columns: Vec<ColumnDef>,
}

impl FieldSpec {
    /// # Errors
    /// Returns `KvBenchError::ConfigError` if the spec is empty or any item is malformed.
    pub fn parse(spec: &str) -> Result<Self, KvBenchError> {
        let mut columns = Vec::new();
        let mut rest = spec;

        while !rest.trim().is_empty() {
            let caps = FIELD_ITEM.captures(rest).ok_or_else(|| {
                KvBenchError::ConfigError(format!("malformed field spec near {:?}", rest.trim()))
            })?;
            let name = caps[1].to_string();
            if name.eq_ignore_ascii_case(crate::query_builder::KEY_COLUMN) {
                return Err(KvBenchError::ConfigError(format!(
                    "field spec may not redeclare the key column {name}"
                )));
            }
            if columns
                .iter()
                .any(|c: &ColumnDef| c.name.eq_ignore_ascii_case(&name))
            {
                return Err(KvBenchError::ConfigError(format!(
                    "field {name} declared twice"
                )));
            }
            let sql_type = caps[2].split_whitespace().collect::<Vec<_>>().join(" ");
            columns.push(ColumnDef {
                name,
                sql_type: sql_type.to_ascii_uppercase(),
            });

            let consumed = caps.get(0).map_or(rest.len(), |m| m.end());
            let trailing_comma = &caps[3] == ",";
            rest = &rest[consumed..];
            if trailing_comma && rest.trim().is_empty() {
                return Err(KvBenchError::ConfigError(
                    "field spec ends with a dangling comma".to_string(),
                ));
            }
        }

        if columns.is_empty() {
            return Err(KvBenchError::ConfigError("field spec is empty".to_string()));
        }
        Ok(Self { columns })
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Column definitions rendered as `, NAME TYPE` fragments for `CREATE TABLE`.
    #[must_use]
    pub fn to_sql_fragment(&self) -> String {
        self.columns
            .iter()
            .map(|c| format!(", {} {}", c.name, c.sql_type))
            .collect()
    }
}
