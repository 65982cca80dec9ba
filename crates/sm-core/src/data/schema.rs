//! Column type information and table schemas

use std::fmt;

use serde::{Deserialize, Serialize};

/// Column type information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Float,
    Int,
    Bool,
    Date,
    String,
}

impl ColumnType {
    /// Check if the type can serve as a join key
    pub fn is_key(&self) -> bool {
        matches!(self, ColumnType::Date | ColumnType::Int | ColumnType::String)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Float => "float64",
            ColumnType::Int => "int64",
            ColumnType::Bool => "bool",
            ColumnType::Date => "date",
            ColumnType::String => "string",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named, typed column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub dtype: ColumnType,
}

/// Ordered list of column definitions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    /// Number of columns
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position of a column by name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            writeln!(f, "{:>3}  {:<32} {}", i, field.name, field.dtype)?;
        }
        Ok(())
    }
}
