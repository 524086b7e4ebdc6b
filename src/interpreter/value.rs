use std::fmt::Display;

use crate::ast::types::DataType;

/// A runtime value. Each variant owns its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Byte(i32),
    Bit(bool),
    Chip(String),
    Array(Vec<Value>),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Byte(_) => DataType::Byte,
            Value::Bit(_) => DataType::Bit,
            Value::Chip(_) => DataType::Chip,
            Value::Array(_) => DataType::Array,
        }
    }

    /// Converts to the representation a slot of `data_type` stores.
    /// Only `bit` into `byte` changes anything.
    pub fn coerce_to(self, data_type: DataType) -> Value {
        match (self, data_type) {
            (Value::Bit(flag), DataType::Byte) => Value::Byte(flag as i32),
            (value, _) => value,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Byte(number) => write!(f, "{}", number),
            Value::Bit(flag) => write!(f, "{}", flag),
            Value::Chip(string) => write!(f, "{}", string),
            Value::Array(elements) => {
                write!(f, "[")?;
                for (index, element) in elements.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
        }
    }
}
