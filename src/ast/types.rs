use std::fmt::Display;

/// The fixed type lattice of the language.
///
/// `Byte` is the 32-bit integral scalar, `Bit` the boolean flag and `Chip`
/// a string. `Void` never appears in source; it is the type of a call to a
/// function without a return clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Byte,
    Bit,
    Chip,
    Array,
    Void,
}

impl DataType {
    /// Resolves a declared type name. `void` cannot be declared.
    pub fn from_name(name: &str) -> Option<DataType> {
        match name {
            "byte" => Some(DataType::Byte),
            "bit" => Some(DataType::Bit),
            "chip" => Some(DataType::Chip),
            "array" => Some(DataType::Array),
            _ => None,
        }
    }

    /// Whether a value of type `value` may be stored into a slot of this type.
    ///
    /// Identical types are always compatible. A `bit` also satisfies a
    /// `byte` slot and is widened to 0 or 1.
    pub fn accepts(&self, value: DataType) -> bool {
        *self == value || (*self == DataType::Byte && value == DataType::Bit)
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataType::Byte => "byte",
            DataType::Bit => "bit",
            DataType::Chip => "chip",
            DataType::Array => "array",
            DataType::Void => "void",
        }
    }
}

impl Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
