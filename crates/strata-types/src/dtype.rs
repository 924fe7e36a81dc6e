use std::fmt;

use serde::{Deserialize, Serialize};

/// Element type of a dataset body or attribute value.
///
/// Widths are kept so that "matching dtype" checks are exact: `f32` and `f64`
/// are different dtypes even though both compare as floats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    F32,
    F64,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    Bool,
    String,
    /// Anything without a numeric, boolean or string interpretation
    /// (compound records, references, raw bytes).
    Opaque,
}

/// Comparison category of a [`DType`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DTypeClass {
    Float,
    Int,
    Bool,
    String,
    Opaque,
}

impl DType {
    /// The comparison category of this dtype.
    pub fn class(&self) -> DTypeClass {
        match self {
            Self::F32 | Self::F64 => DTypeClass::Float,
            Self::I8 | Self::I16 | Self::I32 | Self::I64 => DTypeClass::Int,
            Self::U8 | Self::U16 | Self::U32 | Self::U64 => DTypeClass::Int,
            Self::Bool => DTypeClass::Bool,
            Self::String => DTypeClass::String,
            Self::Opaque => DTypeClass::Opaque,
        }
    }

    /// Returns `true` for floating-point and integer dtypes.
    pub fn is_numeric(&self) -> bool {
        matches!(self.class(), DTypeClass::Float | DTypeClass::Int)
    }

    /// Returns `true` for the unsigned integer dtypes.
    pub fn is_unsigned(&self) -> bool {
        matches!(self, Self::U8 | Self::U16 | Self::U32 | Self::U64)
    }

    /// Lowercase name, as used in documents and listings.
    pub fn name(&self) -> &'static str {
        match self {
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Opaque => "opaque",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for DTypeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float => write!(f, "float"),
            Self::Int => write!(f, "int"),
            Self::Bool => write!(f, "bool"),
            Self::String => write!(f, "string"),
            Self::Opaque => write!(f, "opaque"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes() {
        assert_eq!(DType::F32.class(), DTypeClass::Float);
        assert_eq!(DType::U16.class(), DTypeClass::Int);
        assert_eq!(DType::Bool.class(), DTypeClass::Bool);
        assert!(DType::I64.is_numeric());
        assert!(!DType::Bool.is_numeric());
        assert!(DType::U64.is_unsigned());
        assert!(!DType::I64.is_unsigned());
    }

    #[test]
    fn serde_names_match_display() {
        for dtype in [DType::F64, DType::U8, DType::String, DType::Opaque] {
            let json = serde_json::to_string(&dtype).unwrap();
            assert_eq!(json, format!("\"{dtype}\""));
        }
    }
}
