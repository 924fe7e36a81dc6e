//! Typed, shaped values: the bodies of datasets and the payload of attributes.
//!
//! A [`Value`] pairs a [`DType`] and a [`Shape`] with flattened element
//! storage ([`Data`]). The data variant is fixed by the dtype's category and
//! the element count by the shape, so a constructed `Value` is always
//! internally consistent.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::dtype::{DType, DTypeClass};
use crate::error::TypeError;
use crate::node::DatasetMeta;

/// Named values attached to a node, ordered by name.
pub type Attributes = BTreeMap<String, Value>;

/// Array dimensions. An empty shape denotes a scalar.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Shape(Vec<usize>);

impl Shape {
    /// The shape of a scalar.
    pub fn scalar() -> Self {
        Self(Vec::new())
    }

    /// Shape with the given dimensions.
    pub fn new(dims: impl Into<Vec<usize>>) -> Self {
        Self(dims.into())
    }

    /// The dimensions.
    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for the scalar shape.
    pub fn is_scalar(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of elements (1 for scalars), or `None` if the product
    /// overflows.
    pub fn checked_size(&self) -> Option<usize> {
        self.0.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    /// Number of elements (1 for scalars). Saturates at `usize::MAX`.
    pub fn size(&self) -> usize {
        self.checked_size().unwrap_or(usize::MAX)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => write!(f, "()"),
            [n] => write!(f, "({n},)"),
            dims => {
                let parts: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
                write!(f, "({})", parts.join(", "))
            }
        }
    }
}

/// Flattened element storage, one variant per comparison category.
#[derive(Clone, Debug, PartialEq)]
pub enum Data {
    Float(Vec<f64>),
    Int(Vec<i64>),
    UInt(Vec<u64>),
    Bool(Vec<bool>),
    Str(Vec<String>),
    Opaque(Vec<Vec<u8>>),
}

impl Data {
    /// Number of stored elements.
    pub fn len(&self) -> usize {
        match self {
            Self::Float(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::UInt(v) => v.len(),
            Self::Bool(v) => v.len(),
            Self::Str(v) => v.len(),
            Self::Opaque(v) => v.len(),
        }
    }

    /// Returns `true` if no elements are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The comparison category of the stored elements.
    pub fn class(&self) -> DTypeClass {
        match self {
            Self::Float(_) => DTypeClass::Float,
            Self::Int(_) | Self::UInt(_) => DTypeClass::Int,
            Self::Bool(_) => DTypeClass::Bool,
            Self::Str(_) => DTypeClass::String,
            Self::Opaque(_) => DTypeClass::Opaque,
        }
    }

    fn fits(&self, dtype: DType) -> bool {
        match self {
            Self::Int(_) => dtype.class() == DTypeClass::Int && !dtype.is_unsigned(),
            Self::UInt(_) => dtype.is_unsigned(),
            other => other.class() == dtype.class(),
        }
    }

    /// First integer element outside the range of `dtype`'s width.
    fn out_of_range(&self, dtype: DType) -> Option<String> {
        match self {
            Self::Int(v) => {
                let (lo, hi) = match dtype {
                    DType::I8 => (i64::from(i8::MIN), i64::from(i8::MAX)),
                    DType::I16 => (i64::from(i16::MIN), i64::from(i16::MAX)),
                    DType::I32 => (i64::from(i32::MIN), i64::from(i32::MAX)),
                    _ => return None,
                };
                v.iter().find(|x| !(lo..=hi).contains(*x)).map(ToString::to_string)
            }
            Self::UInt(v) => {
                let hi = match dtype {
                    DType::U8 => u64::from(u8::MAX),
                    DType::U16 => u64::from(u16::MAX),
                    DType::U32 => u64::from(u32::MAX),
                    _ => return None,
                };
                v.iter().find(|x| **x > hi).map(ToString::to_string)
            }
            _ => None,
        }
    }
}

/// A typed, shaped value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ValueRepr", into = "ValueRepr")]
pub struct Value {
    dtype: DType,
    shape: Shape,
    data: Data,
}

impl Value {
    /// Build a value, checking that `data` fits `dtype` and `shape`.
    ///
    /// Integer elements must lie within the declared width, so `u8` data
    /// holds nothing above 255.
    pub fn new(dtype: DType, shape: Shape, data: Data) -> Result<Self, TypeError> {
        if !data.fits(dtype) {
            return Err(TypeError::DTypeMismatch {
                dtype,
                data: data.class(),
            });
        }
        if let Some(element) = data.out_of_range(dtype) {
            return Err(TypeError::InvalidElement {
                dtype,
                reason: format!("{element} is out of range"),
            });
        }
        let expected = shape
            .checked_size()
            .ok_or_else(|| TypeError::ShapeOverflow(shape.clone()))?;
        if expected != data.len() {
            return Err(TypeError::ShapeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { dtype, shape, data })
    }

    fn vector(dtype: DType, data: Data) -> Self {
        let shape = Shape::new(vec![data.len()]);
        Self { dtype, shape, data }
    }

    fn scalar(dtype: DType, data: Data) -> Self {
        Self {
            dtype,
            shape: Shape::scalar(),
            data,
        }
    }

    /// Scalar `f64`.
    pub fn float(x: f64) -> Self {
        Self::scalar(DType::F64, Data::Float(vec![x]))
    }

    /// Scalar `i64`.
    pub fn int(x: i64) -> Self {
        Self::scalar(DType::I64, Data::Int(vec![x]))
    }

    /// Scalar `u64`.
    pub fn uint(x: u64) -> Self {
        Self::scalar(DType::U64, Data::UInt(vec![x]))
    }

    /// Scalar boolean.
    pub fn bool(x: bool) -> Self {
        Self::scalar(DType::Bool, Data::Bool(vec![x]))
    }

    /// Scalar string.
    pub fn string(s: impl Into<String>) -> Self {
        Self::scalar(DType::String, Data::Str(vec![s.into()]))
    }

    /// Scalar opaque blob.
    pub fn opaque(bytes: impl Into<Vec<u8>>) -> Self {
        Self::scalar(DType::Opaque, Data::Opaque(vec![bytes.into()]))
    }

    /// One-dimensional `f64` array.
    pub fn float_array(values: impl Into<Vec<f64>>) -> Self {
        Self::vector(DType::F64, Data::Float(values.into()))
    }

    /// One-dimensional `i64` array.
    pub fn int_array(values: impl Into<Vec<i64>>) -> Self {
        Self::vector(DType::I64, Data::Int(values.into()))
    }

    /// One-dimensional boolean array.
    pub fn bool_array(values: impl Into<Vec<bool>>) -> Self {
        Self::vector(DType::Bool, Data::Bool(values.into()))
    }

    /// One-dimensional string array.
    pub fn string_array<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        let data: Vec<String> = values.into_iter().map(Into::into).collect();
        Self::vector(DType::String, Data::Str(data))
    }

    /// Same elements under a different shape with the same element count.
    pub fn reshape(self, shape: Shape) -> Result<Self, TypeError> {
        Self::new(self.dtype, shape, self.data)
    }

    /// Same elements reinterpreted under another dtype of the same storage
    /// variant (e.g. `f64` → `f32`).
    pub fn with_dtype(self, dtype: DType) -> Result<Self, TypeError> {
        Self::new(dtype, self.shape, self.data)
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    /// Number of elements.
    pub fn size(&self) -> usize {
        self.shape.size()
    }

    /// Dtype and shape without the elements.
    pub fn meta(&self) -> DatasetMeta {
        DatasetMeta {
            dtype: self.dtype,
            shape: self.shape.clone(),
        }
    }
}

/// Document form of a [`Value`]: `{"dtype": .., "shape": [..], "data": [..]}`.
///
/// Non-finite floats are written as the strings `"nan"`, `"inf"` and `"-inf"`;
/// opaque elements as hex strings. A scalar may give its single element
/// without the surrounding list.
#[derive(Serialize, Deserialize)]
struct ValueRepr {
    dtype: DType,
    #[serde(default)]
    shape: Shape,
    data: Json,
}

impl From<Value> for ValueRepr {
    fn from(value: Value) -> Self {
        let items: Vec<Json> = match value.data {
            Data::Float(v) => v.into_iter().map(float_to_json).collect(),
            Data::Int(v) => v.into_iter().map(Json::from).collect(),
            Data::UInt(v) => v.into_iter().map(Json::from).collect(),
            Data::Bool(v) => v.into_iter().map(Json::from).collect(),
            Data::Str(v) => v.into_iter().map(Json::from).collect(),
            Data::Opaque(v) => v.into_iter().map(|b| Json::from(hex::encode(b))).collect(),
        };
        Self {
            dtype: value.dtype,
            shape: value.shape,
            data: Json::Array(items),
        }
    }
}

impl TryFrom<ValueRepr> for Value {
    type Error = TypeError;

    fn try_from(repr: ValueRepr) -> Result<Self, Self::Error> {
        let dtype = repr.dtype;
        let items = match repr.data {
            Json::Array(items) => items,
            single => vec![single],
        };
        let invalid = |item: &Json| TypeError::InvalidElement {
            dtype,
            reason: format!("unexpected element {item}"),
        };

        let data = match dtype.class() {
            DTypeClass::Float => Data::Float(
                items
                    .iter()
                    .map(|i| float_from_json(i).ok_or_else(|| invalid(i)))
                    .collect::<Result<_, _>>()?,
            ),
            DTypeClass::Int if dtype.is_unsigned() => Data::UInt(
                items
                    .iter()
                    .map(|i| i.as_u64().ok_or_else(|| invalid(i)))
                    .collect::<Result<_, _>>()?,
            ),
            DTypeClass::Int => Data::Int(
                items
                    .iter()
                    .map(|i| i.as_i64().ok_or_else(|| invalid(i)))
                    .collect::<Result<_, _>>()?,
            ),
            DTypeClass::Bool => Data::Bool(
                items
                    .iter()
                    .map(|i| i.as_bool().ok_or_else(|| invalid(i)))
                    .collect::<Result<_, _>>()?,
            ),
            DTypeClass::String => Data::Str(
                items
                    .iter()
                    .map(|i| i.as_str().map(str::to_string).ok_or_else(|| invalid(i)))
                    .collect::<Result<_, _>>()?,
            ),
            DTypeClass::Opaque => Data::Opaque(
                items
                    .iter()
                    .map(|i| {
                        let s = i.as_str().ok_or_else(|| invalid(i))?;
                        hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))
                    })
                    .collect::<Result<_, _>>()?,
            ),
        };

        Value::new(dtype, repr.shape, data)
    }
}

fn float_to_json(x: f64) -> Json {
    if x.is_nan() {
        Json::from("nan")
    } else if x.is_infinite() {
        Json::from(if x > 0.0 { "inf" } else { "-inf" })
    } else {
        Json::from(x)
    }
}

fn float_from_json(item: &Json) -> Option<f64> {
    match item {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => match s.as_str() {
            "nan" => Some(f64::NAN),
            "inf" => Some(f64::INFINITY),
            "-inf" => Some(f64::NEG_INFINITY),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_size_and_display() {
        assert_eq!(Shape::scalar().size(), 1);
        assert_eq!(Shape::new(vec![2, 3]).size(), 6);
        assert_eq!(Shape::new(vec![0, 3]).size(), 0);
        assert_eq!(Shape::scalar().to_string(), "()");
        assert_eq!(Shape::new(vec![4]).to_string(), "(4,)");
        assert_eq!(Shape::new(vec![2, 3]).to_string(), "(2, 3)");
    }

    #[test]
    fn new_rejects_wrong_element_count() {
        let err = Value::new(DType::F64, Shape::new(vec![2, 2]), Data::Float(vec![1.0; 3]));
        assert_eq!(
            err,
            Err(TypeError::ShapeMismatch {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn new_rejects_wrong_storage_variant() {
        let err = Value::new(DType::U8, Shape::scalar(), Data::Int(vec![1]));
        assert!(matches!(err, Err(TypeError::DTypeMismatch { .. })));
        let err = Value::new(DType::String, Shape::scalar(), Data::Bool(vec![true]));
        assert!(matches!(err, Err(TypeError::DTypeMismatch { .. })));
    }

    #[test]
    fn reshape_keeps_elements() {
        let v = Value::int_array(vec![1, 2, 3, 4, 5, 6]);
        let r = v.clone().reshape(Shape::new(vec![2, 3])).unwrap();
        assert_eq!(r.data(), v.data());
        assert_eq!(r.shape().dims(), &[2, 3]);
        assert!(v.reshape(Shape::new(vec![4])).is_err());
    }

    #[test]
    fn document_form_handles_non_finite_and_opaque() {
        let v = Value::float_array(vec![1.5, f64::INFINITY, f64::NEG_INFINITY]);
        let json = serde_json::to_string(&v).unwrap();
        assert!(json.contains("\"inf\""));
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);

        let nan: Value =
            serde_json::from_str(r#"{"dtype":"f32","shape":[],"data":"nan"}"#).unwrap();
        match nan.data() {
            Data::Float(v) => assert!(v[0].is_nan()),
            other => panic!("expected float data, got {other:?}"),
        }

        let blob = Value::opaque(vec![0xde, 0xad]);
        let json = serde_json::to_string(&blob).unwrap();
        assert!(json.contains("\"dead\""));
        assert_eq!(serde_json::from_str::<Value>(&json).unwrap(), blob);
    }

    #[test]
    fn document_scalar_shorthand() {
        let v: Value = serde_json::from_str(r#"{"dtype":"i32","data":7}"#).unwrap();
        assert_eq!(v.dtype(), DType::I32);
        assert!(v.shape().is_scalar());
        assert_eq!(v.data(), &Data::Int(vec![7]));
    }

    #[test]
    fn document_rejects_bad_elements() {
        let err = serde_json::from_str::<Value>(r#"{"dtype":"u8","shape":[1],"data":[-1]}"#);
        assert!(err.is_err());
        let err = serde_json::from_str::<Value>(r#"{"dtype":"f64","shape":[2],"data":[1.0]}"#);
        assert!(err.is_err());
    }

    #[test]
    fn overflowing_shape_is_an_error() {
        let huge = Shape::new(vec![usize::MAX, 2]);
        assert_eq!(huge.checked_size(), None);
        assert_eq!(huge.size(), usize::MAX);

        let err = Value::new(DType::I64, huge.clone(), Data::Int(vec![]));
        assert_eq!(err, Err(TypeError::ShapeOverflow(huge)));

        let doc = format!(
            r#"{{"dtype":"i64","shape":[{0},{0}],"data":[]}}"#,
            u64::from(u32::MAX) + 1
        );
        let err = serde_json::from_str::<Value>(&doc).unwrap_err();
        assert!(err.to_string().contains("holds more elements"), "{err}");
    }

    #[test]
    fn narrow_integers_are_range_checked() {
        let err = serde_json::from_str::<Value>(r#"{"dtype":"u8","data":[1000]}"#).unwrap_err();
        assert!(err.to_string().contains("1000 is out of range"), "{err}");
        assert!(serde_json::from_str::<Value>(r#"{"dtype":"i8","data":[-129]}"#).is_err());
        assert!(serde_json::from_str::<Value>(r#"{"dtype":"u16","data":65536}"#).is_err());

        let ok: Value = serde_json::from_str(r#"{"dtype":"i8","shape":[2],"data":[-128,127]}"#).unwrap();
        assert_eq!(ok.data(), &Data::Int(vec![-128, 127]));

        let narrowed = Value::int(300).with_dtype(DType::I16).unwrap();
        assert_eq!(narrowed.dtype(), DType::I16);
        assert!(matches!(
            Value::int(300).with_dtype(DType::I8),
            Err(TypeError::InvalidElement { dtype: DType::I8, .. })
        ));
    }
}
