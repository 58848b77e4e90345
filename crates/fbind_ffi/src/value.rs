//! Values that can be handed to a foreign routine.
//!
//! [`Value`] is a closed set: every variant has exactly one marshaling rule,
//! so a 32-bit float can never be mistaken for a 64-bit one and a boolean
//! never for an integer.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::error::FfiError;

/// A shared, growable array the caller and foreign routines both see.
///
/// Cloning a `Buffer` clones the handle, not the data. Marshaling an array
/// passes a pointer to the buffer's first element, so writes made by the
/// routine are visible through every handle.
#[derive(Debug)]
pub struct Buffer<T>(Rc<RefCell<Vec<T>>>);

impl<T> Clone for Buffer<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> Buffer<T> {
    /// Wraps `data` in a new shared buffer.
    pub fn new(data: Vec<T>) -> Self {
        Self(Rc::new(RefCell::new(data)))
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Returns `true` if the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Borrows the contents.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is currently mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, Vec<T>> {
        self.0.borrow()
    }

    /// Mutably borrows the contents.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is currently borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, Vec<T>> {
        self.0.borrow_mut()
    }

    /// Returns `true` if both handles refer to the same storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Pointer to the first element, or `None` while the caller holds a borrow.
    ///
    /// The pointer stays valid until the vector is next resized.
    pub(crate) fn data_ptr(&self) -> Option<*mut T> {
        let mut data = self.0.try_borrow_mut().ok()?;
        Some(data.as_mut_ptr())
    }
}

impl<T: Clone> Buffer<T> {
    /// Copies the contents out.
    pub fn to_vec(&self) -> Vec<T> {
        self.0.borrow().clone()
    }
}

impl<T> From<Vec<T>> for Buffer<T> {
    fn from(data: Vec<T>) -> Self {
        Self::new(data)
    }
}

/// Element types an [`Array`] may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// 8-bit signed integer.
    Int8,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 32-bit float.
    Float32,
    /// 64-bit float.
    Float64,
    /// One-byte boolean.
    Bool,
}

impl ElementType {
    /// Looks up an element type by dtype name (`"float64"`, `"int8"`, ...).
    ///
    /// Short forms (`"f64"`, `"i32"`, ...) are accepted too. Unknown names
    /// fail with [`FfiError::UnsupportedType`].
    pub fn from_dtype(name: &str) -> Result<Self, FfiError> {
        match name {
            "int8" | "i8" => Ok(ElementType::Int8),
            "int32" | "i32" => Ok(ElementType::Int32),
            "int64" | "i64" => Ok(ElementType::Int64),
            "float32" | "f32" => Ok(ElementType::Float32),
            "float64" | "f64" => Ok(ElementType::Float64),
            "bool" => Ok(ElementType::Bool),
            other => Err(FfiError::UnsupportedType {
                value: format!("array of {other}"),
                type_name: "array".to_string(),
            }),
        }
    }

    /// The canonical dtype name.
    pub fn dtype(self) -> &'static str {
        match self {
            ElementType::Int8 => "int8",
            ElementType::Int32 => "int32",
            ElementType::Int64 => "int64",
            ElementType::Float32 => "float32",
            ElementType::Float64 => "float64",
            ElementType::Bool => "bool",
        }
    }

    /// Size of one element in bytes.
    pub fn size(self) -> usize {
        match self {
            ElementType::Int8 | ElementType::Bool => 1,
            ElementType::Int32 | ElementType::Float32 => 4,
            ElementType::Int64 | ElementType::Float64 => 8,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dtype())
    }
}

/// A homogeneous numeric array backed by a shared [`Buffer`].
#[derive(Debug, Clone)]
pub enum Array {
    /// `int8` elements.
    Int8(Buffer<i8>),
    /// `int32` elements.
    Int32(Buffer<i32>),
    /// `int64` elements.
    Int64(Buffer<i64>),
    /// `float32` elements.
    Float32(Buffer<f32>),
    /// `float64` elements.
    Float64(Buffer<f64>),
    /// `bool` elements.
    Bool(Buffer<bool>),
}

impl Array {
    /// A zero-filled array of `len` elements.
    pub fn zeros(element: ElementType, len: usize) -> Self {
        match element {
            ElementType::Int8 => Array::Int8(Buffer::new(vec![0; len])),
            ElementType::Int32 => Array::Int32(Buffer::new(vec![0; len])),
            ElementType::Int64 => Array::Int64(Buffer::new(vec![0; len])),
            ElementType::Float32 => Array::Float32(Buffer::new(vec![0.0; len])),
            ElementType::Float64 => Array::Float64(Buffer::new(vec![0.0; len])),
            ElementType::Bool => Array::Bool(Buffer::new(vec![false; len])),
        }
    }

    /// The element type.
    pub fn element_type(&self) -> ElementType {
        match self {
            Array::Int8(_) => ElementType::Int8,
            Array::Int32(_) => ElementType::Int32,
            Array::Int64(_) => ElementType::Int64,
            Array::Float32(_) => ElementType::Float32,
            Array::Float64(_) => ElementType::Float64,
            Array::Bool(_) => ElementType::Bool,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Array::Int8(b) => b.len(),
            Array::Int32(b) => b.len(),
            Array::Int64(b) => b.len(),
            Array::Float32(b) => b.len(),
            Array::Float64(b) => b.len(),
            Array::Bool(b) => b.len(),
        }
    }

    /// Returns `true` if the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Untyped pointer to the first element, `None` while the buffer is borrowed.
    pub(crate) fn data_ptr(&self) -> Option<*mut std::ffi::c_void> {
        match self {
            Array::Int8(b) => b.data_ptr().map(|p| p.cast()),
            Array::Int32(b) => b.data_ptr().map(|p| p.cast()),
            Array::Int64(b) => b.data_ptr().map(|p| p.cast()),
            Array::Float32(b) => b.data_ptr().map(|p| p.cast()),
            Array::Float64(b) => b.data_ptr().map(|p| p.cast()),
            Array::Bool(b) => b.data_ptr().map(|p| p.cast()),
        }
    }

    fn parse(element: ElementType, body: &str, literal: &str) -> Result<Self, FfiError> {
        Ok(match element {
            ElementType::Int8 => Array::Int8(parse_list(body, literal)?.into()),
            ElementType::Int32 => Array::Int32(parse_list(body, literal)?.into()),
            ElementType::Int64 => Array::Int64(parse_list(body, literal)?.into()),
            ElementType::Float32 => Array::Float32(parse_list(body, literal)?.into()),
            ElementType::Float64 => Array::Float64(parse_list(body, literal)?.into()),
            ElementType::Bool => Array::Bool(parse_list(body, literal)?.into()),
        })
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Array::Int8(b) => write!(f, "{:?}", b.borrow()),
            Array::Int32(b) => write!(f, "{:?}", b.borrow()),
            Array::Int64(b) => write!(f, "{:?}", b.borrow()),
            Array::Float32(b) => write!(f, "{:?}", b.borrow()),
            Array::Float64(b) => write!(f, "{:?}", b.borrow()),
            Array::Bool(b) => write!(f, "{:?}", b.borrow()),
        }
    }
}

/// An argument for a foreign routine.
#[derive(Debug, Clone)]
pub enum Value {
    /// Integer, passed as a 32-bit integer.
    Int(i64),
    /// 32-bit float.
    Float32(f32),
    /// 64-bit float.
    Float64(f64),
    /// Boolean, passed as a one-byte boolean.
    Bool(bool),
    /// Raw bytes, passed as a character buffer without terminator.
    Bytes(Vec<u8>),
    /// Text, passed as a NUL-terminated UTF-8 buffer.
    Text(String),
    /// Array, passed as a pointer into the shared buffer.
    Array(Array),
    /// Several values, flattened in order.
    Sequence(Vec<Value>),
}

impl Value {
    /// Name of the variant, as used in argument literals and error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float32(_) => "f32",
            Value::Float64(_) => "f64",
            Value::Bool(_) => "bool",
            Value::Bytes(_) => "bytes",
            Value::Text(_) => "str",
            Value::Array(_) => "array",
            Value::Sequence(_) => "sequence",
        }
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_scalar!(
    i32 => Int,
    i64 => Int,
    f32 => Float32,
    f64 => Float64,
    bool => Bool,
    String => Text,
    &str => Text,
);

macro_rules! impl_from_buffer {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Buffer<$ty>> for Value {
                fn from(b: Buffer<$ty>) -> Self {
                    Value::Array(Array::$variant(b))
                }
            }

            impl From<Buffer<$ty>> for Array {
                fn from(b: Buffer<$ty>) -> Self {
                    Array::$variant(b)
                }
            }
        )*
    };
}

impl_from_buffer!(
    i8 => Int8,
    i32 => Int32,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
    bool => Bool,
);

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Value::Array(a)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::Sequence(values)
    }
}

/// Parses a `type:value` argument literal.
///
/// Scalars: `int:3` (also `i32:`/`int32:`), `f32:1.5`, `f64:2.0`,
/// `bool:true`, `bytes:abc`, `str:hello`. Arrays: `<dtype>[]:1,2,3` with any
/// dtype accepted by [`ElementType::from_dtype`]; an empty body gives an
/// empty array. Unknown types fail with [`FfiError::UnsupportedType`].
impl FromStr for Value {
    type Err = FfiError;

    fn from_str(literal: &str) -> Result<Self, Self::Err> {
        let (kind, body) = literal
            .split_once(':')
            .ok_or_else(|| FfiError::InvalidLiteral {
                literal: literal.to_string(),
                reason: "expected <type>:<value>".to_string(),
            })?;

        if let Some(dtype) = kind.strip_suffix("[]") {
            let element = ElementType::from_dtype(dtype)?;
            return Array::parse(element, body, literal).map(Value::Array);
        }

        match kind {
            "int" | "i32" | "int32" => Ok(Value::Int(parse_one(body, literal)?)),
            "f32" | "float32" => Ok(Value::Float32(parse_one(body, literal)?)),
            "f64" | "float64" | "float" => Ok(Value::Float64(parse_one(body, literal)?)),
            "bool" => Ok(Value::Bool(parse_one(body, literal)?)),
            "bytes" => Ok(Value::Bytes(body.as_bytes().to_vec())),
            "str" | "text" => Ok(Value::Text(body.to_string())),
            other => Err(FfiError::UnsupportedType {
                value: body.to_string(),
                type_name: other.to_string(),
            }),
        }
    }
}

fn parse_one<T>(body: &str, literal: &str) -> Result<T, FfiError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    body.trim().parse().map_err(|e: T::Err| FfiError::InvalidLiteral {
        literal: literal.to_string(),
        reason: e.to_string(),
    })
}

fn parse_list<T>(body: &str, literal: &str) -> Result<Vec<T>, FfiError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    body.split(',').map(|item| parse_one(item, literal)).collect()
}
