//! Conversion of [`Value`]s into pointer arguments.
//!
//! Scalars are copied into heap cells owned by the [`Marshaled`] set, so their
//! addresses stay fixed for the life of the set and a routine may write
//! through them. Arrays are not copied: the set keeps a handle to the shared
//! buffer and passes a pointer to its first element at call time.

use std::ffi::c_void;

use crate::error::FfiError;
use crate::value::{Array, ElementType, Value};

/// The C type a marshaled argument points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    /// `int32_t *`
    Int32,
    /// `float *`
    Float32,
    /// `double *`
    Float64,
    /// `bool *`
    Bool,
    /// `char *` to a copy of the bytes, followed by one NUL pad byte.
    Bytes,
    /// `char *` to a NUL-terminated string.
    Text,
    /// Pointer to the first element of an array of the given type.
    Array(ElementType),
}

#[derive(Debug)]
enum Scalar {
    Int32(Box<i32>),
    Float32(Box<f32>),
    Float64(Box<f64>),
    Bool(Box<bool>),
    /// Padded copy and the unpadded length.
    Bytes(Box<[u8]>, usize),
    Text(Box<[u8]>),
}

impl Scalar {
    fn as_mut_ptr(&mut self) -> *mut c_void {
        match self {
            Scalar::Int32(v) => (&mut **v as *mut i32).cast(),
            Scalar::Float32(v) => (&mut **v as *mut f32).cast(),
            Scalar::Float64(v) => (&mut **v as *mut f64).cast(),
            Scalar::Bool(v) => (&mut **v as *mut bool).cast(),
            Scalar::Bytes(v, _) | Scalar::Text(v) => v.as_mut_ptr().cast(),
        }
    }

    fn kind(&self) -> PointerKind {
        match self {
            Scalar::Int32(_) => PointerKind::Int32,
            Scalar::Float32(_) => PointerKind::Float32,
            Scalar::Float64(_) => PointerKind::Float64,
            Scalar::Bool(_) => PointerKind::Bool,
            Scalar::Bytes(..) => PointerKind::Bytes,
            Scalar::Text(_) => PointerKind::Text,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Scalar::Int32(v) => Value::Int(i64::from(**v)),
            Scalar::Float32(v) => Value::Float32(**v),
            Scalar::Float64(v) => Value::Float64(**v),
            Scalar::Bool(v) => Value::Bool(**v),
            Scalar::Bytes(v, len) => Value::Bytes(v[..*len].to_vec()),
            Scalar::Text(v) => {
                let text = v.strip_suffix(&[0u8]).unwrap_or(&v[..]);
                Value::Text(String::from_utf8_lossy(text).into_owned())
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Scalar(usize),
    Array(usize),
}

/// An ordered set of marshaled arguments.
#[derive(Debug, Default)]
pub struct Marshaled {
    scalars: Vec<Scalar>,
    arrays: Vec<Array>,
    order: Vec<Slot>,
}

/// Marshals one value. Sequences are flattened, so the result may hold
/// several arguments.
pub fn marshal(value: &Value) -> Result<Marshaled, FfiError> {
    let mut out = Marshaled::default();
    out.push(value)?;
    Ok(out)
}

/// Marshals an argument list in order.
pub fn marshal_all(values: &[Value]) -> Result<Marshaled, FfiError> {
    let mut out = Marshaled::default();
    for value in values {
        out.push(value)?;
    }
    Ok(out)
}

impl Marshaled {
    /// Number of pointer arguments.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Pointer types, in argument order.
    pub fn kinds(&self) -> Vec<PointerKind> {
        self.order
            .iter()
            .map(|slot| match *slot {
                Slot::Scalar(i) => self.scalars[i].kind(),
                Slot::Array(i) => PointerKind::Array(self.arrays[i].element_type()),
            })
            .collect()
    }

    /// Current value of argument `index`.
    ///
    /// Scalars reflect anything a routine wrote through their pointer; arrays
    /// are returned as a handle to the shared buffer.
    pub fn value_at(&self, index: usize) -> Option<Value> {
        match *self.order.get(index)? {
            Slot::Scalar(i) => Some(self.scalars[i].to_value()),
            Slot::Array(i) => Some(Value::Array(self.arrays[i].clone())),
        }
    }

    /// Appends this set's pointers to `out`, in argument order.
    ///
    /// `offset` is the position of the first argument in the full call and
    /// only serves error reporting.
    pub(crate) fn collect_pointers(
        &mut self,
        offset: usize,
        out: &mut Vec<*mut c_void>,
    ) -> Result<(), FfiError> {
        let scalar_ptrs: Vec<*mut c_void> =
            self.scalars.iter_mut().map(Scalar::as_mut_ptr).collect();

        for (position, slot) in self.order.iter().enumerate() {
            let ptr = match *slot {
                Slot::Scalar(i) => scalar_ptrs[i],
                Slot::Array(i) => self.arrays[i].data_ptr().ok_or(FfiError::BufferBusy {
                    index: offset + position,
                })?,
            };
            out.push(ptr);
        }
        Ok(())
    }

    fn push(&mut self, value: &Value) -> Result<(), FfiError> {
        let scalar = match value {
            Value::Sequence(items) => return items.iter().try_for_each(|item| self.push(item)),
            Value::Array(array) => {
                self.order.push(Slot::Array(self.arrays.len()));
                self.arrays.push(array.clone());
                return Ok(());
            }
            Value::Int(v) => {
                let narrowed =
                    i32::try_from(*v).map_err(|_| FfiError::IntegerOutOfRange { value: *v })?;
                Scalar::Int32(Box::new(narrowed))
            }
            Value::Float32(v) => Scalar::Float32(Box::new(*v)),
            Value::Float64(v) => Scalar::Float64(Box::new(*v)),
            Value::Bool(v) => Scalar::Bool(Box::new(*v)),
            Value::Bytes(v) => Scalar::Bytes(nul_padded(v), v.len()),
            Value::Text(v) => Scalar::Text(nul_padded(v.as_bytes())),
        };
        self.order.push(Slot::Scalar(self.scalars.len()));
        self.scalars.push(scalar);
        Ok(())
    }
}

/// Copies `bytes` with one trailing NUL, so even an empty input has an addressable byte.
fn nul_padded(bytes: &[u8]) -> Box<[u8]> {
    let mut padded = Vec::with_capacity(bytes.len() + 1);
    padded.extend_from_slice(bytes);
    padded.push(0);
    padded.into_boxed_slice()
}
