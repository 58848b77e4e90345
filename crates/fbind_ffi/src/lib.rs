//! Calling routines of compiled Fortran shared libraries.
//!
//! This crate provides:
//! - symbol lookup by substring against a library's symbol table
//! - loading of shared libraries and binding of the resolved routine
//! - marshaling of [`Value`]s into the pointer arguments Fortran expects
//! - a dispatch wrapper with fixed trailing arguments and an explicit
//!   per-tag cache of marshaled leading arguments

#![warn(missing_docs)]

pub mod dispatch;
pub mod error;
mod invoke;
pub mod library;
pub mod marshal;
pub mod symbols;
pub mod value;

pub use dispatch::{bind_with_common_args, BoundFunction, TagCache};
pub use error::FfiError;
pub use invoke::MAX_ARGS;
pub use library::{resolve, ForeignFunction, Loader};
pub use marshal::{marshal, marshal_all, Marshaled, PointerKind};
pub use symbols::{SymbolEntry, SymbolTable};
pub use value::{Array, Buffer, ElementType, Value};
