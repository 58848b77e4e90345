//! Error types for symbol resolution, marshaling and foreign calls.

use std::path::PathBuf;

/// Errors raised by symbol resolution, library loading, marshaling and calls.
///
/// None of these are recovered internally; they surface at the call site.
#[derive(Debug, thiserror::Error)]
pub enum FfiError {
    /// The symbol-table tool could not be run or reported failure.
    #[error("failed to list symbols of {} with '{tool}': {reason}", library.display())]
    SymbolToolFailed {
        /// The tool that was invoked (e.g. `nm`).
        tool: String,
        /// The library being inspected.
        library: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// No exported symbol contains the requested substring.
    #[error("did not find '{symbol}' in {}", library.display())]
    SymbolNotFound {
        /// The requested substring.
        symbol: String,
        /// The library that was searched.
        library: PathBuf,
    },

    /// Several exported symbols contain the requested substring.
    #[error(
        "found multiple occurrences of '{symbol}' in {}: {}",
        library.display(),
        candidates.join(", ")
    )]
    SymbolAmbiguous {
        /// The requested substring.
        symbol: String,
        /// The library that was searched.
        library: PathBuf,
        /// Every matching symbol name.
        candidates: Vec<String>,
    },

    /// The dynamic loader rejected the library or the symbol.
    #[error("failed to load {}: {reason}", path.display())]
    LoadFailed {
        /// The library path.
        path: PathBuf,
        /// The loader's message.
        reason: String,
    },

    /// A value has no pointer conversion.
    #[error("problem with argument {value} of type {type_name}")]
    UnsupportedType {
        /// The offending value, as written by the caller.
        value: String,
        /// Its type name.
        type_name: String,
    },

    /// An integer does not fit the 32-bit integer it is marshaled into.
    #[error("integer {value} does not fit in a 32-bit integer argument")]
    IntegerOutOfRange {
        /// The offending value.
        value: i64,
    },

    /// A textual argument could not be parsed.
    #[error("invalid argument literal '{literal}': {reason}")]
    InvalidLiteral {
        /// The literal as given.
        literal: String,
        /// Why it was rejected.
        reason: String,
    },

    /// More pointer arguments than a call supports.
    #[error("{count} arguments passed, at most {max} are supported")]
    TooManyArguments {
        /// Number of pointer arguments.
        count: usize,
        /// The supported maximum.
        max: usize,
    },

    /// An array buffer was borrowed by the caller while a call needed it.
    #[error("array argument {index} is borrowed elsewhere during the call")]
    BufferBusy {
        /// Position of the argument in the flattened argument list.
        index: usize,
    },
}
