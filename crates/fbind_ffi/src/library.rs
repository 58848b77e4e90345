//! Loading shared libraries and binding resolved routines.

use std::collections::HashMap;
use std::ffi::c_void;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use libloading::Library;

use crate::dispatch::{bind_with_common_args, BoundFunction};
use crate::error::FfiError;
use crate::invoke::invoke;
use crate::marshal::{marshal_all, Marshaled};
use crate::symbols::SymbolTable;
use crate::value::Value;

/// Symbol-table tool used when none is configured.
pub const DEFAULT_SYMBOL_TOOL: &str = "nm";

/// Resolves `substring` in the library at `path` with a fresh [`Loader`].
pub fn resolve(path: &Path, substring: &str) -> Result<ForeignFunction, FfiError> {
    Loader::new().resolve(path, substring)
}

/// Loads libraries and resolves routines in them.
///
/// A library is opened once per canonical path; later resolutions against the
/// same path share the handle.
pub struct Loader {
    symbol_tool: String,
    libraries: HashMap<PathBuf, Rc<Library>>,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("symbol_tool", &self.symbol_tool)
            .field("libraries", &self.libraries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Loader {
    /// A loader that inspects libraries with `nm`.
    pub fn new() -> Self {
        Self::with_symbol_tool(DEFAULT_SYMBOL_TOOL)
    }

    /// A loader that inspects libraries with `tool`.
    pub fn with_symbol_tool(tool: impl Into<String>) -> Self {
        Self {
            symbol_tool: tool.into(),
            libraries: HashMap::new(),
        }
    }

    /// The symbol-table tool in use.
    pub fn symbol_tool(&self) -> &str {
        &self.symbol_tool
    }

    /// Number of distinct libraries opened so far.
    pub fn loaded_count(&self) -> usize {
        self.libraries.len()
    }

    /// Reads the symbol table of the library at `path`.
    pub fn symbols(&self, path: &Path) -> Result<SymbolTable, FfiError> {
        SymbolTable::read(&self.symbol_tool, path)
    }

    /// Opens the library at `path`, or returns the handle opened earlier.
    pub fn load(&mut self, path: &Path) -> Result<Rc<Library>, FfiError> {
        let canonical = std::fs::canonicalize(path).map_err(|e| FfiError::LoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if let Some(library) = self.libraries.get(&canonical) {
            return Ok(Rc::clone(library));
        }

        // SAFETY: opening a library runs its initialisers; compiled Fortran
        // libraries have none beyond the runtime's own.
        let library = unsafe { Library::new(&canonical) }.map_err(|e| FfiError::LoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        tracing::debug!(library = %canonical.display(), "loaded shared library");

        let library = Rc::new(library);
        self.libraries.insert(canonical, Rc::clone(&library));
        Ok(library)
    }

    /// Finds the single exported routine whose name contains `substring` and
    /// binds it.
    pub fn resolve(&mut self, path: &Path, substring: &str) -> Result<ForeignFunction, FfiError> {
        let table = self.symbols(path)?;
        let name = table.find_unique(substring)?.to_string();
        tracing::debug!(symbol = %name, requested = substring, "resolved symbol");

        let library = self.load(path)?;
        let lookup = loader_name(&name);
        // SAFETY: the address is only read here; calling it is guarded by
        // `ForeignFunction::call`.
        let addr = unsafe {
            library
                .get::<*const c_void>(lookup.as_bytes())
                .map(|symbol| *symbol)
        }
        .map_err(|e| FfiError::LoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(ForeignFunction {
            name,
            addr,
            _library: Some(library),
        })
    }
}

/// The name the dynamic loader expects for a symbol-table name.
///
/// Mach-O symbol tables carry a leading underscore the loader adds itself.
fn loader_name(name: &str) -> &str {
    if cfg!(target_os = "macos") {
        name.strip_prefix('_').unwrap_or(name)
    } else {
        name
    }
}

/// A routine resolved from a loaded library.
///
/// Holds a reference to its library, so the code stays mapped for as long as
/// the handle exists.
#[derive(Clone)]
pub struct ForeignFunction {
    name: String,
    addr: *const c_void,
    _library: Option<Rc<Library>>,
}

impl fmt::Debug for ForeignFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignFunction")
            .field("name", &self.name)
            .field("addr", &self.addr)
            .finish()
    }
}

impl ForeignFunction {
    /// Wraps a routine address that does not come from a loaded library.
    ///
    /// # Safety
    ///
    /// `addr` must point to an `extern "C"` routine taking pointer arguments
    /// and must stay valid for the life of the returned handle.
    pub unsafe fn from_raw(name: impl Into<String>, addr: *const c_void) -> Self {
        Self {
            name: name.into(),
            addr,
            _library: None,
        }
    }

    /// The full symbol name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Marshals `args` and calls the routine with them.
    ///
    /// # Safety
    ///
    /// The marshaled arguments must match the routine's parameter list in
    /// number and pointee type, and the routine must stay within the bounds
    /// of every buffer it is given.
    pub unsafe fn call(&self, args: &[Value]) -> Result<(), FfiError> {
        let mut marshaled = marshal_all(args)?;
        self.call_marshaled(&mut marshaled)
    }

    /// Calls the routine with arguments marshaled earlier.
    ///
    /// # Safety
    ///
    /// Same contract as [`ForeignFunction::call`].
    pub unsafe fn call_marshaled(&self, args: &mut Marshaled) -> Result<(), FfiError> {
        let mut pointers = Vec::with_capacity(args.len());
        args.collect_pointers(0, &mut pointers)?;
        self.invoke_pointers(&pointers)
    }

    /// Binds `common` as trailing arguments of every later call.
    pub fn bind(self, common: &[Value]) -> Result<BoundFunction, FfiError> {
        bind_with_common_args(self, common)
    }

    /// # Safety
    ///
    /// `pointers` must match the routine's parameter list.
    pub(crate) unsafe fn invoke_pointers(&self, pointers: &[*mut c_void]) -> Result<(), FfiError> {
        tracing::debug!(symbol = %self.name, args = pointers.len(), "calling foreign routine");
        invoke(self.addr, pointers)
    }
}
