//! Compiles a small Fortran library and calls into it. Skipped when gfortran
//! or nm is not installed.

use std::path::{Path, PathBuf};
use std::process::Command;

use fbind_config::{ModuleMap, SourceList, Toolchain};
use fbind_ffi::{resolve, Buffer, FfiError, Loader, TagCache, Value};

const SOURCE: &str = "\
module ocean
  implicit none
contains
  subroutine step(n, dt, x)
    integer :: n
    double precision :: dt
    double precision :: x(n)
    x = x + dt
  end subroutine step

  subroutine substep(n, x)
    integer :: n
    double precision :: x(n)
    x = 2 * x
  end subroutine substep
end module ocean

subroutine scale_single(x, factor)
  real :: x, factor
  x = x * factor
end subroutine scale_single

subroutine count_true(n, flags, total)
  integer :: n, total
  logical(1) :: flags(n)
  total = count(flags)
end subroutine count_true
";

fn tools_available() -> bool {
    ["gfortran", "nm"].iter().all(|tool| {
        Command::new(tool)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    })
}

fn build_library(dir: &Path) -> PathBuf {
    std::fs::write(dir.join("ocean.f90"), SOURCE).unwrap();
    let mut modules = ModuleMap::new();
    modules.insert("ocean".to_string(), SourceList::from("ocean.f90"));
    fbind_build::build(&modules, dir, &Toolchain::new("gfortran", ["-O1"])).unwrap();
    dir.join("ocean")
}

#[test]
fn calls_module_routine_with_array() {
    if !tools_available() {
        eprintln!("gfortran or nm not found, skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let library = build_library(dir.path());

    let step = resolve(&library, "MOD_step").unwrap();
    assert_eq!(step.name(), "__ocean_MOD_step");

    let x = Buffer::new(vec![1.0_f64, 2.0, 3.0]);
    // SAFETY: (integer, double precision, double precision(n)) matches `step`.
    unsafe {
        step.call(&[Value::Int(3), Value::Float64(0.5), x.clone().into()])
            .unwrap();
    }
    assert_eq!(x.to_vec(), [1.5, 2.5, 3.5]);
}

#[test]
fn ambiguous_and_missing_substrings() {
    if !tools_available() {
        eprintln!("gfortran or nm not found, skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let library = build_library(dir.path());

    match resolve(&library, "step").unwrap_err() {
        FfiError::SymbolAmbiguous { candidates, .. } => {
            assert_eq!(candidates.len(), 2);
            assert!(candidates.iter().any(|c| c.ends_with("MOD_step")));
            assert!(candidates.iter().any(|c| c.ends_with("MOD_substep")));
        }
        other => panic!("expected SymbolAmbiguous, got {other:?}"),
    }
    assert!(matches!(
        resolve(&library, "advect"),
        Err(FfiError::SymbolNotFound { .. })
    ));
}

#[test]
fn single_precision_and_logical_arguments() {
    if !tools_available() {
        eprintln!("gfortran or nm not found, skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let library = build_library(dir.path());
    let mut loader = Loader::new();

    let count = loader.resolve(&library, "count_true").unwrap();
    let total = Buffer::new(vec![0_i32]);
    let flags = Buffer::new(vec![true, false, true, true]);
    // SAFETY: (integer, logical(1)(n), integer) matches `count_true`.
    unsafe {
        count
            .bind(&[total.clone().into()])
            .unwrap()
            .call(&[Value::Int(4), flags.into()])
            .unwrap();
    }
    assert_eq!(total.to_vec(), [3]);

    let scale = loader.resolve(&library, "scale_single").unwrap();
    assert_eq!(loader.loaded_count(), 1);
    let x = Buffer::new(vec![1.5_f32]);
    // SAFETY: (real, real) matches `scale_single`; the array holds one element.
    unsafe { scale.call(&[x.clone().into(), Value::Float32(4.0)]).unwrap() };
    assert_eq!(x.to_vec(), [6.0]);
}

#[test]
fn tagged_calls_reuse_first_arguments() {
    if !tools_available() {
        eprintln!("gfortran or nm not found, skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let library = build_library(dir.path());

    let x = Buffer::new(vec![1.0_f64, 1.0]);
    let mut step = resolve(&library, "MOD_step")
        .unwrap()
        .bind(&[x.clone().into()])
        .unwrap();
    let mut cache = TagCache::new();
    // SAFETY: (integer, double precision) followed by x(n) matches `step`.
    unsafe {
        step.call_tagged(&mut cache, "dt", &[Value::Int(2), Value::Float64(1.0)])
            .unwrap();
        step.call_tagged(&mut cache, "dt", &[Value::Int(2), Value::Float64(100.0)])
            .unwrap();
    }
    assert_eq!(x.to_vec(), [3.0, 3.0]);
}
