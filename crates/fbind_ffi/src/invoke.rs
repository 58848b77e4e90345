//! Raw calls through a routine address with pointer arguments.

use std::ffi::c_void;

use crate::error::FfiError;

/// Most pointer arguments a single call accepts.
pub const MAX_ARGS: usize = 32;

macro_rules! call_with {
    (@ptr $idx:tt) => { *mut c_void };
    ($addr:expr, $args:expr; $($idx:tt)*) => {{
        let routine: unsafe extern "C" fn($(call_with!(@ptr $idx)),*) =
            std::mem::transmute::<*const c_void, _>($addr);
        routine($($args[$idx]),*)
    }};
}

/// Calls the routine at `addr` with `args` as its parameters.
///
/// # Safety
///
/// `addr` must be the address of an `extern "C"` routine taking exactly
/// `args.len()` pointer parameters, each pointer must be valid for the
/// accesses the routine performs, and the routine must not unwind.
pub(crate) unsafe fn invoke(addr: *const c_void, args: &[*mut c_void]) -> Result<(), FfiError> {
    match args.len() {
        0 => call_with!(addr, args;),
        1 => call_with!(addr, args; 0),
        2 => call_with!(addr, args; 0 1),
        3 => call_with!(addr, args; 0 1 2),
        4 => call_with!(addr, args; 0 1 2 3),
        5 => call_with!(addr, args; 0 1 2 3 4),
        6 => call_with!(addr, args; 0 1 2 3 4 5),
        7 => call_with!(addr, args; 0 1 2 3 4 5 6),
        8 => call_with!(addr, args; 0 1 2 3 4 5 6 7),
        9 => call_with!(addr, args; 0 1 2 3 4 5 6 7 8),
        10 => call_with!(addr, args; 0 1 2 3 4 5 6 7 8 9),
        11 => call_with!(addr, args; 0 1 2 3 4 5 6 7 8 9 10),
        12 => call_with!(addr, args; 0 1 2 3 4 5 6 7 8 9 10 11),
        13 => call_with!(addr, args; 0 1 2 3 4 5 6 7 8 9 10 11 12),
        14 => call_with!(addr, args; 0 1 2 3 4 5 6 7 8 9 10 11 12 13),
        15 => call_with!(addr, args; 0 1 2 3 4 5 6 7 8 9 10 11 12 13 14),
        16 => call_with!(addr, args; 0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15),
        17 => call_with!(addr, args; 0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16),
        18 => call_with!(addr, args; 0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17),
        19 => call_with!(addr, args; 0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18),
        20 => call_with!(addr, args; 0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19),
        21 => call_with!(addr, args; 0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20),
        22 => call_with!(addr, args; 0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20 21),
        23 => call_with!(addr, args; 0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20 21 22),
        24 => call_with!(addr, args; 0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20 21 22 23),
        25 => call_with!(addr, args; 0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20 21 22 23 24),
        26 => call_with!(addr, args; 0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20 21 22 23 24 25),
        27 => call_with!(addr, args; 0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20 21 22 23 24 25 26),
        28 => call_with!(addr, args; 0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20 21 22 23 24 25 26 27),
        29 => call_with!(addr, args; 0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20 21 22 23 24 25 26 27 28),
        30 => call_with!(addr, args; 0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20 21 22 23 24 25 26 27 28 29),
        31 => call_with!(addr, args; 0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20 21 22 23 24 25 26 27 28 29 30),
        32 => call_with!(addr, args; 0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20 21 22 23 24 25 26 27 28 29 30 31),
        count => {
            return Err(FfiError::TooManyArguments {
                count,
                max: MAX_ARGS,
            })
        }
    }
    Ok(())
}
