//! `fbind call`: invoke a library routine with literal arguments.

use fbind_ffi::{marshal_all, Loader, Value};

use crate::pipeline::locate_library;
use crate::{CallArgs, GlobalArgs};

/// Runs the `fbind call` command.
///
/// Arguments are parsed from `type:value` literals, marshaled into pointers
/// and passed to the single routine matching `args.symbol`. Arrays, which the
/// routine may have written to, are printed afterwards.
pub fn run(args: &CallArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let values = parse_arguments(&args.args)?;
    let target = locate_library(&args.library, global)?;

    let mut loader = Loader::with_symbol_tool(target.symbol_tool);
    let function = loader.resolve(&target.path, &args.symbol)?;
    let mut marshaled = marshal_all(&values)?;

    if !global.quiet {
        eprintln!(
            "     Calling {} with {} argument(s)",
            function.name(),
            marshaled.len()
        );
    }

    // SAFETY: the command line promises that the literals match the routine's
    // parameter list; nothing else can be checked across the C ABI.
    unsafe { function.call_marshaled(&mut marshaled)? };

    for line in array_lines(&values) {
        println!("{line}");
    }
    Ok(0)
}

/// Parses every literal, failing on the first invalid one.
fn parse_arguments(literals: &[String]) -> Result<Vec<Value>, fbind_ffi::FfiError> {
    literals.iter().map(|literal| literal.parse::<Value>()).collect()
}

/// One line per array argument: position, element type, length and contents.
fn array_lines(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .enumerate()
        .filter_map(|(index, value)| match value {
            Value::Array(array) => Some(format!(
                "arg {index} ({}[{}]): {array}",
                array.element_type(),
                array.len()
            )),
            _ => None,
        })
        .collect()
}
