//! loomc-drv - the compiler driver.
//!
//! Everything outside the front end's core: argument handling, output-file
//! naming, and wiring the parse-and-emit pipeline ([`loomc_par`]) to the
//! external printer ([`loomc_gen`]). One source file in, one `.ll` file
//! out (or none, if the source had errors).

use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _};
use inkwell::context::Context;
use loomc_util::Handler;

/// The one thing this driver's CLI accepts: a single source file path.
/// Anything else - zero arguments, more than one - is a usage error.
pub fn parse_args(args: &[String]) -> anyhow::Result<PathBuf> {
    match args {
        [single] => Ok(PathBuf::from(single)),
        [] => bail!("usage: loomc <source-file>"),
        _ => bail!("usage: loomc <source-file> (expected exactly one argument, got {})", args.len()),
    }
}

/// The output file's name: the input path's basename with a trailing
/// `.txt` extension stripped (any other extension is preserved verbatim)
/// and `.ll` appended. Always a bare file name - the file is written to
/// the current working directory regardless of where the input lives.
pub fn output_path_for(input: &Path) -> PathBuf {
    let basename = input.file_name().and_then(|s| s.to_str()).unwrap_or_default();
    let stripped = basename.strip_suffix(".txt").unwrap_or(basename);
    PathBuf::from(format!("{stripped}.ll"))
}

/// Runs the whole pipeline for one source file: read, compile, and (if
/// error-free) write the `.ll` file. Returns `Ok(())` on success or when
/// diagnostics were reported (per the source language's policy, that's
/// still a clean exit - just one with no output); `Err` only for I/O
/// failure reading the source.
pub fn run(input: &Path) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(input)
        .with_context(|| format!("could not read '{}'", input.display()))?;

    let handler = Handler::new();
    let context = Context::create();
    let module_name = input.file_stem().and_then(|s| s.to_str()).unwrap_or("module");

    let module = loomc_par::compile_module(&context, module_name, &source, &handler);

    if handler.error_count() > 0 {
        eprintln!("{} error(s) generated", handler.error_count());
        return Ok(());
    }

    let module = module.expect("a zero-error compilation always produces a module");
    let out = output_path_for(input);
    loomc_gen::write_module(&module, &out)
        .with_context(|| format!("could not write '{}'", out.display()))?;

    Ok(())
}

/// Entry point called by `main.rs`. Exit code follows §6: 0 on success,
/// 1 for any usage or I/O failure.
pub fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let input = parse_args(&args)?;
    run(&input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_a_trailing_txt_extension() {
        assert_eq!(output_path_for(Path::new("main.txt")), PathBuf::from("main.ll"));
    }

    #[test]
    fn preserves_any_other_extension() {
        assert_eq!(output_path_for(Path::new("main.src")), PathBuf::from("main.src.ll"));
    }

    #[test]
    fn extensionless_input_just_gains_ll() {
        assert_eq!(output_path_for(Path::new("program")), PathBuf::from("program.ll"));
    }

    #[test]
    fn exactly_one_argument_is_required() {
        assert!(parse_args(&[]).is_err());
        assert!(parse_args(&["a".to_string(), "b".to_string()]).is_err());
        assert!(parse_args(&["a".to_string()]).is_ok());
    }
}
