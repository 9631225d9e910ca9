//! loomc-gen - the external printer.
//!
//! The front end's job ends at a finished `inkwell::module::Module`; this
//! crate's only job is turning that module into the textual IR file the
//! driver writes out. It is deliberately thin - no optimization, no target
//! lowering, no register allocation - those belong to the assembler this
//! IR is handed off to, not to this compiler.

pub mod error;

use std::path::Path;

use inkwell::module::Module;

pub use error::{CodeGenError, Result};

/// Serializes `module` to LLVM's textual IR and writes it to `path`,
/// overwriting any existing file.
pub fn write_module(module: &Module<'_>, path: &Path) -> Result<()> {
    let ir = module.print_to_string().to_string();
    std::fs::write(path, ir).map_err(|source| CodeGenError::Write {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkwell::context::Context;

    #[test]
    fn writes_the_modules_textual_ir_to_the_given_path() {
        let context = Context::create();
        let module = context.create_module("probe");
        let dir = tempfile::tempdir().expect("creating a temp dir cannot fail here");
        let path = dir.path().join("probe.ll");

        write_module(&module, &path).expect("writing a fresh module cannot fail");

        let written = std::fs::read_to_string(&path).expect("the file was just written");
        assert!(written.contains("probe"));
    }

    #[test]
    fn reports_an_error_for_an_unwritable_path() {
        let context = Context::create();
        let module = context.create_module("probe");
        let bad_path = Path::new("/nonexistent-directory/probe.ll");

        let result = write_module(&module, bad_path);
        assert!(result.is_err());
    }
}
