//! File-level compilation driver: source file in, linked executable out.
//!
//! The driver owns everything outside the core pipeline: reading the
//! source, writing the `.asm` next to it, and shelling out to `nasm` and
//! `ld`. The external tools report their own failures on stderr; their
//! exit statuses are logged but never turned into a compiler error.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use log::{debug, warn};

pub fn read_file(source: &Path) -> Result<String> {
  fs::read_to_string(source)
    .with_context(|| format!("unable to open input file `{}`", source.display()))
}

/// Compile `source` into a sibling executable: `foo.eko` becomes
/// `foo.asm`, `foo.o`, and finally `foo`.
pub fn compile(source: &Path) -> Result<PathBuf> {
  let contents = read_file(source)?;
  debug!("compiling {}", source.display());

  let asm = crate::generate_assembly(&contents)?;

  let asm_path = source.with_extension("asm");
  fs::write(&asm_path, &asm)
    .with_context(|| format!("unable to write output file `{}`", asm_path.display()))?;
  debug!("wrote {}", asm_path.display());

  let object_path = source.with_extension("o");
  let executable_path = object_path.with_extension("");

  let mut assemble = Command::new("nasm");
  assemble.arg("-felf64").arg(&asm_path);
  run_tool(assemble)?;

  let mut link = Command::new("ld");
  link.arg("-o").arg(&executable_path).arg(&object_path);
  run_tool(link)?;

  Ok(executable_path)
}

/// Wait for an external tool. Spawn failures (tool not installed) are
/// ours to report; a non-zero exit status is the tool's.
fn run_tool(mut command: Command) -> Result<()> {
  let status = command
    .status()
    .with_context(|| format!("failed to run {command:?}"))?;
  if status.success() {
    debug!("{command:?} finished");
  } else {
    warn!("{command:?} exited with {status}");
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn output_paths_sit_next_to_the_source() {
    let source = Path::new("demos/answer.eko");
    assert_eq!(source.with_extension("asm"), Path::new("demos/answer.asm"));
    assert_eq!(
      source.with_extension("o").with_extension(""),
      Path::new("demos/answer")
    );
  }

  #[test]
  fn missing_source_file_is_an_error() {
    let err = read_file(Path::new("no-such-file.eko")).expect_err("read should fail");
    assert!(err.to_string().contains("no-such-file.eko"));
  }
}
