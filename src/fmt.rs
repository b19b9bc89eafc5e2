//! Human-friendly CLI output formatters.
//!
//! When `color` is true, ANSI escape codes are emitted via `owo_colors`.

use crate::tools::PatchOutput;
use owo_colors::OwoColorize;
use std::io::{self, Write};

/// Writes a patch to `w`, highlighting unified-diff structure when
/// `color` is set.
pub fn fmt_patch(w: &mut impl Write, out: &PatchOutput, color: bool) -> io::Result<()> {
    if !color {
        w.write_all(out.patch.as_bytes())?;
        if !out.patch.ends_with('\n') {
            writeln!(w)?;
        }
        return Ok(());
    }

    for line in out.patch.lines() {
        if line.starts_with("+++") || line.starts_with("---") {
            writeln!(w, "{}", line.bold())?;
        } else if line.starts_with("diff ") || line.starts_with("index ") {
            writeln!(w, "{}", line.bold())?;
        } else if line.starts_with("@@") {
            writeln!(w, "{}", line.cyan())?;
        } else if line.starts_with('+') {
            writeln!(w, "{}", line.green())?;
        } else if line.starts_with('-') {
            writeln!(w, "{}", line.red())?;
        } else {
            writeln!(w, "{line}")?;
        }
    }
    Ok(())
}
