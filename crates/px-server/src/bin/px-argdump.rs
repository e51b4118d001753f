//! Sample child program for `EXEC`
//!
//! Writes its argument count and argument vector to `process_output.txt` in
//! the current directory, so a client can see exactly what the server passed.

use std::fmt::Write as _;

use anyhow::{Context, Result};

const OUTPUT_FILE: &str = "process_output.txt";

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    let mut report = String::new();
    writeln!(report, "argc: {}", args.len())?;
    for (i, arg) in args.iter().enumerate() {
        writeln!(report, "argv[{}]: {}", i, arg)?;
    }

    std::fs::write(OUTPUT_FILE, report)
        .with_context(|| format!("Failed to write {}", OUTPUT_FILE))?;
    Ok(())
}
