//! Input, output and dump directory resolution

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use texurl::DEFAULT_DUMP_DIR;

/// Suffix appended to the input stem for the default output file
const OUTPUT_SUFFIX: &str = " TeXURL_out.tex";

/// Resolved locations for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub input: PathBuf,
    pub output: PathBuf,
    pub dump_dir: PathBuf,
    /// Directory the output lives in; emitted links are relative to it
    pub output_dir: PathBuf,
    /// Human-readable notes about rejected overrides
    pub notices: Vec<String>,
}

/// Resolve all paths, falling back to defaults for unusable overrides
pub fn resolve(input: &Path, output: Option<&Path>, dump: Option<&Path>) -> Result<Paths> {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base_dir = absolute_parent(input)?;

    if !input.is_file() {
        bail!(
            "No file named \"{}\" was found at \"{}\"",
            name,
            base_dir.display()
        );
    }
    let input = input
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", input.display()))?;
    let base_dir = input.parent().map(Path::to_path_buf).unwrap_or(base_dir);

    let mut notices = Vec::new();

    let default_output = base_dir.join(default_output_name(&input));
    let output = match output {
        Some(path) if is_writable_target(path) => path.to_path_buf(),
        Some(path) => {
            notices.push(format!(
                "\"{}\" is not a valid file (or file name). Switching to the default instead. Default = \"{}\"",
                path.display(),
                default_output.display()
            ));
            default_output
        }
        None => default_output,
    };

    let default_dump = base_dir.join(DEFAULT_DUMP_DIR);
    let dump_dir = match dump {
        Some(path) if !path.exists() || path.is_dir() => path.to_path_buf(),
        Some(path) => {
            notices.push(format!(
                "\"{}\" is not a valid directory. Switching to the default instead. Default = \"{}\"",
                path.display(),
                default_dump.display()
            ));
            default_dump
        }
        None => default_dump,
    };

    let output = make_absolute(&output)?;
    let dump_dir = make_absolute(&dump_dir)?;
    let output_dir = output
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| base_dir.clone());

    Ok(Paths {
        input,
        output,
        dump_dir,
        output_dir,
        notices,
    })
}

/// `<stem> TeXURL_out.tex`
pub fn default_output_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{stem}{OUTPUT_SUFFIX}")
}

/// A target is usable when it is not a directory and its parent exists
fn is_writable_target(path: &Path) -> bool {
    if path.is_dir() || path.file_name().is_none() {
        return false;
    }
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => true,
        Some(parent) => parent.is_dir(),
        None => false,
    }
}

fn make_absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Ok(cwd.join(path))
}

fn absolute_parent(input: &Path) -> Result<PathBuf> {
    let abs = make_absolute(input)?;
    Ok(abs.parent().map(Path::to_path_buf).unwrap_or(abs))
}
