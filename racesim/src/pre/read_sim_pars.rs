use crate::core::race::SimConstants;
use anyhow::Context;
use std::fs::OpenOptions;
use std::path::Path;

/// read_sim_constants reads the JSON file and decodes the JSON string into
/// the simulation constants struct. Missing fields fall back to the built-in
/// defaults; the result is validated before it is returned.
pub fn read_sim_constants(filepath: &Path) -> anyhow::Result<SimConstants> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!(
            "Failed to open simulation constants file {}!",
            filepath.to_string_lossy()
        ))?;

    let consts: SimConstants = serde_json::from_reader(&fh).context(format!(
        "Failed to parse simulation constants file {}!",
        filepath.to_string_lossy()
    ))?;
    consts.validate()?;
    Ok(consts)
}

/// load_sim_constants returns the constants from the given file, or the
/// built-in defaults when no file was provided.
pub fn load_sim_constants(filepath: Option<&Path>) -> anyhow::Result<SimConstants> {
    match filepath {
        Some(filepath) => read_sim_constants(filepath),
        None => Ok(SimConstants::default()),
    }
}
