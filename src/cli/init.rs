use std::path::PathBuf;

use crate::error::Result;
use crate::settings::{save_template, LOCAL_SETTINGS_FILE};

pub fn run(path: Option<PathBuf>) -> Result<()> {
    let path = path.unwrap_or_else(|| PathBuf::from(LOCAL_SETTINGS_FILE));
    save_template(&path)?;
    println!("Wrote settings template to {}", path.display());
    println!("Edit the folders, output file, report year and handover day before `workcost run`.");
    Ok(())
}
