use crate::output::print_json;
use devkit_core::{paths, workspace, DevkitError};
use std::path::Path;

pub fn run(root: &Path, force: bool, json: bool) -> anyhow::Result<()> {
    let info = match workspace::init(root, force) {
        Ok(info) => info,
        Err(DevkitError::AlreadyInitialized(p)) => anyhow::bail!(
            "devkit workspace already exists in {}; use `devkit init --force` to reinitialize",
            p.display()
        ),
        Err(e) => return Err(e.into()),
    };

    if json {
        return print_json(&info);
    }
    println!("Initialized devkit workspace");
    println!("  project:  {}", info.name);
    println!("  type:     {}", info.project_type);
    println!("  location: {}", paths::project_dir(&info.root).display());
    Ok(())
}
