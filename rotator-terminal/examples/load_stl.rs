/// Example: spin an STL file in the terminal
///
/// Usage: cargo run --example load_stl -- path/to/file.stl
use std::env;
use std::path::PathBuf;

use anyhow::Result;
use crossterm::terminal;
use rotator_core::{Geometry, ModelCatalog, ModelDescriptor, RotatorConfig};
use rotator_terminal::TerminalApp;

fn main() -> Result<()> {
    let catalog = match env::args().nth(1) {
        Some(path) => {
            let path = PathBuf::from(path);
            let label = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "model".to_string());
            ModelCatalog::new([ModelDescriptor::new(
                "stl",
                label,
                "stl",
                Geometry::Stl(path),
            )])
        }
        None => {
            eprintln!("No STL file provided, using the builtin shapes...");
            ModelCatalog::builtin()
        }
    };

    let (columns, rows) = terminal::size()?;
    let mut app = TerminalApp::new(&RotatorConfig::default(), catalog, "stl", columns, rows)?;
    app.run()?;
    Ok(())
}
