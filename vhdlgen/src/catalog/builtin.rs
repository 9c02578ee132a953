//! Built-in component libraries.
//!
//! The stock libraries are embedded as JSON so the CLI and tests work
//! without any library files on disk. Users can load additional libraries
//! from JSON files next to their projects.

use super::Library;

const EMBEDDED_IO: &str = include_str!("../../libraries/io.json");
const EMBEDDED_GATES: &str = include_str!("../../libraries/gates.json");

/// Parse and return the embedded stock libraries.
pub fn builtin_libraries() -> Vec<Library> {
    let embedded = [EMBEDDED_IO, EMBEDDED_GATES];

    let mut libraries = Vec::new();
    for json in embedded {
        match serde_json::from_str::<Library>(json) {
            Ok(library) => libraries.push(library),
            Err(e) => {
                tracing::warn!("Failed to parse embedded library: {}", e);
            }
        }
    }
    libraries
}
