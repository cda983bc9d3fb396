//! schema command - Print the release schema document

use anyhow::Result;

use crate::changelog::record::RELEASE_SCHEMA_YAML;

/// Print the schema document for release records.
pub fn schema() -> Result<()> {
    print!("{}", RELEASE_SCHEMA_YAML);
    Ok(())
}
