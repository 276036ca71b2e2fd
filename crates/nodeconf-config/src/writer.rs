//! Document output.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::loader::ConfigError;

/// Write `contents` to `path` atomically: a sibling `.tmp` file is written
/// first and renamed over the target.
pub fn write_document(path: impl AsRef<Path>, contents: &str) -> Result<(), ConfigError> {
    let target = path.as_ref();
    if let Some(dir) = target.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir)?;
    }

    let mut tmp_name = target.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = target.with_file_name(tmp_name);

    fs::write(&tmp, contents.as_bytes())?;
    if let Err(e) = fs::rename(&tmp, target) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }

    debug!(path = %target.display(), bytes = contents.len(), "document written");
    Ok(())
}
