//! Layered runtime settings: built-in defaults, then an optional TOML file,
//! then `SCOLARITE_*` environment variables. Command-line flags are applied
//! on top by the caller.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  /// SQLite database file. A leading `~/` is expanded.
  pub store_path: PathBuf,
  pub host:       String,
  pub port:       u16,
}

impl Settings {
  pub fn load(file: &Path) -> anyhow::Result<Self> {
    let settings: Settings = config::Config::builder()
      .set_default("store_path", "~/.local/share/scolarite/scolarite.db")?
      .set_default("host", "127.0.0.1")?
      .set_default("port", 8080)?
      .add_source(config::File::from(file).required(false))
      .add_source(config::Environment::with_prefix("SCOLARITE"))
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise settings")?;

    Ok(Settings { store_path: expand_tilde(&settings.store_path), ..settings })
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_apply_without_a_file() {
    let settings = Settings::load(Path::new("/nonexistent/scolarite.toml")).unwrap();
    assert_eq!(settings.port, 8080);
    assert!(settings.store_path.ends_with("scolarite.db"));
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/x.db")), PathBuf::from(home).join("x.db"));
    assert_eq!(expand_tilde(Path::new("/abs/x.db")), PathBuf::from("/abs/x.db"));
  }
}
