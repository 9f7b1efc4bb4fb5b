//! Persist the high score to disk (XDG config or ~/.config/tetrui).

use anyhow::{Context, Result};
use log::warn;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "tetrui";
const FILENAME: &str = "highscore";

/// Default location: config dir / tetrui / highscore.
pub fn default_path() -> PathBuf {
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from(".")),
    };
    base.join(APP_DIR).join(FILENAME)
}

/// Load the high score. Missing or unparsable files count as 0.
pub fn load_high_score(path: &Path) -> u32 {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return 0,
    };
    match content.trim().parse::<u32>() {
        Ok(n) => n,
        Err(e) => {
            warn!("ignoring unreadable high score in {}: {}", path.display(), e);
            0
        }
    }
}

/// Save the high score, replacing the old value in one rename so it is never half-written.
pub fn save_high_score(path: &Path, score: u32) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, format!("{score}\n")).with_context(|| format!("writing {}", tmp.display()))?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("replacing {}", path.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tetrui-test-{}-{}", std::process::id(), name));
        let _ = fs::remove_dir_all(&dir);
        dir.join(FILENAME)
    }

    #[test]
    fn test_missing_file_is_zero() {
        let path = scratch("missing");
        assert_eq!(load_high_score(&path), 0);
    }

    #[test]
    fn test_garbage_is_zero() {
        let path = scratch("garbage");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not a number").unwrap();
        assert_eq!(load_high_score(&path), 0);
        fs::write(&path, "-5").unwrap();
        assert_eq!(load_high_score(&path), 0);
    }

    #[test]
    fn test_save_then_load() {
        let path = scratch("roundtrip");
        save_high_score(&path, 1234).unwrap();
        assert_eq!(load_high_score(&path), 1234);
        save_high_score(&path, 99).unwrap();
        assert_eq!(load_high_score(&path), 99);
        assert!(!path.with_extension("tmp").exists());
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_load_tolerates_whitespace() {
        let path = scratch("whitespace");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "  4200 \n").unwrap();
        assert_eq!(load_high_score(&path), 4200);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
