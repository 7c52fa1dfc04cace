// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Well-known image source locations that can be fed to the scanner

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::files::{exists, is_dir, list_children};

/// Path of the WeChat data container under the user's home directory
#[cfg(target_os = "macos")]
pub fn well_known_base() -> Option<PathBuf> {
    dirs::home_dir().map(|home| {
        home.join("Library/Containers/com.tencent.xinWeChat/Data/Library/Application Support/com.tencent.xinWeChat")
    })
}

#[cfg(not(target_os = "macos"))]
pub fn well_known_base() -> Option<PathBuf> {
    None
}

/// `base/<version>/<account>/Message` directories that exist
pub fn find_message_folders(base: &Path) -> Vec<PathBuf> {
    let versions = match list_children(base) {
        Ok(children) => children,
        Err(e) => {
            debug!("No well-known source at {:?}: {}", base, e);
            return Vec::new();
        }
    };

    versions
        .into_iter()
        .filter(|v| is_dir(v))
        .flat_map(|version| list_children(&version).unwrap_or_default())
        .filter(|account| is_dir(account))
        .map(|account| account.join("Message"))
        .filter(|message| exists(message))
        .collect()
}

/// Message folders under the platform's well-known location
pub fn well_known_roots() -> Vec<PathBuf> {
    well_known_base()
        .map(|base| find_message_folders(&base))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_find_message_folders() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        fs::create_dir_all(base.join("2.0b4/userA/Message")).unwrap();
        fs::create_dir_all(base.join("2.0b4/userB")).unwrap();
        fs::create_dir_all(base.join("3.1/userC/Message")).unwrap();
        fs::write(base.join("stray.txt"), b"x").unwrap();

        let found = find_message_folders(base);
        assert_eq!(
            found,
            vec![
                base.join("2.0b4/userA/Message"),
                base.join("3.1/userC/Message"),
            ]
        );
    }

    #[test]
    fn test_missing_base() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_message_folders(&dir.path().join("nope")).is_empty());
    }
}
