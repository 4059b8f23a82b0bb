use std::env;
use std::path::{Path, PathBuf};

use crate::device::common::constants::{NVIDIA_SETTINGS, NVIDIA_SMI, OPTIRUN};

/// Locate an executable on PATH, like GLib's `find_program_in_path`.
pub fn find_program_in_path(program: &str) -> Option<PathBuf> {
    if program.contains(std::path::MAIN_SEPARATOR) {
        let path = PathBuf::from(program);
        return is_executable(&path).then_some(path);
    }

    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

pub fn has_nvidia_smi() -> bool {
    find_program_in_path(NVIDIA_SMI).is_some()
}

pub fn has_nvidia_settings() -> bool {
    find_program_in_path(NVIDIA_SETTINGS).is_some()
}

pub fn has_optirun() -> bool {
    find_program_in_path(OPTIRUN).is_some()
}
