use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

const APP_DIR: &str = "sonic-compass";

/// Global flag to control whether to use system-installed binaries from PATH
/// instead of one shipped next to the executable.
static USE_SYSTEM_DEPS: AtomicBool = AtomicBool::new(false);

static NEXT_SOCKET_ID: AtomicU64 = AtomicU64::new(1);

/// Set whether to use system dependencies (from PATH) instead of bundled ones.
pub fn set_use_system_deps(use_system: bool) {
    USE_SYSTEM_DEPS.store(use_system, Ordering::Relaxed);
}

pub fn should_use_system_deps() -> bool {
    USE_SYSTEM_DEPS.load(Ordering::Relaxed)
}

/// A fresh IPC endpoint name for one preview player.  Unique per process and
/// per call, so any number of players can run side by side.
#[cfg(unix)]
pub fn preview_socket_name() -> String {
    let n = NEXT_SOCKET_ID.fetch_add(1, Ordering::Relaxed);
    format!(
        "{}/sonic-compass-{}-{}.sock",
        std::env::temp_dir().display(),
        std::process::id(),
        n
    )
}

#[cfg(windows)]
pub fn preview_socket_name() -> String {
    let n = NEXT_SOCKET_ID.fetch_add(1, Ordering::Relaxed);
    format!("sonic-compass-{}-{}", std::process::id(), n)
}

#[cfg(unix)]
pub fn mpv_socket_arg(socket_name: &str) -> String {
    format!("--input-ipc-server={}", socket_name)
}

#[cfg(windows)]
pub fn mpv_socket_arg(socket_name: &str) -> String {
    format!("--input-ipc-server=\\\\.\\pipe\\{}", socket_name)
}

pub fn data_dir() -> PathBuf {
    // ~/.local/share/sonic-compass on both Linux and macOS
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join(APP_DIR)
    }
    #[cfg(windows)]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

pub fn config_dir() -> PathBuf {
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join(APP_DIR)
    }

    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

#[cfg(unix)]
pub fn mpv_binary_name() -> &'static str {
    "mpv"
}

#[cfg(windows)]
pub fn mpv_binary_name() -> &'static str {
    "mpv.exe"
}

fn find_on_path(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|p| p.exists())
}

/// Find the mpv binary used for previews.
/// Checks beside the current exe first unless system deps are forced, then PATH.
pub fn find_mpv_binary() -> Option<PathBuf> {
    let exe_name = mpv_binary_name();

    if !should_use_system_deps() {
        if let Ok(current_exe) = std::env::current_exe() {
            if let Some(dir) = current_exe.parent() {
                for candidate in [dir.join(exe_name), dir.join("external").join(exe_name)] {
                    if candidate.exists() {
                        return Some(candidate);
                    }
                }
            }
        }
    }

    find_on_path(exe_name)
}
