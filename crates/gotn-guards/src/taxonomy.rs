//! The guard category table (§4.9).
//!
//! Adding a category means adding a match arm here; nothing downstream
//! needs to change since callers only see pass/fail.

use std::net::TcpListener;
use std::path::Path;

/// Outcome of evaluating a single guard string.
pub enum GuardCheck {
    /// The guard's precondition holds.
    Pass,
    /// The guard's precondition does not hold.
    Fail,
}

/// Evaluate one guard expression against `workspace_root`. Unknown guards
/// pass — the taxonomy is a denylist of known-bad conditions, not an
/// allowlist of known-good ones.
pub fn evaluate_guard(guard: &str, workspace_root: &Path) -> GuardCheck {
    match guard {
        "missing" | "unavailable" => GuardCheck::Fail,
        _ => {
            if let Some(port) = guard
                .strip_prefix("port:")
                .or_else(|| guard.strip_prefix("port_available:"))
            {
                return check_port(port);
            }
            if let Some(path) = guard
                .strip_prefix("file:")
                .or_else(|| guard.strip_prefix("file_exists:"))
            {
                return check_file(workspace_root, path);
            }
            GuardCheck::Pass
        }
    }
}

fn check_port(port: &str) -> GuardCheck {
    let Ok(port) = port.parse::<u16>() else {
        return GuardCheck::Pass;
    };
    match TcpListener::bind(("127.0.0.1", port)) {
        Ok(listener) => {
            drop(listener);
            GuardCheck::Pass
        }
        Err(_) => GuardCheck::Fail,
    }
}

fn check_file(workspace_root: &Path, path: &str) -> GuardCheck {
    if workspace_root.join(path).exists() {
        GuardCheck::Pass
    } else {
        GuardCheck::Fail
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_unavailable_always_fail() {
        let root = Path::new("/tmp");
        assert!(matches!(evaluate_guard("missing", root), GuardCheck::Fail));
        assert!(matches!(
            evaluate_guard("unavailable", root),
            GuardCheck::Fail
        ));
    }

    #[test]
    fn unknown_guard_passes() {
        let root = Path::new("/tmp");
        assert!(matches!(
            evaluate_guard("whatever", root),
            GuardCheck::Pass
        ));
    }

    #[test]
    fn file_exists_guard_checks_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("present.txt"), b"x").unwrap();

        assert!(matches!(
            evaluate_guard("file:present.txt", dir.path()),
            GuardCheck::Pass
        ));
        assert!(matches!(
            evaluate_guard("file_exists:absent.txt", dir.path()),
            GuardCheck::Fail
        ));
    }

    #[test]
    fn port_available_guard_passes_for_free_port() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let root = Path::new("/tmp");
        assert!(matches!(
            evaluate_guard(&format!("port_available:{port}"), root),
            GuardCheck::Pass
        ));
    }

    #[test]
    fn port_guard_fails_when_bound() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let port = listener.local_addr().unwrap().port();

        let root = Path::new("/tmp");
        assert!(matches!(
            evaluate_guard(&format!("port:{port}"), root),
            GuardCheck::Fail
        ));
    }
}
