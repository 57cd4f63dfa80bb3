use std::env;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use anyhow::{Context, Result, bail};

use crate::machine::Launcher;
use crate::scanner::Directory;

pub struct TmuxLauncher;

impl Launcher for TmuxLauncher {
    /// Attaches to the session named after `directory`, creating it first
    /// when absent. Runs after the state machine has restored the terminal,
    /// so tmux inherits a sane tty. Any subprocess failure is fatal.
    fn launch(&mut self, directory: &Directory) -> Result<()> {
        let session = sanitize_session_name(&directory.name);
        let listing = current_listing()?;

        match launch_plan(&session, listing.as_deref()) {
            LaunchPlan::Attach => {
                println!("Attaching to existing session: {session}");
            }
            LaunchPlan::CreateThenAttach => {
                println!("Creating new session: {session}");
                create_session(&session, &directory.full_path)?;
            }
        }

        open_session(&session)
    }
}

/// What `launch` does once the session listing is known: a matching session
/// is attached as-is, anything else gets a fresh detached session first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LaunchPlan {
    Attach,
    CreateThenAttach,
}

fn launch_plan(session: &str, listing: Option<&str>) -> LaunchPlan {
    match listing {
        Some(listing) if listing_has_session(listing, session) => LaunchPlan::Attach,
        _ => LaunchPlan::CreateThenAttach,
    }
}

/// Maps a directory name onto a tmux-safe session name: everything outside
/// alphanumerics, hyphen, and underscore becomes an underscore.
pub fn sanitize_session_name(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

fn current_listing() -> Result<Option<String>> {
    let output = Command::new("tmux")
        .arg("list-sessions")
        .stdin(Stdio::null())
        .output()
        .context("failed to run tmux list-sessions")?;

    // A nonzero exit usually means no server is running yet; that is just
    // "no sessions", not an error.
    if !output.status.success() {
        return Ok(None);
    }

    Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
}

/// `tmux list-sessions` prints one `name: ...` line per session; an exact
/// colon-terminated prefix avoids matching sessions that merely share a
/// name prefix.
fn listing_has_session(listing: &str, session: &str) -> bool {
    let prefix = format!("{session}:");
    listing.lines().any(|line| line.starts_with(&prefix))
}

fn create_session(session: &str, working_dir: &Path) -> Result<()> {
    let output = Command::new("tmux")
        .args(["new-session", "-d", "-s", session, "-c"])
        .arg(working_dir)
        .stdin(Stdio::null())
        .output()
        .context("failed to run tmux new-session")?;
    ensure_success(&output, "tmux new-session")
}

fn open_session(session: &str) -> Result<()> {
    // Inside an existing session the client is switched, which keeps the
    // outer session alive; outside, attach directly.
    let args: &[&str] = if env::var_os("TMUX").is_some() {
        &["switch-client", "-t"]
    } else {
        &["attach", "-t"]
    };

    let status = Command::new("tmux")
        .args(args)
        .arg(session)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .context("failed to run tmux attach")?;

    if !status.success() {
        bail!("tmux attach exited with {status}");
    }
    Ok(())
}

fn ensure_success(output: &Output, what: &str) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        bail!("{what} exited with {}", output.status);
    }
    bail!("{what} exited with {}: {stderr}", output.status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_everything_outside_the_safe_set() {
        assert_eq!(sanitize_session_name("my project!"), "my_project_");
        assert_eq!(sanitize_session_name("api.server"), "api_server");
        assert_eq!(sanitize_session_name("dots & spaces"), "dots___spaces");
    }

    #[test]
    fn safe_names_pass_through_unchanged() {
        assert_eq!(sanitize_session_name("my-repo_2"), "my-repo_2");
    }

    #[test]
    fn listing_matches_on_exact_colon_prefix() {
        let listing = "dev: 2 windows (created Mon)\n\
                       devtools: 1 windows (created Tue)\n\
                       notes: 1 windows (created Tue)\n";

        assert!(listing_has_session(listing, "dev"));
        assert!(listing_has_session(listing, "devtools"));
        assert!(!listing_has_session(listing, "devt"));
        assert!(!listing_has_session(listing, "prod"));
    }

    #[test]
    fn empty_listing_matches_nothing() {
        assert!(!listing_has_session("", "dev"));
    }

    #[test]
    fn existing_session_attaches_without_creating() {
        let session = sanitize_session_name("my project!");
        let listing = "my_project_: 1 windows (created Mon)\nnotes: 2 windows (created Tue)\n";

        assert_eq!(launch_plan(&session, Some(listing)), LaunchPlan::Attach);
    }

    #[test]
    fn absent_session_is_created_before_attaching() {
        let listing = "notes: 2 windows (created Tue)\n";

        assert_eq!(
            launch_plan("my_project_", Some(listing)),
            LaunchPlan::CreateThenAttach
        );
    }

    #[test]
    fn missing_server_counts_as_no_sessions() {
        assert_eq!(launch_plan("dev", None), LaunchPlan::CreateThenAttach);
    }
}
