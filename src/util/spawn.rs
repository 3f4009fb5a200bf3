//! Utilities for spawning external commands.

use std::process::{Command, Stdio};

use tracing::{debug, warn};

use crate::{Result, TatamiError};

/// Spawns an external command, detached from the host's stdio.
///
/// The command does not inherit the host's stdin or stdout, so a chatty
/// child cannot interleave with the log stream.
pub fn spawn_command(argv: &[String]) -> Result<()> {
    let Some((program, args)) = argv.split_first() else {
        return Err(TatamiError::SpawnProc("empty command".into()));
    };

    debug!(%program, "spawning");

    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .spawn()
        .map_err(|e| {
            warn!(%program, "spawn failed: {e}");
            TatamiError::SpawnProc(format!("{program}: {e}"))
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_command_errors() {
        assert!(matches!(
            spawn_command(&[]),
            Err(TatamiError::SpawnProc(_))
        ));
    }

    #[test]
    fn missing_program_errors() {
        let argv = vec!["definitely-not-a-real-program-tatami".to_string()];
        assert!(spawn_command(&argv).is_err());
    }
}
