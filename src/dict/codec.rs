//! Adapters around the external compression and trie executables.
//!
//! Each tool is an opaque subprocess with a fixed input/output contract:
//! full input is buffered before the call and full output is read back
//! before the pipeline continues. Stdin is fed from a helper thread so a
//! tool producing output while consuming input cannot deadlock the pipe.

use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{info, warn};

use super::error::{ConvertError, Result};

/// Paths to the external tools, defaulting to `$PATH` lookups.
#[derive(Debug, Clone)]
pub struct CodecShell {
    /// `dictzip`-compatible compressor: invoked with `-k <path>`, produces
    /// a `<path>.dz` sibling.
    pub dictzip: PathBuf,
    /// MARISA trie builder: newline-joined keys on stdin, `-o <path>` for
    /// the output trie.
    pub marisa_build: PathBuf,
    /// MARISA reverse lookup: trie path argument, newline-joined ids on
    /// stdin, tab-separated `(id, key)` lines on stdout.
    pub marisa_reverse_lookup: PathBuf,
}

impl Default for CodecShell {
    fn default() -> Self {
        Self {
            dictzip: PathBuf::from("dictzip"),
            marisa_build: PathBuf::from("marisa-build"),
            marisa_reverse_lookup: PathBuf::from("marisa-reverse-lookup"),
        }
    }
}

impl CodecShell {
    /// Compress `path` in place (keeping the original), producing
    /// `<path>.dz`.
    ///
    /// Compression is the one degraded path in the engine: a missing tool
    /// or nonzero exit leaves the uncompressed file in service and returns
    /// `Ok(false)` after a warning.
    pub fn compress(&self, path: &Path) -> Result<bool> {
        info!("compressing {} with dictzip", path.display());
        let status = Command::new(&self.dictzip).arg("-k").arg(path).status();

        match status {
            Ok(status) if status.success() => Ok(true),
            Ok(status) => {
                warn!(
                    "dictzip exited with {}; keeping {} uncompressed",
                    status,
                    path.display()
                );
                Ok(false)
            }
            Err(e) => {
                warn!(
                    "dictzip could not be run ({}); keeping {} uncompressed",
                    e,
                    path.display()
                );
                Ok(false)
            }
        }
    }

    /// Build a trie index over `keys` at `target`. Fatal on failure: the
    /// target format has no uncompressed fallback for its key index.
    pub fn build_trie(&self, keys: &[&str], target: &Path) -> Result<()> {
        info!(
            "building trie index {} over {} key(s)",
            target.display(),
            keys.len()
        );
        let mut input = String::new();
        for key in keys {
            input.push_str(key);
            input.push('\n');
        }
        self.run_with_stdin(
            &self.marisa_build,
            &[OsStr::new("-o"), target.as_os_str()],
            input.into_bytes(),
        )?;
        Ok(())
    }

    /// Recover keys from a built trie by probing sequential ids.
    ///
    /// Returns the tool's raw stdout: tab-separated `(id, key)` lines.
    pub fn reverse_lookup(&self, trie: &Path, probe_ids: u64) -> Result<String> {
        info!(
            "reverse-looking-up {} id(s) in {}",
            probe_ids,
            trie.display()
        );
        let mut input = String::new();
        for id in 0..probe_ids {
            input.push_str(&id.to_string());
            input.push('\n');
        }
        let stdout = self.run_with_stdin(
            &self.marisa_reverse_lookup,
            &[trie.as_os_str()],
            input.into_bytes(),
        )?;
        String::from_utf8(stdout).map_err(|e| ConvertError::ExternalTool {
            tool: self.marisa_reverse_lookup.display().to_string(),
            reason: format!("non-UTF-8 output: {}", e),
        })
    }

    fn run_with_stdin(&self, tool: &Path, args: &[&OsStr], input: Vec<u8>) -> Result<Vec<u8>> {
        let tool_name = tool.display().to_string();
        let mut child = Command::new(tool)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ConvertError::ExternalTool {
                tool: tool_name.clone(),
                reason: e.to_string(),
            })?;

        // Feed stdin from a helper thread while draining stdout here, so
        // neither pipe can fill up and stall the child.
        let mut stdin = child.stdin.take().ok_or_else(|| ConvertError::ExternalTool {
            tool: tool_name.clone(),
            reason: "stdin unavailable".to_string(),
        })?;
        let feeder = std::thread::spawn(move || {
            // A tool that stops reading early (broken pipe) still reports
            // its failure through the exit status below.
            let _ = stdin.write_all(&input);
        });

        let output = child
            .wait_with_output()
            .map_err(|e| ConvertError::ExternalTool {
                tool: tool_name.clone(),
                reason: e.to_string(),
            })?;
        let _ = feeder.join();

        if !output.status.success() {
            return Err(ConvertError::ExternalTool {
                tool: tool_name,
                reason: format!(
                    "exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(output.stdout)
    }
}
