//! Test helpers for running CLI invocations against a scratch data directory.

use super::*;
use tempfile::TempDir;

/// A temporary data directory plus the arguments that point the CLI at it.
pub(super) struct Workspace {
    _dir: TempDir,
    data_dir: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 tempdir");
        Self {
            _dir: dir,
            data_dir: root.join("data"),
        }
    }

    pub(super) fn data_dir(&self) -> &Utf8PathBuf {
        &self.data_dir
    }

    /// Runs `carlease --data-dir <dir> <args...>` and returns stdout.
    pub(super) fn run(&self, args: &[&str]) -> Result<String, CliError> {
        let mut argv = vec![
            "carlease".to_owned(),
            format!("--{ARG_DATA_DIR}"),
            self.data_dir.as_str().to_owned(),
        ];
        argv.extend(args.iter().map(|arg| (*arg).to_owned()));
        let cli = Cli::try_parse_from(argv)?;
        let mut output = Vec::new();
        run_with(cli, &mut output)?;
        Ok(String::from_utf8(output).expect("utf-8 output"))
    }

    /// Runs a command that must succeed and parses its JSON output.
    pub(super) fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.run(args).expect("command should succeed");
        serde_json::from_str(&output).expect("output is JSON")
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("data_dir", &self.data_dir)
            .finish_non_exhaustive()
    }
}
