//! Harness configuration
//!
//! Every constant the harness depends on (artifact suffixes, the case
//! directory, the two compiler commands) lives in one [`HarnessConfig`] value
//! that is handed to the harness at construction.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// An external program plus the flags appended after its fixed
/// `<input> -o <output>` arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCommand {
    pub program: PathBuf,
    pub extra_args: Vec<String>,
}

impl StageCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    /// Append one flag after the fixed arguments.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Short name used in status labels (`gcc` for `/usr/bin/gcc`).
    pub fn display_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }
}

/// Configuration for a harness run
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Suffix of the source files cases are discovered from
    pub source_suffix: String,
    /// Suffix of the file the domain compiler produces
    pub intermediate_suffix: String,
    /// Suffix of the native binary
    pub binary_suffix: String,
    /// Suffix of the golden reference file
    pub reference_suffix: String,
    /// Suffix of the captured-output artifact
    pub output_suffix: String,
    /// Directory holding every case artifact
    pub case_directory: PathBuf,
    /// Stage 1: source -> intermediate
    pub domain_compiler: StageCommand,
    /// Stage 2: intermediate -> binary
    pub native_compiler: StageCommand,
    /// Wall-clock limit for running a compiled binary (None = wait forever)
    pub timeout: Option<Duration>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            source_suffix: ".mat".to_string(),
            intermediate_suffix: ".c".to_string(),
            binary_suffix: ".exe".to_string(),
            reference_suffix: ".test".to_string(),
            output_suffix: ".out".to_string(),
            case_directory: PathBuf::from("tests"),
            domain_compiler: StageCommand::new("./matlang2c"),
            native_compiler: StageCommand::new("gcc").with_arg(math_library_flag("m")),
            timeout: None,
        }
    }
}

impl HarnessConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the directory cases are discovered in
    pub fn with_case_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.case_directory = dir.into();
        self
    }

    pub fn with_source_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.source_suffix = suffix.into();
        self
    }

    pub fn with_intermediate_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.intermediate_suffix = suffix.into();
        self
    }

    pub fn with_binary_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.binary_suffix = suffix.into();
        self
    }

    pub fn with_reference_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.reference_suffix = suffix.into();
        self
    }

    pub fn with_output_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.output_suffix = suffix.into();
        self
    }

    /// Set the stage-1 (domain) compiler
    pub fn with_domain_compiler(mut self, command: StageCommand) -> Self {
        self.domain_compiler = command;
        self
    }

    /// Set the stage-2 (native) compiler
    pub fn with_native_compiler(mut self, command: StageCommand) -> Self {
        self.native_compiler = command;
        self
    }

    /// Limit how long a compiled binary may run
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Paths of the five artifacts belonging to `case`.
    pub fn case_paths(&self, case: &str) -> CasePaths {
        let dir = self.case_directory.as_path();
        CasePaths {
            source: artifact(dir, case, &self.source_suffix),
            intermediate: artifact(dir, case, &self.intermediate_suffix),
            binary: artifact(dir, case, &self.binary_suffix),
            reference: artifact(dir, case, &self.reference_suffix),
            output: artifact(dir, case, &self.output_suffix),
        }
    }
}

/// The artifacts sharing one case's base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CasePaths {
    pub source: PathBuf,
    pub intermediate: PathBuf,
    pub binary: PathBuf,
    pub reference: PathBuf,
    pub output: PathBuf,
}

/// `-l<name>`, the linker flag for a library.
pub fn math_library_flag(name: &str) -> String {
    format!("-l{}", name)
}

fn artifact(dir: &Path, case: &str, suffix: &str) -> PathBuf {
    dir.join(format!("{}{}", case, suffix))
}
