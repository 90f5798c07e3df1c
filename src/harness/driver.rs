//! Batch driver
//!
//! Cases run one at a time in ascending name order. Each case walks the state
//! machine
//!
//! ```text
//! Start -> Stage1Done -> Stage2Done -> Executed -> Compared -> Done
//! ```
//!
//! and any failed transition jumps straight to `Done` with the matching
//! [`CaseFailure`]. A failing case never stops the batch.

use std::path::Path;
use std::time::{Duration, Instant};

use crate::config::HarnessConfig;

use super::compare::write_and_compare;
use super::discovery::{CaseName, discover_cases};
use super::error::HarnessResult;
use super::interfaces::{BinaryExecutor, CommandStage, Executor, StageRunner};
use super::reporter::CaseReporter;

/// Why a case did not pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseFailure {
    /// The domain compiler exited nonzero, crashed or could not be started
    Stage1Failure,
    /// The native compiler exited nonzero, crashed or could not be started
    Stage2Failure,
    /// The binary ran but its output differs from the reference
    ComparisonMismatch,
    /// The binary could not be started or exceeded the timeout
    ExecutionFailure,
    /// The output artifact could not be written or the reference read
    ArtifactFailure,
}

/// Final verdict for one case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseOutcome {
    Success,
    Failed(CaseFailure),
}

impl CaseOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CaseOutcome::Success)
    }

    /// Status label printed after the case name. Stage failures name the
    /// compiler that failed (`ERROR: gcc`). When both compilers share a name
    /// the stage is spelled out too (`ERROR: stage2 (cc)`).
    pub fn label(&self, stage1: &str, stage2: &str) -> String {
        let stage_error = |stage: &str, name: &str| {
            if stage1 == stage2 {
                format!("ERROR: {} ({})", stage, name)
            } else {
                format!("ERROR: {}", name)
            }
        };
        match self {
            CaseOutcome::Success => "SUCCESS".to_string(),
            CaseOutcome::Failed(CaseFailure::ComparisonMismatch) => "FAILED".to_string(),
            CaseOutcome::Failed(CaseFailure::Stage1Failure) => stage_error("stage1", stage1),
            CaseOutcome::Failed(CaseFailure::Stage2Failure) => stage_error("stage2", stage2),
            CaseOutcome::Failed(CaseFailure::ExecutionFailure) => "ERROR: execute".to_string(),
            CaseOutcome::Failed(CaseFailure::ArtifactFailure) => "ERROR: artifact".to_string(),
        }
    }
}

/// Everything the reporter learns about a finished case.
#[derive(Debug, Clone)]
pub struct CaseReport {
    pub case: CaseName,
    pub outcome: CaseOutcome,
    pub status: String,
    pub duration: Duration,
}

/// Summary of a harness run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration: Duration,
}

impl RunSummary {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Per-case pipeline position.
#[derive(Debug)]
enum CaseState {
    Start,
    Stage1Done,
    Stage2Done,
    Executed(Vec<u8>),
    Compared(bool),
    Done(CaseOutcome),
}

/// The configured pipeline: two compile stages, an executor and the
/// comparison step, applied to every discovered case.
pub struct Harness {
    config: HarnessConfig,
    domain: Box<dyn StageRunner>,
    native: Box<dyn StageRunner>,
    executor: Box<dyn Executor>,
    filter: Option<String>,
}

impl Harness {
    /// A harness that runs the compilers and binaries named in `config`.
    pub fn new(config: HarnessConfig) -> Self {
        let domain = Box::new(CommandStage::new(config.domain_compiler.clone()));
        let native = Box::new(CommandStage::new(config.native_compiler.clone()));
        let executor = Box::new(BinaryExecutor::new(config.timeout));
        Self::with_components(config, domain, native, executor)
    }

    /// A harness with caller-supplied collaborators.
    pub fn with_components(
        config: HarnessConfig,
        domain: Box<dyn StageRunner>,
        native: Box<dyn StageRunner>,
        executor: Box<dyn Executor>,
    ) -> Self {
        Self {
            config,
            domain,
            native,
            executor,
            filter: None,
        }
    }

    /// Only run cases whose name contains `keyword`.
    pub fn with_filter(mut self, keyword: impl Into<String>) -> Self {
        self.filter = Some(keyword.into());
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Discovered cases after filtering, in run order.
    pub fn cases(&self) -> HarnessResult<Vec<CaseName>> {
        let cases = discover_cases(&self.config.case_directory, &self.config.source_suffix)?;
        Ok(match &self.filter {
            Some(keyword) => cases.into_iter().filter(|c| c.as_str().contains(keyword.as_str())).collect(),
            None => cases,
        })
    }

    /// Discover and run every case, reporting each as it finishes.
    pub fn run(&self, reporter: &mut dyn CaseReporter) -> HarnessResult<RunSummary> {
        let start = Instant::now();
        let cases = self.cases()?;

        tracing::info!(count = cases.len(), dir = %self.config.case_directory.display(), "collected cases");
        reporter.on_collection_complete(cases.len());

        let mut summary = RunSummary {
            total: cases.len(),
            ..RunSummary::default()
        };
        for case in &cases {
            let report = self.run_case(case, reporter);
            if report.outcome.is_success() {
                summary.passed += 1;
            } else {
                summary.failed += 1;
            }
        }
        summary.duration = start.elapsed();

        reporter.on_run_complete(&summary);
        Ok(summary)
    }

    /// Drive one case to `Done` and report it.
    #[tracing::instrument(skip_all, fields(case = %case))]
    pub fn run_case(&self, case: &CaseName, reporter: &mut dyn CaseReporter) -> CaseReport {
        let start = Instant::now();
        let paths = self.config.case_paths(case.as_str());

        let mut state = CaseState::Start;
        let outcome = loop {
            state = match state {
                CaseState::Start => {
                    if self.run_stage(self.domain.as_ref(), case, &paths.source, &paths.intermediate, reporter) {
                        CaseState::Stage1Done
                    } else {
                        CaseState::Done(CaseOutcome::Failed(CaseFailure::Stage1Failure))
                    }
                }
                CaseState::Stage1Done => {
                    if self.run_stage(self.native.as_ref(), case, &paths.intermediate, &paths.binary, reporter) {
                        CaseState::Stage2Done
                    } else {
                        CaseState::Done(CaseOutcome::Failed(CaseFailure::Stage2Failure))
                    }
                }
                CaseState::Stage2Done => match self.executor.execute(&paths.binary) {
                    Ok(stdout) => CaseState::Executed(stdout),
                    Err(e) => {
                        tracing::warn!(error = %e, "execution failed");
                        CaseState::Done(CaseOutcome::Failed(CaseFailure::ExecutionFailure))
                    }
                },
                CaseState::Executed(stdout) => match write_and_compare(&stdout, &paths.output, &paths.reference) {
                    Ok(matched) => CaseState::Compared(matched),
                    Err(e) => {
                        tracing::warn!(error = %e, "comparison failed");
                        CaseState::Done(CaseOutcome::Failed(CaseFailure::ArtifactFailure))
                    }
                },
                CaseState::Compared(true) => CaseState::Done(CaseOutcome::Success),
                CaseState::Compared(false) => CaseState::Done(CaseOutcome::Failed(CaseFailure::ComparisonMismatch)),
                CaseState::Done(outcome) => break outcome,
            };
        };

        let report = CaseReport {
            case: case.clone(),
            outcome,
            status: outcome.label(&self.domain.name(), &self.native.name()),
            duration: start.elapsed(),
        };
        reporter.on_case_complete(&report);
        report
    }

    fn run_stage(
        &self,
        stage: &dyn StageRunner,
        case: &CaseName,
        input: &Path,
        output: &Path,
        reporter: &mut dyn CaseReporter,
    ) -> bool {
        let name = stage.name();
        reporter.on_stage_start(case, &name, input);
        match stage.compile(input, output) {
            Ok(result) => {
                if !result.success() {
                    tracing::debug!(stage = %name, exit_code = ?result.exit_code, "stage failed");
                }
                result.success()
            }
            Err(e) => {
                tracing::warn!(stage = %name, error = %e, "stage could not be started");
                false
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::harness::error::HarnessError;
    use crate::harness::interfaces::CompileResult;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::fs;
    use std::path::PathBuf;
    use std::rc::Rc;

    type CallLog = Rc<RefCell<Vec<String>>>;

    /// Fails for every input whose file stem is in `failing`.
    struct FakeStage {
        name: &'static str,
        failing: HashSet<&'static str>,
        log: CallLog,
    }

    impl StageRunner for FakeStage {
        fn name(&self) -> String {
            self.name.to_string()
        }

        fn compile(&self, input: &Path, _output: &Path) -> HarnessResult<CompileResult> {
            let stem = input.file_stem().unwrap().to_string_lossy().into_owned();
            self.log.borrow_mut().push(format!("{}:{}", self.name, stem));
            let exit_code = if self.failing.contains(stem.as_str()) { 1 } else { 0 };
            Ok(CompileResult {
                exit_code: Some(exit_code),
            })
        }
    }

    /// Prints `<stem>\n` unless told otherwise.
    struct FakeExecutor {
        outputs: Vec<(&'static str, &'static str)>,
        log: CallLog,
    }

    impl Executor for FakeExecutor {
        fn execute(&self, binary: &Path) -> HarnessResult<Vec<u8>> {
            let stem = binary.file_stem().unwrap().to_string_lossy().into_owned();
            self.log.borrow_mut().push(format!("run:{}", stem));
            if stem == "hang" {
                return Err(HarnessError::Timeout {
                    program: binary.to_path_buf(),
                    limit: Duration::from_secs(1),
                });
            }
            let bytes = self
                .outputs
                .iter()
                .find(|(name, _)| *name == stem)
                .map(|(_, out)| out.as_bytes().to_vec())
                .unwrap_or_else(|| format!("{}\n", stem).into_bytes());
            Ok(bytes)
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        reports: Vec<(String, String)>,
        stages: Vec<String>,
        collected: Option<usize>,
        summary: Option<RunSummary>,
    }

    impl CaseReporter for RecordingReporter {
        fn on_collection_complete(&mut self, case_count: usize) {
            self.collected = Some(case_count);
        }

        fn on_stage_start(&mut self, case: &CaseName, stage: &str, _input: &Path) {
            self.stages.push(format!("{}:{}", stage, case));
        }

        fn on_case_complete(&mut self, report: &CaseReport) {
            self.reports.push((report.case.to_string(), report.status.clone()));
        }

        fn on_run_complete(&mut self, summary: &RunSummary) {
            self.summary = Some(summary.clone());
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        root: PathBuf,
        log: CallLog,
    }

    impl Fixture {
        fn new(cases: &[(&str, &str)]) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let root = dir.path().to_path_buf();
            for (name, reference) in cases {
                fs::write(root.join(format!("{}.mat", name)), b"source").unwrap();
                fs::write(root.join(format!("{}.test", name)), reference).unwrap();
            }
            Self {
                _dir: dir,
                root,
                log: Rc::new(RefCell::new(Vec::new())),
            }
        }

        fn harness(
            &self,
            stage1_failing: &[&'static str],
            stage2_failing: &[&'static str],
            outputs: Vec<(&'static str, &'static str)>,
        ) -> Harness {
            let config = HarnessConfig::new().with_case_directory(&self.root);
            Harness::with_components(
                config,
                Box::new(FakeStage {
                    name: "matlang2c",
                    failing: stage1_failing.iter().copied().collect(),
                    log: self.log.clone(),
                }),
                Box::new(FakeStage {
                    name: "gcc",
                    failing: stage2_failing.iter().copied().collect(),
                    log: self.log.clone(),
                }),
                Box::new(FakeExecutor {
                    outputs,
                    log: self.log.clone(),
                }),
            )
        }

        fn calls(&self) -> Vec<String> {
            self.log.borrow().clone()
        }
    }

    #[test]
    fn test_all_stages_run_in_order_on_success() {
        let fx = Fixture::new(&[("add", "add\n")]);
        let harness = fx.harness(&[], &[], vec![]);
        let mut reporter = RecordingReporter::default();

        let summary = harness.run(&mut reporter).unwrap();

        assert_eq!(fx.calls(), vec!["matlang2c:add", "gcc:add", "run:add"]);
        assert_eq!(reporter.reports, vec![("add".to_string(), "SUCCESS".to_string())]);
        assert_eq!(summary.passed, 1);
        assert!(summary.all_passed());
    }

    #[test]
    fn test_stage1_failure_skips_stage2_and_execution() {
        let fx = Fixture::new(&[("bad", "")]);
        let harness = fx.harness(&["bad"], &[], vec![]);
        let mut reporter = RecordingReporter::default();

        harness.run(&mut reporter).unwrap();

        assert_eq!(fx.calls(), vec!["matlang2c:bad"]);
        assert_eq!(reporter.reports, vec![("bad".to_string(), "ERROR: matlang2c".to_string())]);
        assert!(!fx.root.join("bad.out").exists());
    }

    #[test]
    fn test_stage2_failure_skips_execution() {
        let fx = Fixture::new(&[("link", "")]);
        let harness = fx.harness(&[], &["link"], vec![]);
        let mut reporter = RecordingReporter::default();

        harness.run(&mut reporter).unwrap();

        assert_eq!(fx.calls(), vec!["matlang2c:link", "gcc:link"]);
        assert_eq!(reporter.reports, vec![("link".to_string(), "ERROR: gcc".to_string())]);
    }

    #[test]
    fn test_mismatch_reports_failed_and_keeps_output() {
        let fx = Fixture::new(&[("mismatch", "5\n")]);
        let harness = fx.harness(&[], &[], vec![("mismatch", "4\n")]);
        let mut reporter = RecordingReporter::default();

        let summary = harness.run(&mut reporter).unwrap();

        assert_eq!(reporter.reports, vec![("mismatch".to_string(), "FAILED".to_string())]);
        assert_eq!(fs::read(fx.root.join("mismatch.out")).unwrap(), b"4\n".to_vec());
        assert_eq!(summary.failed, 1);
        assert!(!summary.all_passed());
    }

    #[test]
    fn test_failures_do_not_stop_the_batch() {
        let fx = Fixture::new(&[("a", "a\n"), ("b", "b\n"), ("c", "wrong\n"), ("d", "d\n")]);
        let harness = fx.harness(&["a"], &["b"], vec![]);
        let mut reporter = RecordingReporter::default();

        let summary = harness.run(&mut reporter).unwrap();

        let statuses: Vec<&str> = reporter.reports.iter().map(|(_, s)| s.as_str()).collect();
        assert_eq!(statuses, vec!["ERROR: matlang2c", "ERROR: gcc", "FAILED", "SUCCESS"]);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 3);
        assert_eq!(reporter.collected, Some(4));
        assert_eq!(reporter.summary.unwrap().total, 4);
    }

    #[test]
    fn test_cases_run_in_ascending_order() {
        let fx = Fixture::new(&[("zeta", "zeta\n"), ("alpha", "alpha\n"), ("mid", "mid\n")]);
        let harness = fx.harness(&[], &[], vec![]);
        let mut reporter = RecordingReporter::default();

        harness.run(&mut reporter).unwrap();

        let order: Vec<&str> = reporter.reports.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(order, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_execution_failure_is_its_own_kind() {
        let fx = Fixture::new(&[("hang", "")]);
        let harness = fx.harness(&[], &[], vec![]);
        let mut reporter = RecordingReporter::default();

        let report = harness.run_case(&harness.cases().unwrap()[0], &mut reporter);

        assert_eq!(report.outcome, CaseOutcome::Failed(CaseFailure::ExecutionFailure));
        assert_eq!(report.status, "ERROR: execute");
        assert!(!fx.root.join("hang.out").exists());
    }

    #[test]
    fn test_missing_reference_is_artifact_failure() {
        let fx = Fixture::new(&[]);
        fs::write(fx.root.join("orphan.mat"), b"source").unwrap();
        let harness = fx.harness(&[], &[], vec![]);
        let mut reporter = RecordingReporter::default();

        harness.run(&mut reporter).unwrap();

        assert_eq!(reporter.reports, vec![("orphan".to_string(), "ERROR: artifact".to_string())]);
        assert_eq!(fs::read(fx.root.join("orphan.out")).unwrap(), b"orphan\n".to_vec());
    }

    #[test]
    fn test_stage_progress_is_reported() {
        let fx = Fixture::new(&[("add", "add\n")]);
        let harness = fx.harness(&[], &[], vec![]);
        let mut reporter = RecordingReporter::default();

        harness.run(&mut reporter).unwrap();

        assert_eq!(reporter.stages, vec!["matlang2c:add", "gcc:add"]);
    }

    #[test]
    fn test_filter_keeps_matching_cases() {
        let fx = Fixture::new(&[("add_int", ""), ("add_float", ""), ("mul", "")]);
        let harness = fx.harness(&[], &[], vec![]).with_filter("add");

        let cases: Vec<String> = harness.cases().unwrap().iter().map(|c| c.to_string()).collect();
        assert_eq!(cases, vec!["add_float", "add_int"]);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let harness = Harness::new(HarnessConfig::new().with_case_directory("/definitely/not/a/case/dir"));
        let mut reporter = RecordingReporter::default();
        assert!(matches!(
            harness.run(&mut reporter),
            Err(HarnessError::MissingCaseDirectory(_))
        ));
        assert!(reporter.collected.is_none());
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let fx = Fixture::new(&[("a", "a\n"), ("b", "B\n")]);
        let harness = fx.harness(&[], &[], vec![]);

        let mut first = RecordingReporter::default();
        harness.run(&mut first).unwrap();
        let out_a = fs::read(fx.root.join("a.out")).unwrap();
        let out_b = fs::read(fx.root.join("b.out")).unwrap();

        let mut second = RecordingReporter::default();
        harness.run(&mut second).unwrap();

        assert_eq!(first.reports, second.reports);
        assert_eq!(fs::read(fx.root.join("a.out")).unwrap(), out_a);
        assert_eq!(fs::read(fx.root.join("b.out")).unwrap(), out_b);
    }

    #[test]
    fn test_labels() {
        let label = |o: CaseOutcome| o.label("matlang2c", "gcc");
        assert_eq!(label(CaseOutcome::Success), "SUCCESS");
        assert_eq!(label(CaseOutcome::Failed(CaseFailure::ComparisonMismatch)), "FAILED");
        assert_eq!(label(CaseOutcome::Failed(CaseFailure::Stage1Failure)), "ERROR: matlang2c");
        assert_eq!(label(CaseOutcome::Failed(CaseFailure::Stage2Failure)), "ERROR: gcc");
        assert_eq!(label(CaseOutcome::Failed(CaseFailure::ExecutionFailure)), "ERROR: execute");
        assert_eq!(label(CaseOutcome::Failed(CaseFailure::ArtifactFailure)), "ERROR: artifact");
    }

    #[test]
    fn test_labels_name_the_stage_when_compilers_share_a_name() {
        let label = |o: CaseOutcome| o.label("cc", "cc");
        assert_eq!(label(CaseOutcome::Failed(CaseFailure::Stage1Failure)), "ERROR: stage1 (cc)");
        assert_eq!(label(CaseOutcome::Failed(CaseFailure::Stage2Failure)), "ERROR: stage2 (cc)");
        assert_eq!(label(CaseOutcome::Failed(CaseFailure::ComparisonMismatch)), "FAILED");
    }
}
