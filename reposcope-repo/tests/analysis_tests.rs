//! End-to-end analysis tests against real directories and git fixtures

#[macro_use]
mod common;

use async_trait::async_trait;
use common::{write_file, GitFixture, MARKDOWN_SAMPLE, PNG_SAMPLE, PYTHON_SAMPLE};
use reposcope_core::{
    AnalysisOptions, CancellationSignal, ErrorContext, FileKind, HistoryBackend,
    HistoryFailureKind, Language, RawCommit, ReposcopeError, ReposcopeResult,
    Totals,
};
use reposcope_repo::{analyze, Analyzer, GitCliBackend, HistoryMiner};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn options() -> AnalysisOptions {
    AnalysisOptions::new(10)
}

fn write_three_file_sample(root: &Path) {
    write_file(root, "a.py", PYTHON_SAMPLE);
    write_file(root, "b.md", MARKDOWN_SAMPLE);
    write_file(root, "image.png", PNG_SAMPLE);
}

#[tokio::test]
async fn test_three_file_scenario_without_repository() {
    let dir = tempfile::tempdir().unwrap();
    write_three_file_sample(dir.path());

    let report = analyze(dir.path(), options()).await.unwrap();

    assert_eq!(report.totals.files, 3);
    assert_eq!(report.totals.source_files, 1);
    assert_eq!(report.totals.prose_files, 1);
    assert_eq!(report.totals.binary_files, 1);
    assert_eq!(
        report.totals.size_bytes,
        (PYTHON_SAMPLE.len() + MARKDOWN_SAMPLE.len() + PNG_SAMPLE.len()) as u64
    );

    assert_eq!(report.languages.len(), 1);
    let python = report.language(Language::Python).unwrap();
    assert_eq!(python.file_count, 1);
    assert_eq!(python.code_lines, 10);
    assert_eq!(python.comment_lines, 2);
    assert_eq!(python.blank_lines, 1);
    assert_eq!(python.percentage, 100.0);

    // Prose is counted in its own record but stays out of the line totals
    let markdown = report.file("b.md").unwrap();
    assert_eq!(markdown.kind, FileKind::Prose);
    assert_eq!(markdown.language, None);
    assert_eq!(markdown.code_lines, 5);
    assert_eq!(report.totals.lines_of_code, 10);

    let image = report.file("image.png").unwrap();
    assert!(image.is_binary());
    assert_eq!(image.total_lines(), 0);
    assert_eq!(image.size_bytes, PNG_SAMPLE.len() as u64);

    // Not a repository: structural data intact, history explicitly absent
    assert!(report.is_partial());
    let failure = report.history.failure().unwrap();
    assert_eq!(failure.kind, HistoryFailureKind::NotAGitRepository);
    assert!(report.history.summary().is_none());
}

#[tokio::test]
async fn test_three_file_scenario_in_repository() {
    require_git!();

    let mut fixture = GitFixture::init();
    write_three_file_sample(fixture.path());
    fixture.commit_all("initial import");

    let report = analyze(fixture.path(), options()).await.unwrap();

    assert_eq!(report.totals.files, 3);
    assert!(report.file(".git/HEAD").is_none());

    let summary = report.history.summary().unwrap();
    assert_eq!(summary.total_commits, 1);
    assert_eq!(summary.contributor_count, 1);
    assert_eq!(summary.merge_commits, 0);

    let contributor = &report.history.contributors()[0];
    assert_eq!(contributor.author.email, "test@example.com");
    assert_eq!(contributor.insertions, 18);

    // The binary image has no line delta but still counts as a touched file
    let churn_paths: Vec<_> = report
        .history
        .churn()
        .iter()
        .map(|c| c.path.as_str())
        .collect();
    assert_eq!(churn_paths, vec!["a.py", "b.md", "image.png"]);
}

#[tokio::test]
async fn test_empty_repository() {
    require_git!();

    let fixture = GitFixture::init();
    let report = analyze(fixture.path(), options()).await.unwrap();

    assert_eq!(report.totals, Totals::default());
    assert!(report.languages.is_empty());
    assert!(!report.is_partial());

    let summary = report.history.summary().unwrap();
    assert_eq!(summary.total_commits, 0);
    assert_eq!(summary.contributor_count, 0);
    assert_eq!(summary.first_commit, None);
    assert_eq!(summary.last_commit, None);
}

#[tokio::test]
async fn test_rename_attributes_churn_to_final_path() {
    require_git!();

    let mut fixture = GitFixture::init();
    let body = "pub fn answer() -> u32 {\n    42\n}\n\npub fn question() -> &'static str {\n    \"six by nine\"\n}\n";
    fixture.write("src/old_name.rs", body);
    fixture.commit_all("add module");

    fixture.write("src/old_name.rs", format!("{body}\npub const EXTRA: u8 = 1;\n"));
    fixture.commit_all("extend module");

    fixture.git(&["mv", "src/old_name.rs", "src/new_name.rs"]);
    fixture.commit_all("rename module");

    fixture.write(
        "src/new_name.rs",
        format!("{body}\npub const EXTRA: u8 = 2;\n"),
    );
    fixture.commit_all("tweak constant");

    let report = analyze(fixture.path(), options()).await.unwrap();

    let churn = report.history.churn();
    assert_eq!(churn.len(), 1);
    assert_eq!(churn[0].path, "src/new_name.rs");
    assert_eq!(churn[0].commit_count, 4);
    // 7 added, then 2 added, then a pure rename, then 1 line replaced
    assert_eq!(churn[0].change_volume, 7 + 2 + 2);
    assert!(churn.iter().all(|entry| entry.path != "src/old_name.rs"));
}

#[tokio::test]
async fn test_merge_commit_uses_first_parent_diff() {
    require_git!();

    let mut fixture = GitFixture::init();
    fixture.write("lib.rs", "pub mod a;\npub mod b;\n");
    fixture.commit_all("base");

    fixture.git(&["checkout", "-q", "-b", "feature"]);
    fixture.write(
        "feature.rs",
        "fn one() {}\nfn two() {}\nfn three() {}\nfn four() {}\nfn five() {}\n",
    );
    fixture.commit_all_as(("Feature Dev", "dev@example.com"), "feature work");

    fixture.git(&["checkout", "-q", "main"]);
    fixture.write("lib.rs", "pub mod a;\npub mod b;\npub mod c;\n");
    fixture.commit_all("main work");

    fixture.tick();
    fixture.git(&["merge", "-q", "--no-ff", "-m", "merge feature", "feature"]);

    let miner = HistoryMiner::new(Arc::new(GitCliBackend::new()));
    let history = miner
        .mine(fixture.path(), &CancellationSignal::new())
        .await
        .unwrap();

    assert_eq!(history.commits.len(), 4);
    let merges: Vec<_> = history.commits.iter().filter(|c| c.is_merge()).collect();
    assert_eq!(merges.len(), 1);
    let merge = merges[0];
    assert_eq!(merge.parent_count, 2);
    assert_eq!(merge.files_touched, 1);
    assert_eq!((merge.insertions, merge.deletions), (5, 0));

    // Chronological, earliest first
    assert!(history
        .commits
        .windows(2)
        .all(|pair| pair[0].timestamp <= pair[1].timestamp));

    let report = analyze(fixture.path(), options()).await.unwrap();
    let summary = report.history.summary().unwrap();
    assert_eq!(summary.total_commits, 4);
    assert_eq!(summary.merge_commits, 1);
    assert_eq!(summary.contributor_count, 2);

    let names: Vec<_> = report
        .history
        .contributors()
        .iter()
        .map(|c| c.author.name.as_str())
        .collect();
    assert_eq!(names, vec!["Test User", "Feature Dev"]);
}

#[tokio::test]
async fn test_gitignored_and_vendor_trees_are_skipped() {
    require_git!();

    let mut fixture = GitFixture::init();
    fixture.write(".gitignore", "generated/\n");
    fixture.write("src/main.rs", "fn main() {}\n");
    fixture.write("generated/big.rs", "fn generated() {}\n");
    fixture.write("node_modules/pkg/index.js", "module.exports = 1;\n");
    fixture.commit_all("initial");

    let report = analyze(fixture.path(), options()).await.unwrap();
    let paths: Vec<_> = report.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec![".gitignore", "src/main.rs"]);
    assert_eq!(report.directory_structure.get("src"), Some(&1));
}

#[tokio::test]
async fn test_repeated_analysis_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..40 {
        write_file(
            dir.path(),
            &format!("pkg{}/mod{}.rs", i % 4, i),
            "// header\nfn f() {}\n\n".repeat(i % 5 + 1),
        );
        write_file(dir.path(), &format!("scripts/s{i}.sh"), "#!/bin/sh\necho hi\n");
    }

    let options = options().with_max_concurrency(8);
    let first = analyze(dir.path(), options.clone()).await.unwrap();
    let second = analyze(dir.path(), options).await.unwrap();

    assert_eq!(first.files, second.files);
    assert_eq!(first.languages, second.languages);
    assert_eq!(first.largest_files, second.largest_files);
    assert_eq!(first.totals, second.totals);

    let sum: f64 = first.languages.iter().map(|l| l.percentage).sum();
    assert!((sum - 100.0).abs() < 0.01);
    let code: u64 = first.languages.iter().map(|l| l.code_lines).sum();
    assert_eq!(code, first.totals.lines_of_code);
}

/// Backend that claims a repository and then misbehaves
struct ScriptedBackend {
    delay: Duration,
    fail: bool,
}

#[async_trait]
impl HistoryBackend for ScriptedBackend {
    async fn is_repository_root(&self, _path: &Path) -> ReposcopeResult<bool> {
        Ok(true)
    }

    async fn has_commits(&self, _path: &Path) -> ReposcopeResult<bool> {
        Ok(true)
    }

    async fn commit_log(&self, _path: &Path) -> ReposcopeResult<Vec<RawCommit>> {
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(ReposcopeError::GitBackend {
                message: "fatal: bad object HEAD".to_string(),
                source: None,
                context: ErrorContext::new("scripted_backend"),
            });
        }
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_history_timeout_keeps_structural_side() {
    let dir = tempfile::tempdir().unwrap();
    write_three_file_sample(dir.path());

    let analyzer = Analyzer::new(options().with_timeout_ms(500))
        .unwrap()
        .with_backend(Arc::new(ScriptedBackend {
            delay: Duration::from_secs(30),
            fail: false,
        }));

    let report = analyzer.analyze(dir.path()).await.unwrap();

    assert_eq!(report.totals.files, 3);
    let failure = report.history.failure().unwrap();
    assert_eq!(failure.kind, HistoryFailureKind::Timeout);
    assert!(failure.message.contains("history_mining"));
}

#[tokio::test]
async fn test_backend_failure_is_reported_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    write_three_file_sample(dir.path());

    let analyzer = Analyzer::new(options()).unwrap().with_backend(Arc::new(ScriptedBackend {
        delay: Duration::ZERO,
        fail: true,
    }));

    let report = analyzer.analyze(dir.path()).await.unwrap();
    let failure = report.history.failure().unwrap();
    assert_eq!(failure.kind, HistoryFailureKind::GitBackend);
    assert!(failure.message.contains("fatal: bad object HEAD"));
    assert_eq!(report.totals.lines_of_code, 10);
}

#[tokio::test]
async fn test_cancellation_before_start() {
    let dir = tempfile::tempdir().unwrap();
    write_three_file_sample(dir.path());

    let signal = CancellationSignal::new();
    signal.cancel();
    let analyzer = Analyzer::new(options()).unwrap().with_cancellation(signal);

    let err = analyzer.analyze(dir.path()).await.unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn test_cancellation_during_history_mining() {
    let dir = tempfile::tempdir().unwrap();
    write_three_file_sample(dir.path());

    let analyzer = Analyzer::new(options()).unwrap().with_backend(Arc::new(ScriptedBackend {
        delay: Duration::from_secs(30),
        fail: false,
    }));

    let signal = analyzer.cancellation();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        signal.cancel();
    });

    let result = tokio::time::timeout(Duration::from_secs(10), analyzer.analyze(dir.path()))
        .await
        .expect("cancellation should stop the run promptly");
    assert!(matches!(result, Err(ReposcopeError::Cancelled { .. })));
}

#[tokio::test]
async fn test_report_serializes_with_history_status() {
    let dir = tempfile::tempdir().unwrap();
    write_three_file_sample(dir.path());

    let report = analyze(dir.path(), options()).await.unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["history"]["status"], "unavailable");
    assert_eq!(json["history"]["kind"], "not_a_git_repository");
    assert_eq!(json["languages"][0]["language"], "Python");
    assert_eq!(json["totals"]["files"], 3);
}
