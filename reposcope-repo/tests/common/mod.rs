// Shared fixtures for integration tests
#![allow(dead_code)]

use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Base author time for fixture commits: 2024-01-01T00:00:00Z
const EPOCH: i64 = 1_704_067_200;

/// Whether a git new enough for `--diff-merges=first-parent` is on PATH
pub fn git_available() -> bool {
    let Ok(output) = Command::new("git").arg("--version").output() else {
        return false;
    };
    if !output.status.success() {
        return false;
    }

    // "git version 2.39.2" (possibly followed by a vendor suffix)
    let text = String::from_utf8_lossy(&output.stdout);
    let mut numbers = text
        .split_whitespace()
        .nth(2)
        .unwrap_or("")
        .split('.')
        .map(|part| part.parse::<u32>().unwrap_or(0));
    let major = numbers.next().unwrap_or(0);
    let minor = numbers.next().unwrap_or(0);
    (major, minor) >= (2, 31)
}

/// Skip the current test when git cannot be used
#[macro_export]
macro_rules! require_git {
    () => {
        if !common::git_available() {
            eprintln!("git >= 2.31 not available, skipping");
            return;
        }
    };
}

/// Write a file below `root`, creating parent directories
pub fn write_file(root: &Path, relative: &str, content: impl AsRef<[u8]>) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

/// A throwaway repository driven through the git CLI with pinned dates and identities
pub struct GitFixture {
    pub dir: TempDir,
    clock: i64,
}

impl GitFixture {
    pub fn init() -> Self {
        let fixture = Self {
            dir: TempDir::new().unwrap(),
            clock: EPOCH,
        };
        fixture.git(&["init", "-q", "-b", "main"]);
        fixture
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, content: impl AsRef<[u8]>) {
        write_file(self.path(), relative, content);
    }

    /// Run git in the fixture, panicking on failure, and return stdout
    pub fn git(&self, args: &[&str]) -> String {
        self.git_as(("Test User", "test@example.com"), args)
    }

    pub fn git_as(&self, author: (&str, &str), args: &[&str]) -> String {
        let date = format!("@{} +0000", self.clock);
        let output = Command::new("git")
            .args([
                "-c",
                "commit.gpgsign=false",
                "-c",
                "init.defaultBranch=main",
                "-c",
                "core.autocrlf=false",
            ])
            .args(args)
            .current_dir(self.path())
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .env("GIT_CONFIG_GLOBAL", "/dev/null")
            .env("GIT_AUTHOR_NAME", author.0)
            .env("GIT_AUTHOR_EMAIL", author.1)
            .env("GIT_COMMITTER_NAME", author.0)
            .env("GIT_COMMITTER_EMAIL", author.1)
            .env("GIT_AUTHOR_DATE", &date)
            .env("GIT_COMMITTER_DATE", &date)
            .output()
            .unwrap();

        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    /// Stage everything and commit one hour after the previous commit
    pub fn commit_all(&mut self, message: &str) {
        self.commit_all_as(("Test User", "test@example.com"), message);
    }

    pub fn commit_all_as(&mut self, author: (&str, &str), message: &str) {
        self.tick();
        self.git_as(author, &["add", "-A"]);
        self.git_as(author, &["commit", "-q", "-m", message]);
    }

    /// Advance the fixture clock by one hour
    pub fn tick(&mut self) {
        self.clock += 3600;
    }
}

/// Ten code lines, two comment lines and one blank line
pub const PYTHON_SAMPLE: &str = "# module header
import os

def main():
    # say hello
    name = \"world\"
    print(\"hello\", name)
    return 0
x = 1
y = 2
z = x + y
w = z * 2
print(w)
";

/// Five non-blank prose lines
pub const MARKDOWN_SAMPLE: &str = "# Title
Line one
Line two
Line three
Line four
";

pub const PNG_SAMPLE: &[u8] = &[
    0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D,
];
