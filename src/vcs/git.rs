//! Git CLI reader
//!
//! Shells out to the `git` binary against one configured working copy.
//! Checkouts mutate that shared copy, so the engine drives this reader
//! strictly sequentially (see the module docs of [`crate::vcs`]).

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};

use super::{parse, CommitRecord, VcsReader};
use crate::{Error, Result};

/// Default baseline branch restored after historical checkouts
pub const DEFAULT_BASELINE: &str = "master";

// Explicit +0000 offset: without it git reads --after/--before in the
// host's local timezone, shifting window boundaries off the UTC release
// dates.
const GIT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Version-control reader backed by the git command-line tool
#[derive(Debug, Clone)]
pub struct GitCli {
    repo: PathBuf,
    baseline: String,
}

impl GitCli {
    /// Create a reader for the working copy at `repo`
    #[must_use]
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self {
            repo: repo.into(),
            baseline: DEFAULT_BASELINE.to_string(),
        }
    }

    /// Set the baseline branch (default `master`)
    #[must_use]
    pub fn baseline(mut self, branch: impl Into<String>) -> Self {
        self.baseline = branch.into();
        self
    }

    /// Path of the working copy
    #[must_use]
    pub fn repo(&self) -> &Path {
        &self.repo
    }

    fn git(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo)
            .output()
            .map_err(|e| Error::Vcs(format!("failed to spawn git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Vcs(format!(
                "git {} failed: {}",
                args.first().copied().unwrap_or(""),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn walk_files(
        &self,
        dir: &Path,
        extension: &str,
        exclude_tests: bool,
        found: &mut Vec<String>,
    ) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name();

            if path.is_dir() {
                if name == ".git" {
                    continue;
                }
                self.walk_files(&path, extension, exclude_tests, found)?;
            } else if path.to_string_lossy().ends_with(extension) {
                let relative = path
                    .strip_prefix(&self.repo)
                    .unwrap_or(&path)
                    .to_string_lossy()
                    .replace('\\', "/");
                if exclude_tests && is_test_path(&relative) {
                    continue;
                }
                found.push(relative);
            }
        }
        Ok(())
    }
}

fn is_test_path(relative: &str) -> bool {
    relative.contains("src/test") || relative.contains("/tests/") || relative.starts_with("tests/")
}

impl VcsReader for GitCli {
    fn checkout(&mut self, revision: &str) -> Result<()> {
        self.git(&["checkout", "--quiet", revision]).map(drop)
    }

    fn restore_baseline(&mut self) -> Result<()> {
        let baseline = self.baseline.clone();
        self.checkout(&baseline)
    }

    fn snapshot_commit(&mut self, before: DateTime<Utc>) -> Result<String> {
        let before_arg = format!("--before={}", before.format(GIT_DATE_FORMAT));
        let out = self.git(&["log", "--date=iso", "--format=%H", &before_arg, "HEAD"])?;
        out.lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(ToString::to_string)
            .ok_or_else(|| Error::Vcs(format!("no commit before {before}")))
    }

    fn list_files(&mut self, extension: &str, exclude_tests: bool) -> Result<Vec<String>> {
        let mut found = Vec::new();
        let repo = self.repo.clone();
        self.walk_files(&repo, extension, exclude_tests, &mut found)?;
        found.sort();
        Ok(found)
    }

    fn log_stat(
        &mut self,
        path: &str,
        after: DateTime<Utc>,
        before: DateTime<Utc>,
    ) -> Result<Vec<CommitRecord>> {
        let after_arg = format!("--after={}", after.format(GIT_DATE_FORMAT));
        let before_arg = format!("--before={}", before.format(GIT_DATE_FORMAT));
        let out = self.git(&["log", "--stat", &before_arg, &after_arg, "--", path])?;
        Ok(parse::split_commits(&out))
    }

    fn log_after(&mut self, path: &str, after: DateTime<Utc>) -> Result<Vec<CommitRecord>> {
        let after_arg = format!("--after={}", after.format(GIT_DATE_FORMAT));
        let out = self.git(&["log", "--date=iso", &after_arg, "--", path])?;
        Ok(parse::split_commits(&out))
    }

    fn read_lines(&mut self, path: &str) -> Result<Vec<String>> {
        let content = fs::read_to_string(self.repo.join(path))?;
        Ok(content.lines().map(ToString::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_test_path() {
        assert!(is_test_path("module/src/test/Foo.java"));
        assert!(is_test_path("module/tests/Foo.java"));
        assert!(is_test_path("tests/Foo.java"));
        assert!(!is_test_path("module/src/main/Foo.java"));
        assert!(!is_test_path("module/src/main/TestUtils.java"));
    }

    #[test]
    fn test_git_date_format_pins_utc() {
        let date: DateTime<Utc> = "2020-01-01T00:00:00Z".parse().unwrap();
        assert_eq!(
            date.format(GIT_DATE_FORMAT).to_string(),
            "2020-01-01 00:00:00 +0000"
        );
    }

    #[test]
    fn test_builder() {
        let git = GitCli::new("/tmp/repo").baseline("trunk");
        assert_eq!(git.repo(), Path::new("/tmp/repo"));
        assert_eq!(git.baseline, "trunk");
    }

    #[test]
    fn test_list_files_walks_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/main")).unwrap();
        fs::create_dir_all(root.join("src/test")).unwrap();
        fs::write(root.join("src/main/A.java"), "class A {}").unwrap();
        fs::write(root.join("src/test/B.java"), "class B {}").unwrap();
        fs::write(root.join("README.md"), "docs").unwrap();

        let mut git = GitCli::new(root);
        let files = git.list_files(".java", true).unwrap();
        assert_eq!(files, vec!["src/main/A.java"]);

        let all = git.list_files(".java", false).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_read_lines() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("F.java"), "one\n\nthree\n").unwrap();

        let mut git = GitCli::new(dir.path());
        let lines = git.read_lines("F.java").unwrap();
        assert_eq!(lines, vec!["one", "", "three"]);
    }
}
