//! Staged changes collected from the index using git2.

use std::path::Path;

use git2::{Delta, Diff, DiffFormat, ErrorCode, Repository, Tree};
use tracing::debug;

use crate::error::GitError;

/// The staged diff plus the paths it touches.
#[derive(Debug, Clone)]
pub struct StagedChanges {
    /// Unified diff text, `diff --git` headers included.
    pub diff_text: String,
    /// Changed paths in diff order (new path for renames).
    pub files: Vec<String>,
}

/// Open the repository rooted at `path`.
pub fn open_repository(path: impl AsRef<Path>) -> Result<Repository, GitError> {
    let path = path.as_ref();
    let repo = Repository::open(path).map_err(GitError::OpenRepository)?;
    debug!("Opened repository at {}", path.display());
    Ok(repo)
}

/// Resolve the HEAD tree. Repositories without commits have none.
fn resolve_head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, GitError> {
    let head = match repo.head() {
        Ok(head) => head,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(None);
        }
        Err(e) => return Err(GitError::HeadUnavailable(e)),
    };

    let tree = head.peel_to_tree().map_err(GitError::HeadUnavailable)?;
    Ok(Some(tree))
}

/// Collect the diff between HEAD and the index.
///
/// Errors with [`GitError::NoStagedChanges`] when nothing is staged.
pub fn collect_staged_changes(repo: &Repository) -> Result<StagedChanges, GitError> {
    let head_tree = resolve_head_tree(repo)?;
    let diff = repo
        .diff_tree_to_index(head_tree.as_ref(), None, None)
        .map_err(GitError::DiffFailed)?;

    let files = changed_paths(&diff);
    if files.is_empty() {
        return Err(GitError::NoStagedChanges);
    }

    let diff_text = patch_text(&diff)?;
    debug!(
        "Collected staged diff: {} files, {} bytes",
        files.len(),
        diff_text.len()
    );

    Ok(StagedChanges { diff_text, files })
}

fn changed_paths(diff: &Diff<'_>) -> Vec<String> {
    diff.deltas()
        .filter_map(|delta| {
            let file = match delta.status() {
                Delta::Deleted => delta.old_file(),
                _ => delta.new_file(),
            };
            file.path().map(|p| p.to_string_lossy().to_string())
        })
        .filter(|path| !path.is_empty())
        .collect()
}

/// Render a diff as patch text. Content lines keep their origin marker;
/// file and hunk headers are written as-is.
fn patch_text(diff: &Diff<'_>) -> Result<String, GitError> {
    let mut text = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        let origin = line.origin();
        if matches!(origin, '+' | '-' | ' ') {
            text.push(origin);
        }
        text.push_str(&String::from_utf8_lossy(line.content()));
        true
    })
    .map_err(GitError::DiffFailed)?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use git2::Signature;

    use super::*;

    fn stage(repo: &Repository, dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
    }

    fn commit_index(repo: &Repository) {
        let sig = Signature::now("Test", "test@test.com").unwrap();
        let mut index = repo.index().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<_> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &parents).unwrap();
    }

    #[test]
    fn test_open_repository_outside_a_repo_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = open_repository(dir.path());
        assert!(matches!(result, Err(GitError::OpenRepository(_))));
    }

    #[test]
    fn test_open_repository_finds_initialized_repo() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();

        let repo = open_repository(dir.path()).unwrap();
        assert!(matches!(
            collect_staged_changes(&repo),
            Err(GitError::NoStagedChanges)
        ));
    }

    #[test]
    fn test_clean_repo_has_no_staged_changes() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        commit_index(&repo);

        let result = collect_staged_changes(&repo);
        assert!(matches!(result, Err(GitError::NoStagedChanges)));
    }

    #[test]
    fn test_unstaged_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        commit_index(&repo);
        std::fs::write(dir.path().join("loose.txt"), "not staged\n").unwrap();

        assert!(matches!(
            collect_staged_changes(&repo),
            Err(GitError::NoStagedChanges)
        ));
    }

    #[test]
    fn test_staged_new_file_in_empty_repo() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        stage(&repo, dir.path(), "new.txt", "hello world\n");

        let staged = collect_staged_changes(&repo).unwrap();
        assert_eq!(staged.files, vec!["new.txt".to_string()]);
        assert!(staged.diff_text.contains("diff --git a/new.txt b/new.txt"));
        assert!(staged.diff_text.contains("+hello world"));
    }

    #[test]
    fn test_staged_modification() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        stage(&repo, dir.path(), "lib.rs", "fn a() {}\n");
        commit_index(&repo);
        stage(&repo, dir.path(), "lib.rs", "fn b() {}\n");

        let staged = collect_staged_changes(&repo).unwrap();
        assert_eq!(staged.files, vec!["lib.rs".to_string()]);
        assert!(staged.diff_text.contains("-fn a() {}"));
        assert!(staged.diff_text.contains("+fn b() {}"));
    }
}
