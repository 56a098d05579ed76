//! Parsers for raw git output.
//!
//! Pure functions only: the adapter captures stdout/stderr and feeds
//! the text here. Anything malformed degrades to an `Error` variant
//! carrying the raw message rather than failing the caller.

use crate::domain::{LocalState, RemoteState};

/// Classify `git status --porcelain=v2` output.
///
/// Empty output is a clean tree. Otherwise each line's leading marker
/// is counted: `?` untracked, `1`/`2` per the change code (A added,
/// D deleted, M/R modified), `u` unmerged, counted as modified.
pub fn local_state(output: &str) -> LocalState {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return LocalState::Clean;
    }

    let (mut added, mut modified, mut deleted, mut untracked) = (0u32, 0u32, 0u32, 0u32);
    for line in trimmed.lines() {
        let Some(marker) = line.chars().next() else {
            continue;
        };
        match marker {
            '?' => untracked += 1,
            '1' | '2' => {
                let Some(xy) = line.split_whitespace().nth(1) else {
                    continue;
                };
                if xy.contains('A') {
                    added += 1;
                } else if xy.contains('D') {
                    deleted += 1;
                } else if xy.contains('M') || xy.contains('R') {
                    modified += 1;
                }
            }
            'u' => modified += 1,
            _ => {}
        }
    }

    LocalState::Dirty {
        added,
        modified,
        deleted,
        untracked,
    }
}

/// Parse `rev-list --left-right --count HEAD...@{u}` output: two
/// non-negative integers, ahead then behind.
pub fn remote_counts(output: &str) -> RemoteState {
    let mut fields = output.split_whitespace();
    let ahead = fields.next().and_then(|s| s.parse::<u32>().ok());
    let behind = fields.next().and_then(|s| s.parse::<u32>().ok());
    match (ahead, behind) {
        (Some(a), Some(b)) => RemoteState::from_counts(a, b),
        _ => RemoteState::Error {
            message: "unparseable ahead/behind counts".to_string(),
        },
    }
}

/// Map a failed upstream query onto a remote state from its stderr.
pub fn classify_remote_failure(stderr: &str) -> RemoteState {
    let text = stderr.trim();
    if text.is_empty() {
        return RemoteState::Error {
            message: "unknown error".to_string(),
        };
    }
    if text.contains("no upstream") || text.contains("bad revision") {
        return RemoteState::NoUpstream;
    }
    if text.contains("does not point to a branch") || text.contains("no such branch") {
        return RemoteState::Detached;
    }
    RemoteState::Error {
        message: text.to_string(),
    }
}

/// Result of `rev-parse --abbrev-ref HEAD`: a literal `HEAD` means
/// the head is detached and the caller resolves the commit id with a
/// follow-up query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadRef {
    Branch(String),
    Detached,
    Unborn,
}

pub fn head_ref(output: &str) -> HeadRef {
    match output.trim() {
        "HEAD" => HeadRef::Detached,
        "" => HeadRef::Unborn,
        name => HeadRef::Branch(name.to_string()),
    }
}

/// Split `branch --format=%(refname:short)` output into names.
pub fn branch_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Prune candidates: every local branch except the current one and
/// the protected set, preserving listing order.
pub fn prune_candidates(
    all: &[String],
    current: Option<&str>,
    protected: &[String],
) -> Vec<String> {
    all.iter()
        .filter(|branch| Some(branch.as_str()) != current)
        .filter(|branch| !protected.iter().any(|p| p == *branch))
        .cloned()
        .collect()
}

/// Intersect candidates with the `branch --merged HEAD` listing,
/// keeping candidate order.
pub fn merged_subset(candidates: &[String], merged_output: &str) -> Vec<String> {
    let merged = branch_list(merged_output);
    candidates
        .iter()
        .filter(|candidate| merged.iter().any(|m| m == *candidate))
        .cloned()
        .collect()
}

/// Epoch seconds from `log -1 --format=%ct`.
pub fn commit_time(output: &str) -> Option<i64> {
    output.trim().parse::<i64>().ok()
}

/// Cosmetic tone for a finished pull, judged from the last captured
/// line and the exit code only. Best effort; never authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullTone {
    UpToDate,
    Success,
    Warning,
    Error,
}

pub fn classify_pull_result(last_line: &str, exit_code: i32) -> PullTone {
    let lower = last_line.to_lowercase();
    if lower.contains("error") || lower.contains("fatal") {
        return PullTone::Error;
    }
    if exit_code == 0 {
        if lower.contains("up to date") || lower.contains("up-to-date") {
            return PullTone::UpToDate;
        }
        if lower.contains("done") || (lower.contains("file") && lower.contains("changed")) {
            return PullTone::Success;
        }
    }
    PullTone::Warning
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_status_is_clean() {
        assert_eq!(local_state(""), LocalState::Clean);
        assert_eq!(local_state("  \n"), LocalState::Clean);
    }

    #[test]
    fn status_lines_count_per_marker() {
        let output = "1 .M N... 100644 100644 100644 aaaa bbbb src/lib.rs\n?? newfile.txt\n";
        assert_eq!(
            local_state(output),
            LocalState::Dirty {
                added: 0,
                modified: 1,
                deleted: 0,
                untracked: 1,
            }
        );
    }

    #[test]
    fn status_counts_adds_deletes_and_conflicts() {
        let output = concat!(
            "1 A. N... 000000 100644 100644 0000 aaaa new.rs\n",
            "1 .D N... 100644 100644 000000 bbbb 0000 gone.rs\n",
            "2 R. N... 100644 100644 100644 cccc dddd R100 new-name.rs\told-name.rs\n",
            "u UU N... 100644 100644 100644 100644 eeee ffff gggg conflicted.rs\n",
        );
        assert_eq!(
            local_state(output),
            LocalState::Dirty {
                added: 1,
                modified: 2,
                deleted: 1,
                untracked: 0,
            }
        );
    }

    #[test]
    fn remote_counts_map_onto_variants() {
        assert_eq!(remote_counts("0\t0\n"), RemoteState::Synced);
        assert_eq!(remote_counts("3\t0\n"), RemoteState::Ahead { count: 3 });
        assert_eq!(remote_counts("0\t2\n"), RemoteState::Behind { count: 2 });
        assert_eq!(
            remote_counts("1\t1\n"),
            RemoteState::Diverged { ahead: 1, behind: 1 }
        );
    }

    #[test]
    fn malformed_counts_degrade_to_error() {
        assert!(matches!(remote_counts("nonsense"), RemoteState::Error { .. }));
        assert!(matches!(remote_counts("4"), RemoteState::Error { .. }));
    }

    #[test]
    fn stderr_classification() {
        assert_eq!(
            classify_remote_failure("fatal: no upstream configured for branch 'topic'"),
            RemoteState::NoUpstream
        );
        assert_eq!(
            classify_remote_failure("fatal: ambiguous argument '@{u}': bad revision"),
            RemoteState::NoUpstream
        );
        assert_eq!(
            classify_remote_failure("fatal: HEAD does not point to a branch"),
            RemoteState::Detached
        );
        assert_eq!(
            classify_remote_failure("fatal: no such branch: 'gone'"),
            RemoteState::Detached
        );
        assert!(matches!(
            classify_remote_failure("fatal: something else entirely"),
            RemoteState::Error { .. }
        ));
        assert!(matches!(
            classify_remote_failure("   "),
            RemoteState::Error { .. }
        ));
    }

    #[test]
    fn head_ref_variants() {
        assert_eq!(head_ref("main\n"), HeadRef::Branch("main".to_string()));
        assert_eq!(head_ref("HEAD\n"), HeadRef::Detached);
        assert_eq!(head_ref(""), HeadRef::Unborn);
    }

    #[test]
    fn prune_candidates_exclude_current_and_protected() {
        let all = vec![
            "main".to_string(),
            "develop".to_string(),
            "feature/a".to_string(),
            "feature/b".to_string(),
        ];
        let protected = vec!["main".to_string(), "develop".to_string()];
        let candidates = prune_candidates(&all, Some("feature/a"), &protected);
        assert_eq!(candidates, vec!["feature/b".to_string()]);
    }

    #[test]
    fn merged_subset_keeps_candidate_order() {
        let candidates = vec!["b".to_string(), "a".to_string(), "c".to_string()];
        let merged = merged_subset(&candidates, "a\nb\nmain\n");
        assert_eq!(merged, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn commit_time_parses_epoch_seconds() {
        assert_eq!(commit_time("1700000000\n"), Some(1_700_000_000));
        assert_eq!(commit_time(""), None);
        assert_eq!(commit_time("not-a-number"), None);
    }

    #[test]
    fn pull_classifier_is_keyword_driven() {
        assert_eq!(
            classify_pull_result("error: could not apply abc123", 1),
            PullTone::Error
        );
        assert_eq!(
            classify_pull_result("fatal: couldn't find remote ref", 128),
            PullTone::Error
        );
        assert_eq!(
            classify_pull_result("Already up to date.", 0),
            PullTone::UpToDate
        );
        assert_eq!(
            classify_pull_result("3 files changed, 10 insertions(+)", 0),
            PullTone::Success
        );
        assert_eq!(
            classify_pull_result("Rebasing (1/3)", 0),
            PullTone::Warning
        );
    }
}
