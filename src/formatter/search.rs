use crate::types::{GitRef, GrepOutcome, TreeEntry};

use super::MarkdownContent;

/// Format the result of a glob file search into markdown
///
/// Lists matching paths in the order the host returned them, with a header
/// naming the pattern and ref.
pub fn file_search_markdown(pattern: &str, git_ref: &GitRef, files: &[TreeEntry]) -> MarkdownContent {
    let mut content = String::new();

    content.push_str(&format!(
        "## Files matching `{}` at `{}`\n\n",
        pattern, git_ref
    ));
    content.push_str(&format!("**Matches:** {}\n\n", files.len()));

    for file in files {
        content.push_str(&format!("- {}\n", file.path));
    }

    MarkdownContent(content)
}

/// Format a grep outcome into markdown, grouped by file in scan order
pub fn grep_outcome_markdown(pattern: &str, git_ref: &GitRef, outcome: &GrepOutcome) -> MarkdownContent {
    let mut content = String::new();

    content.push_str(&format!("## Content matching `{}` at `{}`\n\n", pattern, git_ref));
    content.push_str(&format!(
        "**Matches:** {} in {} scanned files\n",
        outcome.matches.len(),
        outcome.files_scanned
    ));

    let mut current_file: Option<&str> = None;
    for search_match in &outcome.matches {
        if current_file != Some(search_match.file.as_str()) {
            content.push_str(&format!("\n### {}\n", search_match.file));
            current_file = Some(search_match.file.as_str());
        }

        match &search_match.context {
            Some(context) => {
                content.push_str(&format!("\nLine {}:\n```\n", search_match.line_number));
                for line in context {
                    content.push_str(line);
                    content.push('\n');
                }
                content.push_str("```\n");
            }
            None => {
                content.push_str(&format!(
                    "- {}: {}\n",
                    search_match.line_number, search_match.line_text
                ));
            }
        }
    }

    // Skipped files
    if !outcome.skipped.is_empty() {
        content.push_str(&format!("\n## Skipped Files ({})\n", outcome.skipped.len()));
        for skipped in &outcome.skipped {
            content.push_str(&format!("- {}: {}\n", skipped.path, skipped.reason));
        }
    }

    MarkdownContent(content)
}

/// Wrap a job log in a code block
pub fn job_log_markdown(job_id: u64, log: &str) -> MarkdownContent {
    let fence = "`".repeat(longest_backtick_run(log).max(2) + 1);
    let mut content = format!("## Job {} Log\n\n{}\n", job_id, fence);
    content.push_str(log);
    if !log.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(&fence);
    content.push('\n');
    MarkdownContent(content)
}

fn longest_backtick_run(text: &str) -> usize {
    text.split(|c| c != '`').map(str::len).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SearchMatch, SkippedFile};

    #[test]
    fn test_file_search_markdown() {
        let files = vec![TreeEntry::file("a.py"), TreeEntry::file("dir/b.py")];
        let result = file_search_markdown("**/*.py", &GitRef::default(), &files);

        assert!(result.0.contains("## Files matching `**/*.py` at `main`"));
        assert!(result.0.contains("**Matches:** 2"));
        assert!(result.0.find("- a.py").unwrap() < result.0.find("- dir/b.py").unwrap());
    }

    #[test]
    fn test_grep_outcome_markdown_groups_by_file() {
        let outcome = GrepOutcome {
            matches: vec![
                SearchMatch {
                    file: "src/a.rs".to_string(),
                    line_number: 3,
                    line_text: "todo!()".to_string(),
                    matched: "todo".to_string(),
                    context: None,
                },
                SearchMatch {
                    file: "src/a.rs".to_string(),
                    line_number: 9,
                    line_text: "// todo".to_string(),
                    matched: "todo".to_string(),
                    context: None,
                },
                SearchMatch {
                    file: "src/b.rs".to_string(),
                    line_number: 2,
                    line_text: "todo".to_string(),
                    matched: "todo".to_string(),
                    context: Some(vec!["fn b() {".to_string(), "todo".to_string()]),
                },
            ],
            skipped: vec![SkippedFile {
                path: "src/c.rs".to_string(),
                reason: "timeout".to_string(),
            }],
            files_scanned: 2,
        };

        let result = grep_outcome_markdown("todo", &GitRef::default(), &outcome);

        assert_eq!(result.0.matches("### src/a.rs").count(), 1);
        assert!(result.0.contains("- 3: todo!()"));
        assert!(result.0.contains("Line 2:\n```\nfn b() {\ntodo\n```"));
        assert!(result.0.contains("**Matches:** 3 in 2 scanned files"));
        assert!(result.0.contains("## Skipped Files (1)\n- src/c.rs: timeout"));
    }

    #[test]
    fn test_job_log_markdown_closes_code_block() {
        let result = job_log_markdown(12, "line");
        assert!(result.0.ends_with("line\n```\n"));
    }

    #[test]
    fn test_job_log_fence_outlasts_backticks_in_log() {
        let log = "$ cat README.md\n```\nmake\n```\n";
        let result = job_log_markdown(12, log);
        assert!(result.0.starts_with("## Job 12 Log\n\n````\n"));
        assert!(result.0.ends_with("```\n````\n"));

        let result = job_log_markdown(13, "nested `````` run");
        assert!(result.0.contains("```````\nnested"));
    }
}
