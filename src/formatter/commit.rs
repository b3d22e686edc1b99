use crate::types::CommitRecord;

use super::{MarkdownContent, format_datetime};

/// Format filtered commits as a markdown list, newest first as returned by the host
pub fn commits_markdown(commits: &[CommitRecord]) -> MarkdownContent {
    let mut content = String::new();

    content.push_str(&format!("## Commits ({})\n\n", commits.len()));

    for commit in commits {
        let short_id = if commit.short_id.is_empty() {
            commit.id.chars().take(8).collect::<String>()
        } else {
            commit.short_id.clone()
        };

        content.push_str(&format!("### {} {}\n", short_id, commit.headline()));
        content.push_str(&format!(
            "- Author: {} <{}>\n",
            commit.author_name, commit.author_email
        ));
        if let Some(timestamp) = commit.timestamp {
            content.push_str(&format!("- Date: {}\n", format_datetime(timestamp)));
        }
        if let Some(web_url) = &commit.web_url {
            content.push_str(&format!("- URL: {}\n", web_url));
        }
        content.push('\n');
    }

    MarkdownContent(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_commits_markdown() {
        let commits = vec![CommitRecord {
            id: "0123456789abcdef".to_string(),
            short_id: String::new(),
            title: None,
            message: "Fix tree pagination\n\nDetails".to_string(),
            author_name: "Jane Doe".to_string(),
            author_email: "jane@example.com".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).single(),
            web_url: None,
        }];

        let result = commits_markdown(&commits);

        assert!(result.0.contains("## Commits (1)"));
        assert!(result.0.contains("### 01234567 Fix tree pagination"));
        assert!(result.0.contains("- Author: Jane Doe <jane@example.com>"));
        assert!(result.0.contains("- Date: 2024-05-01 12:30:00 UTC"));
        assert!(!result.0.contains("Details"));
    }
}
