//! Markdown report generation
//!
//! This module renders a human-readable issue report for a finished crawl:
//! headline statistics, the issue list grouped by severity, the weakest
//! pages and the fetch errors.

use crate::crawler::CrawlResult;
use crate::output::summary::{Issue, Severity};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Number of lowest-scoring pages listed in the report
const WEAKEST_PAGES: usize = 10;

/// Writes the markdown report for `result` to `output_path`
pub fn generate_markdown_report(result: &CrawlResult, output_path: &Path) -> std::io::Result<()> {
    let markdown = format_markdown_report(result);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl result as markdown
pub fn format_markdown_report(result: &CrawlResult) -> String {
    let summary = &result.summary;
    let mut md = String::new();

    md.push_str("# Site Audit Report\n\n");

    // Run metadata
    md.push_str("## Crawl Information\n\n");
    md.push_str(&format!("- **Base URL**: {}\n", result.base_url));
    md.push_str(&format!("- **Duration**: {:.2} seconds\n", summary.duration));
    md.push_str(&format!(
        "- **Limits**: depth {}, {} URLs\n",
        summary.options.max_depth, summary.options.max_urls
    ));
    md.push_str(&format!(
        "- **robots.txt**: {}\n\n",
        if summary.options.follow_robots_txt {
            "respected"
        } else {
            "ignored"
        }
    ));

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Pages Crawled**: {}\n", summary.total_pages));
    md.push_str(&format!("- **Crawl Errors**: {}\n", summary.total_errors));
    md.push_str(&format!("- **Average Score**: {}/100\n", summary.avg_score));
    md.push_str(&format!("- **Max Depth Reached**: {}\n", summary.max_depth));
    md.push_str(&format!(
        "- **Links**: {} internal ({} per page), {} external ({} per page)\n",
        summary.total_internal_links,
        summary.avg_internal_links_per_page,
        summary.total_external_links,
        summary.avg_external_links_per_page
    ));
    md.push_str(&format!(
        "- **Images**: {} ({}% without alt text)\n\n",
        summary.total_images, summary.missing_alt_text_percentage
    ));

    md.push_str("| Check | Pages |\n");
    md.push_str("|-------|-------|\n");
    md.push_str(&format!("| Without H1 | {} |\n", summary.pages_without_h1));
    md.push_str(&format!(
        "| Multiple H1 | {} |\n",
        summary.pages_with_multiple_h1
    ));
    md.push_str(&format!(
        "| With canonical | {} |\n",
        summary.pages_with_canonical
    ));
    md.push_str(&format!(
        "| Mobile optimized | {} |\n",
        summary.mobile_optimized_pages
    ));
    md.push_str(&format!(
        "| Structured data | {} |\n",
        summary.pages_with_structured_data
    ));
    md.push_str(&format!("| hreflang | {} |\n\n", summary.pages_with_hreflang));

    // Issues
    md.push_str("## Issues\n\n");
    if summary.issues.is_empty() {
        md.push_str("No issues found.\n\n");
    } else {
        push_issue_section(&mut md, Severity::Critical, &summary.issues.critical);
        push_issue_section(&mut md, Severity::Major, &summary.issues.major);
        push_issue_section(&mut md, Severity::Minor, &summary.issues.minor);
    }

    // Weakest pages
    let mut scored: Vec<_> = result
        .pages
        .iter()
        .filter_map(|p| p.as_analysis())
        .collect();
    if !scored.is_empty() {
        scored.sort_by_key(|p| p.score);
        md.push_str(&format!("## Lowest Scoring Pages (top {})\n\n", WEAKEST_PAGES));
        md.push_str("| URL | Depth | Score | Title |\n");
        md.push_str("|-----|-------|-------|-------|\n");
        for page in scored.iter().take(WEAKEST_PAGES) {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                page.url,
                page.crawl_depth,
                page.score,
                escape_cell(&page.title)
            ));
        }
        md.push('\n');
    }

    // Pages whose analysis failed
    let failed: Vec<_> = result.pages.iter().filter(|p| p.is_error()).collect();
    if !failed.is_empty() {
        md.push_str("## Analysis Failures\n\n");
        for page in failed {
            md.push_str(&format!("- {} (depth {})\n", page.url(), page.crawl_depth()));
        }
        md.push('\n');
    }

    // Fetch errors
    if !result.errors.is_empty() {
        md.push_str("## Crawl Errors\n\n");
        md.push_str("| URL | Status | Error |\n");
        md.push_str("|-----|--------|-------|\n");
        for error in &result.errors {
            let status = error
                .status_code
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string());
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                error.url,
                status,
                escape_cell(&error.error)
            ));
        }
        md.push('\n');
    }

    md
}

fn push_issue_section(md: &mut String, severity: Severity, issues: &[Issue]) {
    if issues.is_empty() {
        return;
    }
    let heading = match severity {
        Severity::Critical => "Critical",
        Severity::Major => "Major",
        Severity::Minor => "Minor",
    };
    md.push_str(&format!("### {} ({})\n\n", heading, issues.len()));
    for issue in issues {
        md.push_str(&format!("- {}\n", issue.message));
    }
    md.push('\n');
}

/// Keeps table cells on one line and pipes from splitting columns
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlOptions;
    use crate::crawler::{CrawlError, FailedPage, PageAnalysis, PageResult};
    use crate::output::summarize;
    use std::time::Duration;

    fn analysis(url: &str, score: u32, h1: usize) -> PageResult {
        PageResult::Analyzed(Box::new(PageAnalysis {
            url: url.to_string(),
            crawl_depth: 1,
            title: format!("Title | {}", url),
            description: String::new(),
            h1: vec!["Heading".to_string(); h1],
            score,
            internal_links_count: 2,
            external_links_count: 0,
            internal_links: Vec::new(),
            external_links: Vec::new(),
            structured_data: None,
            canonical_url: None,
            hreflang_tags: None,
            has_mobile_viewport: true,
            schema_markup: None,
            word_count: 100,
            images_count: 0,
            images_with_alt_text: 0,
        }))
    }

    fn create_test_result() -> CrawlResult {
        let pages = vec![
            analysis("https://example.com/", 90, 2),
            analysis("https://example.com/a", 40, 1),
            PageResult::Failed(FailedPage {
                url: "https://example.com/b".to_string(),
                crawl_depth: 1,
                error: "analysis panicked".to_string(),
            }),
        ];
        let errors = vec![CrawlError {
            url: "https://example.com/gone".to_string(),
            error: "Request failed with status code 404".to_string(),
            status_code: Some(404),
        }];
        let summary = summarize(
            &pages,
            &errors,
            Duration::from_secs(3),
            &CrawlOptions::default(),
        );
        CrawlResult {
            base_url: "https://example.com".to_string(),
            pages,
            errors,
            summary,
        }
    }

    #[test]
    fn test_format_markdown_report() {
        let markdown = format_markdown_report(&create_test_result());

        assert!(markdown.contains("# Site Audit Report"));
        assert!(markdown.contains("- **Base URL**: https://example.com"));
        assert!(markdown.contains("- **Pages Crawled**: 3"));
        assert!(markdown.contains("- **Crawl Errors**: 1"));
    }

    #[test]
    fn test_markdown_groups_issues() {
        let markdown = format_markdown_report(&create_test_result());

        let critical = markdown.find("### Critical").unwrap();
        let major = markdown.find("### Major").unwrap();
        let minor = markdown.find("### Minor").unwrap();
        assert!(critical < major && major < minor);
        assert!(markdown.contains("1 pages could not be crawled"));
        assert!(markdown.contains("1 pages have multiple H1 headings"));
    }

    #[test]
    fn test_markdown_lists_pages_and_errors() {
        let markdown = format_markdown_report(&create_test_result());

        let weakest = markdown.find("| https://example.com/a | 1 | 40 |").unwrap();
        let strongest = markdown.find("| https://example.com/ | 1 | 90 |").unwrap();
        assert!(weakest < strongest);
        assert!(markdown.contains("Title \\| https://example.com/a"));
        assert!(markdown.contains("- https://example.com/b (depth 1)"));
        assert!(markdown.contains("| https://example.com/gone | 404 |"));
    }

    #[test]
    fn test_report_written_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        generate_markdown_report(&create_test_result(), &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# Site Audit Report"));
    }
}
