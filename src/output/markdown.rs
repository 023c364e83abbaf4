//! Markdown job reports
//!
//! This module renders a single job, including its broken-link details, as a
//! human-readable markdown report.

use crate::state::JobStatus;
use crate::storage::JobRecord;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown report for a job to a file
///
/// # Arguments
///
/// * `job` - The job, loaded with its broken-link details
/// * `output_path` - Path where the markdown file should be written
pub fn write_job_report(job: &JobRecord, output_path: &Path) -> std::io::Result<()> {
    let markdown = format_job_report(job);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a job as markdown
pub fn format_job_report(job: &JobRecord) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Page Report: {}\n\n", job.address));

    md.push_str("## Job\n\n");
    md.push_str(&format!("- **ID**: {}\n", job.id));
    md.push_str(&format!("- **Status**: {}\n", job.status));
    md.push_str(&format!("- **Created**: {}\n", job.created_at));
    md.push_str(&format!("- **Updated**: {}\n", job.updated_at));
    if let Some(message) = &job.error_message {
        md.push_str(&format!("- **Error**: {}\n", message));
    }
    md.push('\n');

    if job.status != JobStatus::Done {
        md.push_str("_No crawl result is available for this job._\n");
        return md;
    }

    md.push_str("## Document\n\n");
    md.push_str(&format!(
        "- **HTML Version**: {}\n",
        job.html_version.as_deref().unwrap_or("Unknown")
    ));
    let title = job.title.as_deref().unwrap_or_default();
    if title.is_empty() {
        md.push_str("- **Title**: _(none)_\n");
    } else {
        md.push_str(&format!("- **Title**: {}\n", title));
    }
    md.push_str(&format!(
        "- **Login Form**: {}\n\n",
        if job.has_login_form { "yes" } else { "no" }
    ));

    md.push_str("## Headings\n\n");
    md.push_str("| Level | Count |\n");
    md.push_str("|-------|-------|\n");
    for (level, count) in job.heading_counts().iter().enumerate() {
        md.push_str(&format!("| h{} | {} |\n", level + 1, count));
    }
    md.push('\n');

    md.push_str("## Links\n\n");
    md.push_str(&format!("- **Internal**: {}\n", job.internal_links));
    md.push_str(&format!("- **External**: {}\n", job.external_links));
    md.push_str(&format!("- **Broken**: {}\n\n", job.broken_links));

    if !job.broken_link_details.is_empty() {
        md.push_str("## Broken Links\n\n");
        md.push_str("| URL | Status |\n");
        md.push_str("|-----|--------|\n");
        for link in &job.broken_link_details {
            let status = if link.status_code == 0 {
                "no response".to_string()
            } else {
                link.status_code.to_string()
            };
            md.push_str(&format!("| {} | {} |\n", link.url, status));
        }
        md.push('\n');
    }

    md
}
