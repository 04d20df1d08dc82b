//! The export run.
//!
//! [`Exporter::run`] validates the connection, prepares the export folder,
//! then walks the project's issues one at a time: render the PDF, create the
//! issue folder, download the attachments. Failures that concern a single
//! issue or attachment are recorded in the [`ExportReport`] and the run goes
//! on; failures that concern the whole run (credentials, listing, output
//! folder, archive) end it.

mod naming;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::api::{ApiError, Issue, IssueSource};
use crate::archive;
use crate::config::ExportJob;
use crate::error::{AppError, Result};
use crate::render::PdfRenderer;
use naming::{sanitize_component, NameAllocator};

/// Marks a folder as written by this tool. Only marked folders are cleared
/// before a run; the archive leaves the marker out.
pub(crate) const MARKER_FILE: &str = ".jira-export";

/// An issue that was not exported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedIssue {
    pub key: String,
    pub reason: String,
}

/// An attachment that was not downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedAttachment {
    pub issue_key: String,
    pub filename: String,
    pub reason: String,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    /// Keys of the exported issues, in listing order.
    pub exported: Vec<String>,
    pub skipped_issues: Vec<SkippedIssue>,
    pub skipped_attachments: Vec<SkippedAttachment>,
    /// The zip written at the end of the run.
    pub archive_path: PathBuf,
}

impl ExportReport {
    /// Whether anything was left out.
    pub fn is_complete(&self) -> bool {
        self.skipped_issues.is_empty() && self.skipped_attachments.is_empty()
    }
}

impl fmt::Display for ExportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Exported {} issue(s).", self.exported.len())?;

        if !self.skipped_issues.is_empty() {
            writeln!(f, "Skipped {} issue(s):", self.skipped_issues.len())?;
            for skipped in &self.skipped_issues {
                writeln!(f, "  {}: {}", skipped.key, skipped.reason)?;
            }
        }

        if !self.skipped_attachments.is_empty() {
            writeln!(f, "Skipped {} attachment(s):", self.skipped_attachments.len())?;
            for skipped in &self.skipped_attachments {
                writeln!(f, "  {} / {}: {}", skipped.issue_key, skipped.filename, skipped.reason)?;
            }
        }

        write!(f, "Archive: {}", self.archive_path.display())
    }
}

/// Exports the issues of one project from an [`IssueSource`].
pub struct Exporter<S> {
    source: S,
    renderer: PdfRenderer,
}

impl<S: IssueSource> Exporter<S> {
    pub fn new(source: S, renderer: PdfRenderer) -> Self {
        Self { source, renderer }
    }

    /// Run the export described by `job`.
    ///
    /// # Errors
    ///
    /// Rejected credentials, a failed issue listing, an unusable export
    /// folder or a failed archive end the run. Every other failure is
    /// recorded in the returned report.
    #[instrument(skip_all, fields(project = %job.project_key))]
    pub fn run(&self, job: &ExportJob) -> Result<ExportReport> {
        self.source.validate_connection()?;
        info!(url = %job.jira_url, "Connected to Jira");

        let root = job.output_dir.as_path();
        prepare_output_dir(root)?;

        let mut report = ExportReport::default();
        for item in self.source.list_issues(&job.project_key) {
            let issue = item?;
            self.export_issue(root, issue, &mut report)?;
        }

        report.archive_path = archive::archive(root)?;
        info!(
            exported = report.exported.len(),
            skipped_issues = report.skipped_issues.len(),
            skipped_attachments = report.skipped_attachments.len(),
            archive = %report.archive_path.display(),
            "Export finished"
        );
        Ok(report)
    }

    /// Export one issue into `<root>/<key>/`.
    ///
    /// Only errors that must end the run are returned.
    #[instrument(skip_all, fields(issue_key = %issue.key))]
    fn export_issue(&self, root: &Path, mut issue: Issue, report: &mut ExportReport) -> Result<()> {
        if !issue.has_all_comments() {
            match self.source.fetch_comments(&issue.key) {
                Ok(comments) => issue.set_comments(comments),
                Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
                Err(e) => warn!(error = %e, "Could not fetch all comments, using the ones listed"),
            }
        }

        let pdf = match self.renderer.render(&issue) {
            Ok(pdf) => pdf,
            Err(e) => {
                warn!(error = %e, "Skipping issue that cannot be rendered");
                report.skipped_issues.push(SkippedIssue {
                    key: issue.key.clone(),
                    reason: e.to_string(),
                });
                return Ok(());
            }
        };

        let dir = root.join(sanitize_component(&issue.key, "issue"));
        let mut skipped = Vec::new();
        match self.write_issue(&dir, &issue, &pdf, &mut skipped) {
            Ok(()) => {
                info!(attachments = issue.attachments().len() - skipped.len(), "Exported issue");
                report.exported.push(issue.key.clone());
                report.skipped_attachments.append(&mut skipped);
                Ok(())
            }
            Err(AppError::Io(e)) => {
                warn!(error = %e, "Skipping issue that could not be written");
                if let Err(cleanup) = fs::remove_dir_all(&dir) {
                    debug!(error = %cleanup, "Could not remove partial issue folder");
                }
                report.skipped_issues.push(SkippedIssue {
                    key: issue.key.clone(),
                    reason: e.to_string(),
                });
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Write the PDF and the attachments of one issue.
    fn write_issue(
        &self,
        dir: &Path,
        issue: &Issue,
        pdf: &[u8],
        skipped: &mut Vec<SkippedAttachment>,
    ) -> Result<()> {
        fs::create_dir_all(dir)?;

        let pdf_name = format!("{}.pdf", sanitize_component(&issue.key, "issue"));
        let mut names = NameAllocator::new();
        names.reserve(&pdf_name);
        fs::write(dir.join(&pdf_name), pdf)?;

        // Names depend only on the attachment list, not on which downloads succeed.
        let planned: Vec<_> = issue
            .attachments()
            .iter()
            .map(|attachment| (attachment, names.allocate(&attachment.filename)))
            .collect();

        for (attachment, name) in planned {
            match self.source.fetch_attachment(attachment) {
                Ok(bytes) => {
                    if name != attachment.filename {
                        debug!(original = %attachment.filename, saved_as = %name, "Renamed attachment");
                    }
                    let path = dir.join(&name);
                    if let Err(e) = fs::write(&path, bytes) {
                        warn!(filename = %attachment.filename, error = %e, "Could not save attachment");
                        if path.is_file() {
                            if let Err(cleanup) = fs::remove_file(&path) {
                                debug!(error = %cleanup, "Could not remove partial attachment");
                            }
                        }
                        skipped.push(SkippedAttachment {
                            issue_key: issue.key.clone(),
                            filename: attachment.filename.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
                Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
                Err(e) => {
                    warn!(
                        filename = %attachment.filename,
                        error = %e,
                        transient = e.is_transient(),
                        "Skipping attachment"
                    );
                    skipped.push(SkippedAttachment {
                        issue_key: issue.key.clone(),
                        filename: attachment.filename.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Empty (or create) the export folder and check it is writable.
///
/// A folder that holds anything is only cleared when it carries the export
/// marker; any other non-empty folder is refused untouched.
fn prepare_output_dir(root: &Path) -> Result<()> {
    if root.file_name().is_none() {
        return Err(AppError::output_dir(format!(
            "'{}' does not name a folder",
            root.display()
        )));
    }

    let context = |e: std::io::Error| AppError::output_dir(format!("{}: {}", root.display(), e));

    if root.is_dir() {
        if root.join(MARKER_FILE).is_file() {
            debug!(path = %root.display(), "Removing previous export");
            fs::remove_dir_all(root).map_err(context)?;
        } else if fs::read_dir(root).map_err(context)?.next().is_some() {
            return Err(AppError::output_dir(format!(
                "'{}' is not empty and does not hold a previous export",
                root.display()
            )));
        }
    } else if root.exists() {
        return Err(AppError::output_dir(format!(
            "'{}' exists and is not a folder",
            root.display()
        )));
    }

    fs::create_dir_all(root).map_err(context)?;
    fs::write(root.join(MARKER_FILE), b"").map_err(context)?;

    Ok(())
}
