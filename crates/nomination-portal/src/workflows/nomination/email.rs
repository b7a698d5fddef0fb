use std::fmt::Write as _;
use std::sync::OnceLock;

use serde::Serialize;
use tera::{Context, Tera};

use super::domain::{ApplicationRecord, ApplicationStatus};

const PROGRAM_NAME: &str = "21st Ten Outstanding Pupils & Students - Antique";
const STATUS_TEMPLATE: &str = "status_email.html";

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("status email could not be rendered: {0}")]
    Template(#[from] tera::Error),
}

/// Message handed to the transactional e-mail relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

struct StatusCopy {
    title: &'static str,
    message: &'static str,
    accent: &'static str,
}

pub fn status_subject(status: ApplicationStatus) -> &'static str {
    match status {
        ApplicationStatus::Pending => "TOPS Antique - Application Received",
        ApplicationStatus::UnderReview => "TOPS Antique - Application Under Review",
        ApplicationStatus::Approved => "TOPS Antique - Application Approved! 🎉",
        ApplicationStatus::Rejected => "TOPS Antique - Application Status Update",
    }
}

fn status_copy(status: ApplicationStatus) -> StatusCopy {
    match status {
        ApplicationStatus::Pending => StatusCopy {
            title: "Application Received",
            message: "Thank you for submitting your application. Your application has been received and is pending review.",
            accent: "#f59e0b",
        },
        ApplicationStatus::UnderReview => StatusCopy {
            title: "Application Under Review",
            message: "Your application is currently being reviewed by our evaluation committee. We will notify you once the review is complete.",
            accent: "#3b82f6",
        },
        ApplicationStatus::Approved => StatusCopy {
            title: "Congratulations! Application Approved",
            message: "We are pleased to inform you that your application has been approved! You have been selected for the program.",
            accent: "#10b981",
        },
        ApplicationStatus::Rejected => StatusCopy {
            title: "Application Status Update",
            message: "Thank you for your interest in the program. After careful consideration, we regret to inform you that we are unable to approve your application at this time.",
            accent: "#ef4444",
        },
    }
}

/// Compose the status notification for an applicant's registered address.
pub fn status_email(
    record: &ApplicationRecord,
    status_url: &str,
    note: Option<&str>,
) -> Result<EmailMessage, EmailError> {
    let status = record.status;
    let copy = status_copy(status);
    let note = note.map(str::trim).filter(|note| !note.is_empty());

    Ok(EmailMessage {
        to: record.form.email.clone(),
        subject: status_subject(status).to_string(),
        html: render_html(record, &copy, status_url, note)?,
        text: render_text(record, &copy, status_url, note),
    })
}

fn templates() -> Result<&'static Tera, EmailError> {
    static TEMPLATES: OnceLock<Tera> = OnceLock::new();
    if let Some(tera) = TEMPLATES.get() {
        return Ok(tera);
    }
    let mut tera = Tera::default();
    tera.add_raw_template(STATUS_TEMPLATE, include_str!("../../../templates/status_email.html"))?;
    Ok(TEMPLATES.get_or_init(|| tera))
}

fn render_html(
    record: &ApplicationRecord,
    copy: &StatusCopy,
    status_url: &str,
    note: Option<&str>,
) -> Result<String, EmailError> {
    let note_paragraphs: Vec<&str> = note
        .map(|note| {
            note.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let mut ctx = Context::new();
    ctx.insert("subject", status_subject(record.status));
    ctx.insert("accent", copy.accent);
    ctx.insert("title", copy.title);
    ctx.insert("program", PROGRAM_NAME);
    ctx.insert("full_name", &record.form.full_name);
    ctx.insert("message", copy.message);
    ctx.insert("note_paragraphs", &note_paragraphs);
    ctx.insert("token", record.public_status_token.as_str());
    ctx.insert("status_url", status_url);

    Ok(templates()?.render(STATUS_TEMPLATE, &ctx)?)
}

fn render_text(
    record: &ApplicationRecord,
    copy: &StatusCopy,
    status_url: &str,
    note: Option<&str>,
) -> String {
    let mut text = String::new();
    writeln!(text, "{}", copy.title).expect("write title");
    writeln!(text, "{PROGRAM_NAME}").expect("write program");
    text.push('\n');
    writeln!(text, "Dear {},", record.form.full_name).expect("write greeting");
    text.push('\n');
    writeln!(text, "{}", copy.message).expect("write message");

    if let Some(note) = note {
        text.push('\n');
        writeln!(text, "Additional comments:\n{note}").expect("write note");
    }

    text.push('\n');
    writeln!(text, "Status token: {}", record.public_status_token).expect("write token");
    writeln!(text, "Check your status: {status_url}").expect("write link");
    text
}
