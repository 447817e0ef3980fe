use chrono::{DateTime, FixedOffset, Utc};
use claims_core::types::{DamageReport, NotificationType, ReportStatus};
use claims_delivery::OutboundMessage;

use crate::policy::DueReminder;

/// Title, plain message and HTML body for one notification.
///
/// The plain message is what gets stored and sent by SMS; the HTML body goes
/// to email only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub title: String,
    pub message: String,
    pub html: String,
}

impl Rendered {
    pub fn outbound(&self) -> OutboundMessage {
        OutboundMessage {
            subject: self.title.clone(),
            html: self.html.clone(),
            text: self.message.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Templates {
    frontend_url: String,
    offset: FixedOffset,
}

impl Templates {
    pub fn new(frontend_url: impl Into<String>, offset: FixedOffset) -> Self {
        Self {
            frontend_url: frontend_url.into().trim_end_matches('/').to_string(),
            offset,
        }
    }

    pub fn format_date(&self, instant: DateTime<Utc>) -> String {
        instant.with_timezone(&self.offset).format("%m/%d/%Y").to_string()
    }

    fn report_link(&self, report_id: &str) -> String {
        format!(
            r#"<p><a href="{}/damages/{}">View Damage Report</a></p>"#,
            html_escape(&self.frontend_url),
            html_escape(report_id)
        )
    }

    pub fn new_report(&self, report: &DamageReport) -> Rendered {
        let title = "New Damage Report".to_string();
        let deadline = self.format_date(report.airbnb_deadline);
        let message = format!(
            "New damage reported at {} ({}) by {}. Deadline: {}",
            report.property_name,
            report.item_label(),
            report.reporter_name(),
            deadline
        );

        let mut html = format!("<h2>{}</h2>\n", html_escape(&title));
        html.push_str(&field("Property", &report.property_name));
        html.push_str(&field("Address", report.property_address.as_deref().unwrap_or("")));
        html.push_str(&field("Item Damaged", report.item_label()));
        html.push_str(&field("Damage Type", report.damage_type.as_deref().unwrap_or("")));
        html.push_str(&field("Reported By", report.reporter_name()));
        html.push_str(&field("Damage Date", &self.format_date(report.damage_date)));
        html.push_str(&field("Airbnb Deadline", &deadline));
        if let Some(description) = report.description.as_deref().filter(|d| !d.is_empty()) {
            html.push_str(&field("Description", description));
        }
        html.push_str(&self.report_link(&report.id));

        Rendered { title, message, html }
    }

    pub fn status_update(&self, report: &DamageReport, status: ReportStatus) -> Rendered {
        let title = "Damage Report Status Update".to_string();
        let message = format!(
            "Status updated for damage at {} ({}): {}",
            report.property_name,
            report.item_label(),
            status
        );

        let mut html = format!("<h2>{}</h2>\n", html_escape(&title));
        html.push_str(&field("Property", &report.property_name));
        html.push_str(&field("Item Damaged", report.item_label()));
        html.push_str(&field("New Status", status.as_str()));
        html.push_str(&self.report_link(&report.id));

        Rendered { title, message, html }
    }

    pub fn reminder(&self, report: &DamageReport, due: &DueReminder) -> Rendered {
        let today = due.is_today();
        let (title, action) = match (due.kind, today) {
            (NotificationType::ProofDeadlineReminder, true) => {
                ("Proof Deadline Today!", "submit additional proof for")
            }
            (NotificationType::ProofDeadlineReminder, false) => {
                ("Proof Deadline Tomorrow", "submit additional proof for")
            }
            (_, true) => ("Airbnb Deadline Today!", "submit damage claim for"),
            (_, false) => ("Airbnb Deadline Tomorrow", "submit damage claim for"),
        };
        let message = format!(
            "{} is the deadline to {} {} ({}) to Airbnb",
            if today { "TODAY" } else { "TOMORROW" },
            action,
            report.property_name,
            report.item_label()
        );

        let mut html = format!(
            "<h2 style=\"color: {};\">{}</h2>\n",
            if today { "red" } else { "orange" },
            html_escape(title)
        );
        html.push_str(&field("Property", &report.property_name));
        html.push_str(&field("Item Damaged", report.item_label()));
        html.push_str(&field("Deadline", &self.format_date(due.deadline)));
        html.push_str(&field("Status", report.status.as_str()));
        html.push_str(&self.report_link(&report.id));

        Rendered {
            title: title.to_string(),
            message,
            html,
        }
    }
}

fn field(label: &str, value: &str) -> String {
    format!("<p><strong>{}:</strong> {}</p>\n", label, html_escape(value))
}

fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
