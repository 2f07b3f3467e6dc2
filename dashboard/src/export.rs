use jiff::civil::Date;
use types::{Complaint, Priority};

const HEADERS: [&str; 7] = [
    "ID",
    "Title",
    "Category",
    "Status",
    "Priority",
    "Created Date",
    "User Email",
];

/// Render complaints as CSV, one line per complaint under a header line.
///
/// Only the title is quoted; it is the one free-text field.
pub fn to_csv(complaints: &[Complaint]) -> String {
    let mut lines = Vec::with_capacity(complaints.len() + 1);
    lines.push(HEADERS.join(","));

    for complaint in complaints {
        let fields = [
            complaint.id.clone(),
            quote(&complaint.title),
            complaint.category.clone(),
            complaint.status.to_string(),
            complaint
                .priority
                .as_ref()
                .map_or(Priority::Medium.as_str(), Priority::as_str)
                .to_string(),
            complaint.created_at.strftime("%Y-%m-%d").to_string(),
            complaint
                .user_email
                .clone()
                .unwrap_or_else(|| "N/A".to_string()),
        ];
        lines.push(fields.join(","));
    }

    lines.join("\n")
}

pub fn file_name(date: Date) -> String {
    format!("complaints-export-{date}.csv")
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
