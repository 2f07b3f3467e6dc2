use types::{Complaint, Status};

pub const RECENT_LIMIT: usize = 5;
pub const TOP_CATEGORY_LIMIT: usize = 5;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_complaints: usize,
    pub pending: usize,
    pub resolved: usize,
    pub total_users: u64,
}

impl DashboardStats {
    pub fn from_complaints(complaints: &[Complaint], total_users: u64) -> Self {
        let count = |status: Status| complaints.iter().filter(|c| c.status == status).count();

        Self {
            total_complaints: complaints.len(),
            pending: count(Status::Pending),
            resolved: count(Status::Completed),
            total_users,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStat {
    pub name: String,
    pub count: usize,
    /// Share of all complaints, rounded to one decimal place.
    pub percentage: f64,
}

/// The `limit` newest complaints, newest first.
pub fn recent_complaints(complaints: &[Complaint], limit: usize) -> Vec<Complaint> {
    let mut sorted: Vec<&Complaint> = complaints.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    sorted.into_iter().take(limit).cloned().collect()
}

/// The `limit` most frequent categories, most frequent first.
///
/// Categories with equal counts keep the order in which they first appear.
pub fn top_categories(complaints: &[Complaint], limit: usize) -> Vec<CategoryStat> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for complaint in complaints {
        match counts
            .iter_mut()
            .find(|(name, _)| *name == complaint.category)
        {
            Some((_, count)) => *count += 1,
            None => counts.push((complaint.category.as_str(), 1)),
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let total = complaints.len();
    counts
        .into_iter()
        .take(limit)
        .map(|(name, count)| CategoryStat {
            name: name.to_string(),
            count,
            percentage: percentage(count, total),
        })
        .collect()
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 1000.0).round() / 10.0
}
