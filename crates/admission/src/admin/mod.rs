//! Listing helpers behind the admin dashboard: search, filter, sort, paging,
//! bulk status changes and export.

mod export;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use export::{Export, ExportFormat, ExportRow, export};

use crate::errors::AdminError;

pub const DEFAULT_PER_PAGE: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationStatus {
    #[default]
    #[serde(rename = "Pending Review")]
    PendingReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 3] = [
        ApplicationStatus::PendingReview,
        ApplicationStatus::Approved,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::PendingReview => "Pending Review",
            ApplicationStatus::Approved => "Approved",
            ApplicationStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = AdminError;

    /// Accepts the display name or a loose spelling (`pending`, `pending-review`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match normalized.as_str() {
            "pending" | "pendingreview" => Ok(ApplicationStatus::PendingReview),
            "approved" => Ok(ApplicationStatus::Approved),
            "rejected" => Ok(ApplicationStatus::Rejected),
            _ => Err(AdminError::UnknownStatus(s.to_string())),
        }
    }
}

/// One submitted application as the backend lists it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationRecord {
    pub id: String,
    pub application_id: String,
    pub student_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: String,
    pub address: String,
    pub guardian_name: String,
    pub guardian_phone: String,
    pub relation: String,
    pub room_number: String,
    pub admission_date: String,
    pub stay_duration: String,
    pub emergency_contact: String,
    pub status: ApplicationStatus,
    pub submission_date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    StudentName,
    ApplicationId,
    RoomNumber,
    Email,
    Status,
    SubmissionDate,
    AdmissionDate,
}

impl FromStr for SortField {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "student_name" => SortField::StudentName,
            "application_id" => SortField::ApplicationId,
            "room_number" => SortField::RoomNumber,
            "email" => SortField::Email,
            "status" => SortField::Status,
            "submission_date" => SortField::SubmissionDate,
            "admission_date" => SortField::AdmissionDate,
            other => return Err(AdminError::UnknownSortField(other.to_string())),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

fn digits(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

/// Case-insensitive match over names, room, email, ids and status; the digits
/// of the query are also matched against the three phone numbers.
pub fn matches_search(record: &ApplicationRecord, query: &str) -> bool {
    let term = query.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    let text_hit = [
        record.student_name.as_str(),
        record.room_number.as_str(),
        record.email.as_str(),
        record.application_id.as_str(),
        record.guardian_name.as_str(),
        record.status.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&term));
    if text_hit {
        return true;
    }

    let phone_query = digits(query);
    !phone_query.is_empty()
        && [&record.phone, &record.guardian_phone, &record.emergency_contact]
            .iter()
            .any(|phone| digits(phone).contains(&phone_query))
}

pub fn search<'a>(records: &'a [ApplicationRecord], query: &str) -> Vec<&'a ApplicationRecord> {
    records.iter().filter(|r| matches_search(r, query)).collect()
}

pub fn filter_status<'a>(
    records: Vec<&'a ApplicationRecord>,
    status: Option<ApplicationStatus>,
) -> Vec<&'a ApplicationRecord> {
    match status {
        Some(status) => records.into_iter().filter(|r| r.status == status).collect(),
        None => records,
    }
}

fn parse_instant(raw: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_utc())
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn compare(a: &ApplicationRecord, b: &ApplicationRecord, field: SortField) -> Ordering {
    match field {
        SortField::StudentName => a.student_name.cmp(&b.student_name),
        SortField::ApplicationId => a.application_id.cmp(&b.application_id),
        SortField::RoomNumber => a.room_number.cmp(&b.room_number),
        SortField::Email => a.email.cmp(&b.email),
        SortField::Status => a.status.as_str().cmp(b.status.as_str()),
        SortField::SubmissionDate => {
            parse_instant(&a.submission_date).cmp(&parse_instant(&b.submission_date))
        }
        SortField::AdmissionDate => {
            parse_instant(&a.admission_date).cmp(&parse_instant(&b.admission_date))
        }
    }
}

/// Stable sort; unparseable dates sort before every real date.
pub fn sort_records(records: &mut [&ApplicationRecord], field: SortField, direction: SortDirection) {
    records.sort_by(|a, b| match direction {
        SortDirection::Asc => compare(a, b, field),
        SortDirection::Desc => compare(b, a, field),
    });
}

/// One page of a listing. Pages are numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

/// Out-of-range pages come back empty with the real totals.
pub fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let page = page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page);
    let items = items
        .into_iter()
        .skip((page - 1).saturating_mul(per_page))
        .take(per_page)
        .collect();
    Page {
        items,
        page,
        per_page,
        total_items,
        total_pages,
    }
}

/// Search, filter, sort and page in one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationQuery {
    pub search: String,
    pub status: Option<ApplicationStatus>,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
    pub page: usize,
    pub per_page: usize,
}

impl Default for ApplicationQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: None,
            sort_field: SortField::SubmissionDate,
            sort_direction: SortDirection::Desc,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl ApplicationQuery {
    pub fn run<'a>(&self, records: &'a [ApplicationRecord]) -> Page<&'a ApplicationRecord> {
        let mut hits = filter_status(search(records, &self.search), self.status);
        sort_records(&mut hits, self.sort_field, self.sort_direction);
        debug!("{} of {} applications match", hits.len(), records.len());
        paginate(hits, self.page, self.per_page)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkUpdate {
    pub updated_count: usize,
    pub missing: Vec<String>,
}

/// Set `status` on every record whose `id` is listed.
pub fn bulk_update_status(
    records: &mut [ApplicationRecord],
    ids: &[String],
    status: ApplicationStatus,
) -> Result<BulkUpdate, AdminError> {
    if ids.is_empty() {
        return Err(AdminError::NothingSelected);
    }
    let mut updated_count = 0;
    let mut missing = Vec::new();
    for id in ids {
        match records.iter_mut().find(|r| &r.id == id) {
            Some(record) => {
                record.status = status;
                updated_count += 1;
            }
            None => missing.push(id.clone()),
        }
    }
    Ok(BulkUpdate {
        updated_count,
        missing,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplicationStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

pub fn stats(records: &[ApplicationRecord]) -> ApplicationStats {
    records.iter().fold(
        ApplicationStats {
            total: records.len(),
            ..ApplicationStats::default()
        },
        |mut acc, r| {
            match r.status {
                ApplicationStatus::PendingReview => acc.pending += 1,
                ApplicationStatus::Approved => acc.approved += 1,
                ApplicationStatus::Rejected => acc.rejected += 1,
            }
            acc
        },
    )
}
