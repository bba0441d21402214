use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ApplicationRecord;
use crate::errors::AdminError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(AdminError::UnknownFormat(s.to_string())),
        }
    }
}

/// Flat, human-labelled view of a record used by both export formats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow<'a> {
    #[serde(rename = "Application ID")]
    pub application_id: &'a str,
    #[serde(rename = "Student Name")]
    pub student_name: &'a str,
    #[serde(rename = "Email")]
    pub email: &'a str,
    #[serde(rename = "Phone")]
    pub phone: &'a str,
    #[serde(rename = "Date of Birth")]
    pub date_of_birth: &'a str,
    #[serde(rename = "Address")]
    pub address: &'a str,
    #[serde(rename = "Guardian Name")]
    pub guardian_name: &'a str,
    #[serde(rename = "Guardian Phone")]
    pub guardian_phone: &'a str,
    #[serde(rename = "Relation")]
    pub relation: &'a str,
    #[serde(rename = "Room Number")]
    pub room_number: &'a str,
    #[serde(rename = "Admission Date")]
    pub admission_date: &'a str,
    #[serde(rename = "Stay Duration")]
    pub stay_duration: &'a str,
    #[serde(rename = "Emergency Contact")]
    pub emergency_contact: &'a str,
    #[serde(rename = "Status")]
    pub status: &'static str,
    #[serde(rename = "Submission Date")]
    pub submission_date: &'a str,
}

impl<'a> ExportRow<'a> {
    pub const HEADERS: [&'static str; 15] = [
        "Application ID",
        "Student Name",
        "Email",
        "Phone",
        "Date of Birth",
        "Address",
        "Guardian Name",
        "Guardian Phone",
        "Relation",
        "Room Number",
        "Admission Date",
        "Stay Duration",
        "Emergency Contact",
        "Status",
        "Submission Date",
    ];

    pub fn new(r: &'a ApplicationRecord) -> Self {
        Self {
            application_id: &r.application_id,
            student_name: &r.student_name,
            email: &r.email,
            phone: &r.phone,
            date_of_birth: &r.date_of_birth,
            address: &r.address,
            guardian_name: &r.guardian_name,
            guardian_phone: &r.guardian_phone,
            relation: &r.relation,
            room_number: &r.room_number,
            admission_date: &r.admission_date,
            stay_duration: &r.stay_duration,
            emergency_contact: &r.emergency_contact,
            status: r.status.as_str(),
            submission_date: &r.submission_date,
        }
    }

    pub fn cells(&self) -> [&str; 15] {
        [
            self.application_id,
            self.student_name,
            self.email,
            self.phone,
            self.date_of_birth,
            self.address,
            self.guardian_name,
            self.guardian_phone,
            self.relation,
            self.room_number,
            self.admission_date,
            self.stay_duration,
            self.emergency_contact,
            self.status,
            self.submission_date,
        ]
    }
}

/// Rendered export ready to be written or downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Export {
    pub data: String,
    pub filename: String,
    pub content_type: &'static str,
}

fn csv_cell(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_line(cells: &[&str]) -> String {
    let mut line = cells.iter().map(|c| csv_cell(c)).collect::<Vec<_>>().join(",");
    line.push_str("\r\n");
    line
}

/// Render `records` in `format`. An empty CSV export has no header row.
pub fn export<'a, I>(records: I, format: ExportFormat, now: DateTime<Utc>) -> Result<Export, serde_json::Error>
where
    I: IntoIterator<Item = &'a ApplicationRecord>,
{
    let rows: Vec<ExportRow<'a>> = records.into_iter().map(ExportRow::new).collect();
    let data = match format {
        ExportFormat::Csv if rows.is_empty() => String::new(),
        ExportFormat::Csv => std::iter::once(csv_line(&ExportRow::HEADERS))
            .chain(rows.iter().map(|row| csv_line(&row.cells())))
            .collect(),
        ExportFormat::Json => serde_json::to_string_pretty(&rows)?,
    };
    Ok(Export {
        data,
        filename: format!(
            "applications_export_{}.{}",
            now.format("%Y%m%d_%H%M%S"),
            format.extension()
        ),
        content_type: format.content_type(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::ApplicationStatus;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 14, 5, 9).unwrap()
    }

    fn records() -> Vec<ApplicationRecord> {
        vec![ApplicationRecord {
            application_id: "HA-1".into(),
            student_name: "Asha Rao".into(),
            address: "12 Lake Road, \"Green\" Villa".into(),
            status: ApplicationStatus::Approved,
            ..ApplicationRecord::default()
        }]
    }

    #[test]
    fn csv_quotes_where_needed() {
        let records = records();
        let out = export(&records, ExportFormat::Csv, now()).unwrap();
        assert_eq!(out.filename, "applications_export_20261016_140509.csv");
        assert_eq!(out.content_type, "text/csv");

        let lines: Vec<&str> = out.data.split("\r\n").collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Application ID,Student Name,Email"));
        assert_eq!(
            lines[1],
            "HA-1,Asha Rao,,,,\"12 Lake Road, \"\"Green\"\" Villa\",,,,,,,,Approved,"
        );
    }

    #[test]
    fn json_keeps_column_labels() {
        let records = records();
        let out = export(&records, ExportFormat::Json, now()).unwrap();
        assert_eq!(out.content_type, "application/json");
        let value: serde_json::Value = serde_json::from_str(&out.data).unwrap();
        assert_eq!(value[0]["Student Name"], "Asha Rao");
        assert_eq!(value[0]["Status"], "Approved");
    }

    #[test]
    fn empty_csv_is_empty() {
        let out = export(&Vec::new(), ExportFormat::Csv, now()).unwrap();
        assert_eq!(out.data, "");
        assert_eq!("JSON".parse::<ExportFormat>(), Ok(ExportFormat::Json));
    }
}
