use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Working arrangement advertised for a role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkMode {
    #[default]
    #[serde(rename = "")]
    Unspecified,
    Remote,
    Hybrid,
    #[serde(rename = "On-site")]
    OnSite,
}

impl WorkMode {
    /// Find a work mode named in free text. Remote beats hybrid beats
    /// on-site when several appear.
    pub fn detect(text: &str) -> WorkMode {
        let t = text.to_lowercase();
        if t.contains("remote") {
            WorkMode::Remote
        } else if t.contains("hybrid") {
            WorkMode::Hybrid
        } else if t.contains("on-site") || t.contains("onsite") || t.contains("on site") {
            WorkMode::OnSite
        } else {
            WorkMode::Unspecified
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkMode::Unspecified => "",
            WorkMode::Remote => "Remote",
            WorkMode::Hybrid => "Hybrid",
            WorkMode::OnSite => "On-site",
        }
    }

    pub fn is_specified(&self) -> bool {
        *self != WorkMode::Unspecified
    }
}

/// Calendar format for `applicationDate`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFormat {
    /// MM/DD/YYYY
    #[default]
    Us,
    /// YYYY-MM-DD
    Iso,
}

impl DateFormat {
    pub fn format(&self, date: NaiveDate) -> String {
        match self {
            DateFormat::Us => date.format("%m/%d/%Y").to_string(),
            DateFormat::Iso => date.format("%Y-%m-%d").to_string(),
        }
    }

    pub fn parse_name(name: &str) -> Option<DateFormat> {
        match name.to_lowercase().as_str() {
            "us" => Some(DateFormat::Us),
            "iso" => Some(DateFormat::Iso),
            _ => None,
        }
    }
}

/// One captured job application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub company: String,
    pub location: String,
    pub title: String,
    pub work_mode: WorkMode,
    pub application_date: String,
    pub url: String,
    pub resume: String,
}

impl JobRecord {
    /// Field lookup by its wire name, used by script expectations.
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "company" => Some(&self.company),
            "location" => Some(&self.location),
            "title" => Some(&self.title),
            "workMode" | "work_mode" => Some(self.work_mode.as_str()),
            "applicationDate" | "application_date" => Some(&self.application_date),
            "url" => Some(&self.url),
            "resume" => Some(&self.resume),
            _ => None,
        }
    }
}
