/// Applicant-tracking-system vendors recognised in the page URL.
pub const ATS_VENDORS: &[&str] = &[
    "greenhouse",
    "lever.co",
    "boards.greenhouse.io",
    "workday",
    "myworkdayjobs",
    "ashbyhq",
    "ashby",
    "smartrecruiters",
    "workable",
    "icims",
    "bamboohr",
    "jobs.lever",
    "workforcenow",
    "jobvite",
    "recruitee",
    "lever",
    "greenhouse.io",
];

pub const JOB_URL_TOKENS: &[&str] = &["job", "jobs", "careers", "apply"];

pub const PAGE_JOB_VOCABULARY: &[&str] = &[
    "apply",
    "job",
    "position",
    "role",
    "employment",
    "experience",
    "resume",
    "cv",
    "cover letter",
];

pub const COVER_LETTER_TOKENS: &[&str] = &["cover", "cover letter"];

pub const APPLY_PHRASES: &[&str] = &[
    "apply",
    "submit application",
    "send application",
    "apply now",
    "submit",
];

pub const COMPANY_KEYWORDS: &[&str] = &["company", "organisation", "organization", "employer", "org"];
pub const LOCATION_KEYWORDS: &[&str] = &["location", "city", "state", "country"];
pub const TITLE_KEYWORDS: &[&str] = &["title", "position", "role", "job title"];
pub const WORK_MODE_KEYWORDS: &[&str] = &[
    "remote",
    "hybrid",
    "on-site",
    "onsite",
    "on site",
    "work type",
    "work mode",
];

/// Case-insensitive "contains any of".
pub fn includes_any(text: &str, keywords: &[&str]) -> bool {
    let t = text.to_lowercase();
    keywords.iter().any(|k| t.contains(k))
}
