//! Records managed by the donation and volunteer-coordination client.

use serde::{Deserialize, Serialize};

use crate::{entity::EntityId, impl_entity, store_sqlite::now_ms};

/// How often a donation recurs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    #[default]
    OneTime,
    Monthly,
    Quarterly,
    Annually,
}

/// A pledged or completed donation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donation {
    pub id: Option<EntityId>,
    pub donor_name: String,
    pub email: Option<String>,
    /// Amount in cents to keep arithmetic exact.
    pub amount_cents: i64,
    /// Campaign the money is earmarked for, e.g. "Food Aid".
    pub donation_type: String,
    #[serde(default)]
    pub frequency: Frequency,
    pub message: Option<String>,
    pub created_at_ms: u64,
}

impl_entity!(Donation, "donation");

impl Donation {
    pub fn new(
        donor_name: impl Into<String>,
        amount_cents: i64,
        donation_type: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            donor_name: donor_name.into(),
            email: None,
            amount_cents,
            donation_type: donation_type.into(),
            frequency: Frequency::OneTime,
            message: None,
            created_at_ms: now_ms(),
        }
    }

    /// Amount formatted with two decimals, e.g. `"500.00"`.
    #[must_use]
    pub fn amount_display(&self) -> String {
        let sign = if self.amount_cents < 0 {
            "-"
        } else {
            ""
        };
        let abs = self.amount_cents.unsigned_abs();
        format!("{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Pending,
    Verified,
    Resolved,
}

/// An incident report submitted from the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: Option<EntityId>,
    pub reporter_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub report_type: String,
    pub location: String,
    pub description: String,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub status: ReportStatus,
    pub created_at_ms: u64,
}

impl_entity!(Report, "report");

impl Report {
    pub fn new(
        reporter_name: impl Into<String>,
        email: impl Into<String>,
        report_type: impl Into<String>,
        location: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            reporter_name: reporter_name.into(),
            email: email.into(),
            phone: None,
            report_type: report_type.into(),
            location: location.into(),
            description: description.into(),
            urgency: Urgency::Medium,
            status: ReportStatus::Pending,
            created_at_ms: now_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Donor,
    Volunteer,
    Reporter,
    Admin,
}

/// A registered user of the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Option<EntityId>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    pub created_at_ms: u64,
}

impl_entity!(UserProfile, "user_profile");

impl UserProfile {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            role,
            created_at_ms: now_ms(),
        }
    }

    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}
