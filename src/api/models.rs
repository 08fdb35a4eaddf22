use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemKind {
    Lost,
    Found,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    Open,
    Claimed,
    Resolved,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    #[default]
    Normal,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactPlatform {
    Whatsapp,
    Instagram,
    Telegram,
    Email,
    Other,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnMethod {
    #[default]
    BringByFinder,
    HandedToSecurity,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimStatus {
    Pending,
    Approved,
    Rejected,
}

macro_rules! wire_parse {
    ($ty:ty, $code:literal) => {
        impl $ty {
            /// Parse the wire name, case-insensitive.
            pub fn parse(s: &str) -> AppResult<Self> {
                let wire = serde_json::Value::String(s.trim().to_ascii_uppercase().replace('-', "_"));
                serde_json::from_value(wire)
                    .map_err(|_| AppError::user($code, format!("unrecognised value '{}'", s)))
            }

            pub fn as_wire(&self) -> String {
                match serde_json::to_value(self) {
                    Ok(serde_json::Value::String(s)) => s,
                    _ => String::new(),
                }
            }
        }
    };
}

wire_parse!(ItemKind, "bad_item_type");
wire_parse!(ItemStatus, "bad_item_status");
wire_parse!(Urgency, "bad_urgency");
wire_parse!(ContactPlatform, "bad_platform");
wire_parse!(ReturnMethod, "bad_return_method");
wire_parse!(ClaimStatus, "bad_claim_status");

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContactResponse {
    pub platform: String,
    pub value: String,
}

/// Verification question as shown to a claimer; the answer never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationResponse {
    #[serde(default)]
    pub id: Option<String>,
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemResponse {
    pub id: String,
    pub title: String,
    pub category_id: String,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub status: ItemStatus,
    pub created_at: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(default)]
    pub location_id: Option<String>,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub location_last_seen: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date_lost: Option<String>,
    #[serde(default)]
    pub date_found: Option<String>,
    #[serde(default)]
    pub urgency: Option<Urgency>,
    #[serde(default)]
    pub offer_reward: Option<bool>,
    #[serde(default)]
    pub show_phone: Option<bool>,
    #[serde(default)]
    pub contacts: Vec<ContactResponse>,
    #[serde(default)]
    pub verifications: Vec<VerificationResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContactRequest {
    pub platform: ContactPlatform,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationRequest {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateLostItemRequest {
    pub title: String,
    pub category_id: String,
    pub date_lost: NaiveDate,
    pub location_last_seen: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub offer_reward: bool,
    #[serde(default)]
    pub show_phone: bool,
    #[serde(default)]
    pub contacts: Vec<ContactRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateFoundItemRequest {
    pub title: String,
    pub category_id: String,
    pub location_id: String,
    pub date_found: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub return_method: ReturnMethod,
    #[serde(default)]
    pub cod: bool,
    #[serde(default)]
    pub show_phone: bool,
    #[serde(default)]
    pub contacts: Vec<ContactRequest>,
    pub verifications: Vec<VerificationRequest>,
}

fn require(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::user("missing_field", format!("{} is required", field)));
    }
    Ok(())
}

fn check_contacts(contacts: &[ContactRequest]) -> AppResult<()> {
    for c in contacts {
        require("contact value", &c.value)?;
    }
    Ok(())
}

impl CreateLostItemRequest {
    pub fn validate(&self) -> AppResult<()> {
        require("title", &self.title)?;
        require("category_id", &self.category_id)?;
        require("location_last_seen", &self.location_last_seen)?;
        check_contacts(&self.contacts)
    }
}

impl CreateFoundItemRequest {
    /// A found item must carry at least one verification question so claims can be checked.
    pub fn validate(&self) -> AppResult<()> {
        require("title", &self.title)?;
        require("category_id", &self.category_id)?;
        require("location_id", &self.location_id)?;
        check_contacts(&self.contacts)?;
        if self.verifications.is_empty() {
            return Err(AppError::user("missing_verification", "at least one verification question is required"));
        }
        for v in &self.verifications {
            require("verification question", &v.question)?;
            require("verification answer", &v.answer)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CampusLocation {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateCampusLocationRequest {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl CreateCampusLocationRequest {
    pub fn validate(&self) -> AppResult<()> {
        require("name", &self.name)?;
        if !(-90.0..=90.0).contains(&self.latitude) || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(AppError::user(
                "bad_coordinates",
                format!("({}, {}) is not a valid coordinate", self.latitude, self.longitude),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Asset {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category_id: String,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub private_image_url: Option<String>,
    #[serde(default)]
    pub qr_code_url: Option<String>,
    #[serde(default)]
    pub lost_mode: bool,
    pub created_at: String,
    #[serde(default)]
    pub owner_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateAssetRequest {
    pub description: String,
    pub category_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_image_url: Option<String>,
    #[serde(default)]
    pub lost_mode: bool,
}

/// Answer to one verification question of a found item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClaimAnswer {
    pub question_id: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmitClaimRequest {
    pub item_id: String,
    pub answers: Vec<ClaimAnswer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl SubmitClaimRequest {
    pub fn validate(&self) -> AppResult<()> {
        require("item_id", &self.item_id)?;
        if self.answers.is_empty() {
            return Err(AppError::user("missing_answers", "please answer all verification questions"));
        }
        for a in &self.answers {
            if a.answer.trim().is_empty() {
                return Err(AppError::user("missing_answers", "please answer all verification questions"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClaimResponse {
    pub id: String,
    pub item_id: String,
    pub owner_id: String,
    #[serde(default)]
    pub answer_input: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub status: ClaimStatus,
    pub created_at: String,
}

/// Claimer as embedded in a claim listing. Looser than `UserIdentity`: roles are left raw.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claim {
    pub id: String,
    pub item_id: String,
    pub owner: UserSummary,
    #[serde(default)]
    pub answer_input: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub status: ClaimStatus,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimDecision {
    Approve,
    Reject,
}

impl ClaimDecision {
    pub fn status(&self) -> ClaimStatus {
        match self {
            ClaimDecision::Approve => ClaimStatus::Approved,
            ClaimDecision::Reject => ClaimStatus::Rejected,
        }
    }

    pub fn parse(s: &str) -> AppResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approve" | "approved" => Ok(ClaimDecision::Approve),
            "reject" | "rejected" => Ok(ClaimDecision::Reject),
            other => Err(AppError::user("bad_decision", format!("expected approve or reject, got '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdateUserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadResponse {
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemFilter {
    pub status: Option<ItemStatus>,
    pub kind: Option<ItemKind>,
}

impl ItemFilter {
    /// Query string including the leading `?`, or empty when no filter is set.
    pub fn query_string(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(s) = self.status {
            parts.push(format!("status={}", urlencoding::encode(&s.as_wire())));
        }
        if let Some(k) = self.kind {
            parts.push(format!("type={}", urlencoding::encode(&k.as_wire())));
        }
        if parts.is_empty() { String::new() } else { format!("?{}", parts.join("&")) }
    }
}
