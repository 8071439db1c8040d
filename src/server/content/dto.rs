//! Request bodies for content resources. Update bodies are partial: an
//! omitted or null key leaves the stored value unchanged.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::types::EnquiryStatus;

fn default_true() -> bool {
    true
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

#[derive(Debug, Deserialize)]
pub struct CreateNotice {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub is_important: bool,
    #[serde(default)]
    pub publish_date: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_visible: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateNotice {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub is_important: Option<bool>,
    pub publish_date: Option<DateTime<Utc>>,
    pub is_visible: Option<bool>,
    pub order: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGallery {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default = "default_true")]
    pub is_visible: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateGallery {
    pub title: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub is_visible: Option<bool>,
    pub order: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGalleryImage {
    pub url: String,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateGalleryImage {
    pub url: Option<String>,
    pub caption: Option<String>,
    pub order: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAchievement {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_visible: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateAchievement {
    pub title: Option<String>,
    pub description: Option<String>,
    pub year: Option<i32>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub is_visible: Option<bool>,
    pub order: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateStaff {
    pub name: String,
    pub designation: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default = "default_true")]
    pub is_visible: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateStaff {
    pub name: Option<String>,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
    pub is_visible: Option<bool>,
    pub order: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePage {
    pub title: String,
    /// Derived from the title when absent.
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub is_published: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePage {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub is_published: Option<bool>,
    pub order: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSection {
    pub section_type: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "empty_object")]
    pub content: serde_json::Value,
    #[serde(default = "default_true")]
    pub is_visible: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSection {
    pub section_type: Option<String>,
    pub title: Option<String>,
    pub content: Option<serde_json::Value>,
    pub is_visible: Option<bool>,
    pub order: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAdmission {
    pub session: String,
    #[serde(default)]
    pub is_open: bool,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateAdmission {
    pub session: Option<String>,
    pub is_open: Option<bool>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTemplate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "empty_object")]
    pub config: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTemplate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub config: Option<serde_json::Value>,
}

/// Submitted by the public admission form.
#[derive(Debug, Deserialize)]
pub struct CreateEnquiry {
    #[serde(default)]
    pub admission_id: Option<String>,
    pub student_name: String,
    pub parent_name: String,
    pub email: String,
    pub phone: String,
    pub grade: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEnquiry {
    pub status: EnquiryStatus,
}
