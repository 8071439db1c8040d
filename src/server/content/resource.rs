use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::dto::*;
use crate::error::Result;
use crate::server::response::ApiError;
use crate::server::validation::{required, required_opt, slugify, validate_slug};
use crate::store::{ContentStore, OrderedTable, Store};
use crate::types::*;

type ApiResult<T> = std::result::Result<T, ApiError>;

/// A school-scoped record served by the generic content handlers.
pub trait ContentResource: Serialize + Send + Sync + Sized + 'static {
    /// Singular name used in error messages.
    const LABEL: &'static str;
    /// Plan feature gating the resource, if any.
    const FEATURE: Option<Feature>;

    type Create: DeserializeOwned + Send + 'static;
    type Update: DeserializeOwned + Send + 'static;

    fn id(&self) -> &str;
    fn school_id(&self) -> &str;

    /// Validates a create body and builds the record. `order` is assigned
    /// by the store.
    fn build(req: Self::Create, school_id: &str, now: DateTime<Utc>) -> ApiResult<Self>;

    /// Merges the supplied keys of an update body.
    fn apply(&mut self, req: Self::Update) -> ApiResult<()>;

    fn touch(&mut self, now: DateTime<Utc>);

    fn list(store: &dyn Store, school_id: &str) -> Result<Vec<Self>>;
    fn fetch(store: &dyn Store, id: &str) -> Result<Option<Self>>;
    fn insert(store: &dyn Store, item: &mut Self) -> Result<()>;
    fn save(store: &dyn Store, item: &Self) -> Result<()>;
    fn remove(store: &dyn Store, id: &str) -> Result<bool>;
}

/// Content whose records carry a school-scoped `order`.
pub trait OrderedResource: ContentResource {
    const TABLE: OrderedTable;
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl ContentResource for Notice {
    const LABEL: &'static str = "Notice";
    const FEATURE: Option<Feature> = Some(Feature::Notices);
    type Create = CreateNotice;
    type Update = UpdateNotice;

    fn id(&self) -> &str {
        &self.id
    }

    fn school_id(&self) -> &str {
        &self.school_id
    }

    fn build(req: CreateNotice, school_id: &str, now: DateTime<Utc>) -> ApiResult<Self> {
        Ok(Notice {
            id: new_id(),
            school_id: school_id.to_string(),
            title: required(&req.title, "title")?,
            content: required(&req.content, "content")?,
            category: req.category,
            is_important: req.is_important,
            publish_date: req.publish_date,
            is_visible: req.is_visible,
            order: 0,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply(&mut self, req: UpdateNotice) -> ApiResult<()> {
        if let Some(title) = required_opt(req.title, "title")? {
            self.title = title;
        }
        if let Some(content) = required_opt(req.content, "content")? {
            self.content = content;
        }
        if req.category.is_some() {
            self.category = req.category;
        }
        if let Some(is_important) = req.is_important {
            self.is_important = is_important;
        }
        if req.publish_date.is_some() {
            self.publish_date = req.publish_date;
        }
        if let Some(is_visible) = req.is_visible {
            self.is_visible = is_visible;
        }
        if let Some(order) = req.order {
            self.order = order;
        }
        Ok(())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn list(store: &dyn Store, school_id: &str) -> Result<Vec<Self>> {
        store.list_notices(school_id)
    }

    fn fetch(store: &dyn Store, id: &str) -> Result<Option<Self>> {
        store.get_notice(id)
    }

    fn insert(store: &dyn Store, item: &mut Self) -> Result<()> {
        store.create_notice(item)
    }

    fn save(store: &dyn Store, item: &Self) -> Result<()> {
        store.update_notice(item)
    }

    fn remove(store: &dyn Store, id: &str) -> Result<bool> {
        store.delete_notice(id)
    }
}

impl OrderedResource for Notice {
    const TABLE: OrderedTable = OrderedTable::Notices;
}

impl ContentResource for Gallery {
    const LABEL: &'static str = "Gallery";
    const FEATURE: Option<Feature> = Some(Feature::Gallery);
    type Create = CreateGallery;
    type Update = UpdateGallery;

    fn id(&self) -> &str {
        &self.id
    }

    fn school_id(&self) -> &str {
        &self.school_id
    }

    fn build(req: CreateGallery, school_id: &str, now: DateTime<Utc>) -> ApiResult<Self> {
        Ok(Gallery {
            id: new_id(),
            school_id: school_id.to_string(),
            title: required(&req.title, "title")?,
            description: req.description,
            cover_image: req.cover_image,
            is_visible: req.is_visible,
            order: 0,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply(&mut self, req: UpdateGallery) -> ApiResult<()> {
        if let Some(title) = required_opt(req.title, "title")? {
            self.title = title;
        }
        if req.description.is_some() {
            self.description = req.description;
        }
        if req.cover_image.is_some() {
            self.cover_image = req.cover_image;
        }
        if let Some(is_visible) = req.is_visible {
            self.is_visible = is_visible;
        }
        if let Some(order) = req.order {
            self.order = order;
        }
        Ok(())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn list(store: &dyn Store, school_id: &str) -> Result<Vec<Self>> {
        store.list_galleries(school_id)
    }

    fn fetch(store: &dyn Store, id: &str) -> Result<Option<Self>> {
        store.get_gallery(id)
    }

    fn insert(store: &dyn Store, item: &mut Self) -> Result<()> {
        store.create_gallery(item)
    }

    fn save(store: &dyn Store, item: &Self) -> Result<()> {
        store.update_gallery(item)
    }

    fn remove(store: &dyn Store, id: &str) -> Result<bool> {
        store.delete_gallery(id)
    }
}

impl OrderedResource for Gallery {
    const TABLE: OrderedTable = OrderedTable::Galleries;
}

impl ContentResource for Achievement {
    const LABEL: &'static str = "Achievement";
    const FEATURE: Option<Feature> = Some(Feature::Achievements);
    type Create = CreateAchievement;
    type Update = UpdateAchievement;

    fn id(&self) -> &str {
        &self.id
    }

    fn school_id(&self) -> &str {
        &self.school_id
    }

    fn build(req: CreateAchievement, school_id: &str, now: DateTime<Utc>) -> ApiResult<Self> {
        Ok(Achievement {
            id: new_id(),
            school_id: school_id.to_string(),
            title: required(&req.title, "title")?,
            description: req.description,
            year: req.year,
            category: req.category,
            image_url: req.image_url,
            is_visible: req.is_visible,
            order: 0,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply(&mut self, req: UpdateAchievement) -> ApiResult<()> {
        if let Some(title) = required_opt(req.title, "title")? {
            self.title = title;
        }
        if req.description.is_some() {
            self.description = req.description;
        }
        if req.year.is_some() {
            self.year = req.year;
        }
        if req.category.is_some() {
            self.category = req.category;
        }
        if req.image_url.is_some() {
            self.image_url = req.image_url;
        }
        if let Some(is_visible) = req.is_visible {
            self.is_visible = is_visible;
        }
        if let Some(order) = req.order {
            self.order = order;
        }
        Ok(())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn list(store: &dyn Store, school_id: &str) -> Result<Vec<Self>> {
        store.list_achievements(school_id)
    }

    fn fetch(store: &dyn Store, id: &str) -> Result<Option<Self>> {
        store.get_achievement(id)
    }

    fn insert(store: &dyn Store, item: &mut Self) -> Result<()> {
        store.create_achievement(item)
    }

    fn save(store: &dyn Store, item: &Self) -> Result<()> {
        store.update_achievement(item)
    }

    fn remove(store: &dyn Store, id: &str) -> Result<bool> {
        store.delete_achievement(id)
    }
}

impl OrderedResource for Achievement {
    const TABLE: OrderedTable = OrderedTable::Achievements;
}

impl ContentResource for Staff {
    const LABEL: &'static str = "Staff member";
    const FEATURE: Option<Feature> = Some(Feature::StaffDirectory);
    type Create = CreateStaff;
    type Update = UpdateStaff;

    fn id(&self) -> &str {
        &self.id
    }

    fn school_id(&self) -> &str {
        &self.school_id
    }

    fn build(req: CreateStaff, school_id: &str, now: DateTime<Utc>) -> ApiResult<Self> {
        Ok(Staff {
            id: new_id(),
            school_id: school_id.to_string(),
            name: required(&req.name, "name")?,
            designation: required(&req.designation, "designation")?,
            department: req.department,
            email: req.email,
            phone: req.phone,
            photo_url: req.photo_url,
            bio: req.bio,
            is_visible: req.is_visible,
            order: 0,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply(&mut self, req: UpdateStaff) -> ApiResult<()> {
        if let Some(name) = required_opt(req.name, "name")? {
            self.name = name;
        }
        if let Some(designation) = required_opt(req.designation, "designation")? {
            self.designation = designation;
        }
        if req.department.is_some() {
            self.department = req.department;
        }
        if req.email.is_some() {
            self.email = req.email;
        }
        if req.phone.is_some() {
            self.phone = req.phone;
        }
        if req.photo_url.is_some() {
            self.photo_url = req.photo_url;
        }
        if req.bio.is_some() {
            self.bio = req.bio;
        }
        if let Some(is_visible) = req.is_visible {
            self.is_visible = is_visible;
        }
        if let Some(order) = req.order {
            self.order = order;
        }
        Ok(())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn list(store: &dyn Store, school_id: &str) -> Result<Vec<Self>> {
        store.list_staff(school_id)
    }

    fn fetch(store: &dyn Store, id: &str) -> Result<Option<Self>> {
        store.get_staff(id)
    }

    fn insert(store: &dyn Store, item: &mut Self) -> Result<()> {
        store.create_staff(item)
    }

    fn save(store: &dyn Store, item: &Self) -> Result<()> {
        store.update_staff(item)
    }

    fn remove(store: &dyn Store, id: &str) -> Result<bool> {
        store.delete_staff(id)
    }
}

impl OrderedResource for Staff {
    const TABLE: OrderedTable = OrderedTable::Staff;
}

impl ContentResource for Page {
    const LABEL: &'static str = "Page";
    const FEATURE: Option<Feature> = Some(Feature::CustomPages);
    type Create = CreatePage;
    type Update = UpdatePage;

    fn id(&self) -> &str {
        &self.id
    }

    fn school_id(&self) -> &str {
        &self.school_id
    }

    fn build(req: CreatePage, school_id: &str, now: DateTime<Utc>) -> ApiResult<Self> {
        let title = required(&req.title, "title")?;
        let slug = match req.slug {
            Some(slug) => slug.trim().to_string(),
            None => slugify(&title),
        };
        validate_slug(&slug)?;

        Ok(Page {
            id: new_id(),
            school_id: school_id.to_string(),
            title,
            slug,
            content: req.content,
            meta_title: req.meta_title,
            meta_description: req.meta_description,
            is_published: req.is_published,
            order: 0,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply(&mut self, req: UpdatePage) -> ApiResult<()> {
        if let Some(title) = required_opt(req.title, "title")? {
            self.title = title;
        }
        if let Some(slug) = req.slug {
            let slug = slug.trim().to_string();
            validate_slug(&slug)?;
            self.slug = slug;
        }
        if let Some(content) = req.content {
            self.content = content;
        }
        if req.meta_title.is_some() {
            self.meta_title = req.meta_title;
        }
        if req.meta_description.is_some() {
            self.meta_description = req.meta_description;
        }
        if let Some(is_published) = req.is_published {
            self.is_published = is_published;
        }
        if let Some(order) = req.order {
            self.order = order;
        }
        Ok(())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn list(store: &dyn Store, school_id: &str) -> Result<Vec<Self>> {
        store.list_pages(school_id)
    }

    fn fetch(store: &dyn Store, id: &str) -> Result<Option<Self>> {
        store.get_page(id)
    }

    fn insert(store: &dyn Store, item: &mut Self) -> Result<()> {
        store.create_page(item)
    }

    fn save(store: &dyn Store, item: &Self) -> Result<()> {
        store.update_page(item)
    }

    fn remove(store: &dyn Store, id: &str) -> Result<bool> {
        store.delete_page(id)
    }
}

impl OrderedResource for Page {
    const TABLE: OrderedTable = OrderedTable::Pages;
}

impl ContentResource for WebsiteSection {
    const LABEL: &'static str = "Section";
    const FEATURE: Option<Feature> = None;
    type Create = CreateSection;
    type Update = UpdateSection;

    fn id(&self) -> &str {
        &self.id
    }

    fn school_id(&self) -> &str {
        &self.school_id
    }

    fn build(req: CreateSection, school_id: &str, now: DateTime<Utc>) -> ApiResult<Self> {
        Ok(WebsiteSection {
            id: new_id(),
            school_id: school_id.to_string(),
            section_type: required(&req.section_type, "section_type")?,
            title: req.title,
            content: req.content,
            is_visible: req.is_visible,
            order: 0,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply(&mut self, req: UpdateSection) -> ApiResult<()> {
        if let Some(section_type) = required_opt(req.section_type, "section_type")? {
            self.section_type = section_type;
        }
        if req.title.is_some() {
            self.title = req.title;
        }
        if let Some(content) = req.content {
            self.content = content;
        }
        if let Some(is_visible) = req.is_visible {
            self.is_visible = is_visible;
        }
        if let Some(order) = req.order {
            self.order = order;
        }
        Ok(())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn list(store: &dyn Store, school_id: &str) -> Result<Vec<Self>> {
        store.list_sections(school_id)
    }

    fn fetch(store: &dyn Store, id: &str) -> Result<Option<Self>> {
        store.get_section(id)
    }

    fn insert(store: &dyn Store, item: &mut Self) -> Result<()> {
        store.create_section(item)
    }

    fn save(store: &dyn Store, item: &Self) -> Result<()> {
        store.update_section(item)
    }

    fn remove(store: &dyn Store, id: &str) -> Result<bool> {
        store.delete_section(id)
    }
}

impl OrderedResource for WebsiteSection {
    const TABLE: OrderedTable = OrderedTable::WebsiteSections;
}

impl ContentResource for Admission {
    const LABEL: &'static str = "Admission";
    const FEATURE: Option<Feature> = Some(Feature::Admissions);
    type Create = CreateAdmission;
    type Update = UpdateAdmission;

    fn id(&self) -> &str {
        &self.id
    }

    fn school_id(&self) -> &str {
        &self.school_id
    }

    fn build(req: CreateAdmission, school_id: &str, now: DateTime<Utc>) -> ApiResult<Self> {
        let admission = Admission {
            id: new_id(),
            school_id: school_id.to_string(),
            session: required(&req.session, "session")?,
            is_open: req.is_open,
            start_date: req.start_date,
            end_date: req.end_date,
            description: req.description,
            created_at: now,
            updated_at: now,
        };
        check_dates(&admission)?;
        Ok(admission)
    }

    fn apply(&mut self, req: UpdateAdmission) -> ApiResult<()> {
        if let Some(session) = required_opt(req.session, "session")? {
            self.session = session;
        }
        if let Some(is_open) = req.is_open {
            self.is_open = is_open;
        }
        if req.start_date.is_some() {
            self.start_date = req.start_date;
        }
        if req.end_date.is_some() {
            self.end_date = req.end_date;
        }
        if req.description.is_some() {
            self.description = req.description;
        }
        check_dates(self)
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn list(store: &dyn Store, school_id: &str) -> Result<Vec<Self>> {
        store.list_admissions(school_id)
    }

    fn fetch(store: &dyn Store, id: &str) -> Result<Option<Self>> {
        store.get_admission(id)
    }

    fn insert(store: &dyn Store, item: &mut Self) -> Result<()> {
        store.create_admission(item)
    }

    fn save(store: &dyn Store, item: &Self) -> Result<()> {
        store.update_admission(item)
    }

    fn remove(store: &dyn Store, id: &str) -> Result<bool> {
        store.delete_admission(id)
    }
}

fn check_dates(admission: &Admission) -> ApiResult<()> {
    if let (Some(start), Some(end)) = (admission.start_date, admission.end_date) {
        if end < start {
            return Err(ApiError::bad_request("end_date must not be before start_date"));
        }
    }
    Ok(())
}

impl ContentResource for Template {
    const LABEL: &'static str = "Template";
    const FEATURE: Option<Feature> = None;
    type Create = CreateTemplate;
    type Update = UpdateTemplate;

    fn id(&self) -> &str {
        &self.id
    }

    /// Empty for catalog templates, so the shared handlers never treat
    /// them as a school's own.
    fn school_id(&self) -> &str {
        self.school_id.as_deref().unwrap_or_default()
    }

    fn build(req: CreateTemplate, school_id: &str, now: DateTime<Utc>) -> ApiResult<Self> {
        Ok(Template {
            id: new_id(),
            school_id: Some(school_id.to_string()),
            name: required(&req.name, "name")?,
            description: req.description,
            config: req.config,
            is_premium: false,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply(&mut self, req: UpdateTemplate) -> ApiResult<()> {
        if let Some(name) = required_opt(req.name, "name")? {
            self.name = name;
        }
        if req.description.is_some() {
            self.description = req.description;
        }
        if let Some(config) = req.config {
            self.config = config;
        }
        Ok(())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn list(store: &dyn Store, school_id: &str) -> Result<Vec<Self>> {
        store.list_templates(school_id)
    }

    fn fetch(store: &dyn Store, id: &str) -> Result<Option<Self>> {
        store.get_template(id)
    }

    fn insert(store: &dyn Store, item: &mut Self) -> Result<()> {
        store.create_template(item)
    }

    fn save(store: &dyn Store, item: &Self) -> Result<()> {
        store.update_template(item)
    }

    fn remove(store: &dyn Store, id: &str) -> Result<bool> {
        store.delete_template(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_slug_derived_from_title() {
        let req: CreatePage = serde_json::from_value(serde_json::json!({
            "title": "Fees & Admissions"
        }))
        .unwrap();
        let page = Page::build(req, "school-1", Utc::now()).unwrap();
        assert_eq!(page.slug, "fees-admissions");
        assert!(!page.is_published);
    }

    #[test]
    fn test_blank_required_field_rejected() {
        let req: CreateNotice = serde_json::from_value(serde_json::json!({
            "title": "  ",
            "content": "School closed"
        }))
        .unwrap();
        let err = Notice::build(req, "school-1", Utc::now()).unwrap_err();
        assert_eq!(err.message, "title is required");
    }

    #[test]
    fn test_partial_update_keeps_omitted_fields() {
        let req: CreateStaff = serde_json::from_value(serde_json::json!({
            "name": "A. Rao",
            "designation": "Principal",
            "email": "rao@greenwood.edu"
        }))
        .unwrap();
        let mut staff = Staff::build(req, "school-1", Utc::now()).unwrap();

        let update: UpdateStaff =
            serde_json::from_value(serde_json::json!({ "designation": "Director" })).unwrap();
        staff.apply(update).unwrap();

        assert_eq!(staff.name, "A. Rao");
        assert_eq!(staff.designation, "Director");
        assert_eq!(staff.email.as_deref(), Some("rao@greenwood.edu"));
        assert!(staff.is_visible);
    }

    #[test]
    fn test_school_templates_are_never_premium() {
        let req: CreateTemplate = serde_json::from_value(serde_json::json!({
            "name": "Classic",
            "is_premium": true
        }))
        .unwrap();
        let template = Template::build(req, "school-1", Utc::now()).unwrap();
        assert!(!template.is_premium);
        assert_eq!(template.school_id.as_deref(), Some("school-1"));
    }

    #[test]
    fn test_admission_dates_checked() {
        let req: CreateAdmission = serde_json::from_value(serde_json::json!({
            "session": "2025-26",
            "start_date": "2025-04-01T00:00:00Z",
            "end_date": "2025-03-01T00:00:00Z"
        }))
        .unwrap();
        assert!(Admission::build(req, "school-1", Utc::now()).is_err());
    }
}
