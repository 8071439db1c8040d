use rusqlite::Row;
use rusqlite::types::Value;

use super::record::{Ordered, Record};
use super::{
    SqliteStore, flag, get_enum, get_json, get_opt_time, get_time, int, json, label, opt_int,
    opt_text, opt_time, select_sql, text, time,
};
use crate::error::{Error, Result};
use crate::store::{ContentStore, OrderedTable, ordering};
use crate::types::*;

const BY_ORDER: &str = "sort_order, created_at, id";

macro_rules! ordered {
    ($ty:ty, $index:expr, $scope:ident) => {
        impl Ordered for $ty {
            const INDEX: OrderedTable = $index;

            fn scope_id(&self) -> &str {
                &self.$scope
            }

            fn set_order(&mut self, order: i64) {
                self.order = order;
            }
        }
    };
}

ordered!(Notice, OrderedTable::Notices, school_id);
ordered!(Gallery, OrderedTable::Galleries, school_id);
ordered!(GalleryImage, OrderedTable::GalleryImages, gallery_id);
ordered!(Achievement, OrderedTable::Achievements, school_id);
ordered!(Staff, OrderedTable::Staff, school_id);
ordered!(Page, OrderedTable::Pages, school_id);
ordered!(WebsiteSection, OrderedTable::WebsiteSections, school_id);

impl Record for Notice {
    const TABLE: &'static str = "notices";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "school_id",
        "title",
        "content",
        "category",
        "is_important",
        "publish_date",
        "is_visible",
        "sort_order",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Notice {
            id: row.get(0)?,
            school_id: row.get(1)?,
            title: row.get(2)?,
            content: row.get(3)?,
            category: row.get(4)?,
            is_important: row.get(5)?,
            publish_date: get_opt_time(row, 6)?,
            is_visible: row.get(7)?,
            order: row.get(8)?,
            created_at: get_time(row, 9)?,
            updated_at: get_time(row, 10)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.school_id),
            text(&self.title),
            text(&self.content),
            opt_text(self.category.as_deref()),
            flag(self.is_important),
            opt_time(self.publish_date.as_ref()),
            flag(self.is_visible),
            int(self.order),
            time(&self.created_at),
            time(&self.updated_at),
        ]
    }
}

impl Record for Gallery {
    const TABLE: &'static str = "galleries";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "school_id",
        "title",
        "description",
        "cover_image",
        "is_visible",
        "sort_order",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Gallery {
            id: row.get(0)?,
            school_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            cover_image: row.get(4)?,
            is_visible: row.get(5)?,
            order: row.get(6)?,
            created_at: get_time(row, 7)?,
            updated_at: get_time(row, 8)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.school_id),
            text(&self.title),
            opt_text(self.description.as_deref()),
            opt_text(self.cover_image.as_deref()),
            flag(self.is_visible),
            int(self.order),
            time(&self.created_at),
            time(&self.updated_at),
        ]
    }
}

impl Record for GalleryImage {
    const TABLE: &'static str = "gallery_images";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "school_id",
        "gallery_id",
        "url",
        "caption",
        "sort_order",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(GalleryImage {
            id: row.get(0)?,
            school_id: row.get(1)?,
            gallery_id: row.get(2)?,
            url: row.get(3)?,
            caption: row.get(4)?,
            order: row.get(5)?,
            created_at: get_time(row, 6)?,
            updated_at: get_time(row, 7)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.school_id),
            text(&self.gallery_id),
            text(&self.url),
            opt_text(self.caption.as_deref()),
            int(self.order),
            time(&self.created_at),
            time(&self.updated_at),
        ]
    }
}

impl Record for Achievement {
    const TABLE: &'static str = "achievements";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "school_id",
        "title",
        "description",
        "year",
        "category",
        "image_url",
        "is_visible",
        "sort_order",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Achievement {
            id: row.get(0)?,
            school_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            year: row.get(4)?,
            category: row.get(5)?,
            image_url: row.get(6)?,
            is_visible: row.get(7)?,
            order: row.get(8)?,
            created_at: get_time(row, 9)?,
            updated_at: get_time(row, 10)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.school_id),
            text(&self.title),
            opt_text(self.description.as_deref()),
            opt_int(self.year.map(i64::from)),
            opt_text(self.category.as_deref()),
            opt_text(self.image_url.as_deref()),
            flag(self.is_visible),
            int(self.order),
            time(&self.created_at),
            time(&self.updated_at),
        ]
    }
}

impl Record for Staff {
    const TABLE: &'static str = "staff";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "school_id",
        "name",
        "designation",
        "department",
        "email",
        "phone",
        "photo_url",
        "bio",
        "is_visible",
        "sort_order",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Staff {
            id: row.get(0)?,
            school_id: row.get(1)?,
            name: row.get(2)?,
            designation: row.get(3)?,
            department: row.get(4)?,
            email: row.get(5)?,
            phone: row.get(6)?,
            photo_url: row.get(7)?,
            bio: row.get(8)?,
            is_visible: row.get(9)?,
            order: row.get(10)?,
            created_at: get_time(row, 11)?,
            updated_at: get_time(row, 12)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.school_id),
            text(&self.name),
            text(&self.designation),
            opt_text(self.department.as_deref()),
            opt_text(self.email.as_deref()),
            opt_text(self.phone.as_deref()),
            opt_text(self.photo_url.as_deref()),
            opt_text(self.bio.as_deref()),
            flag(self.is_visible),
            int(self.order),
            time(&self.created_at),
            time(&self.updated_at),
        ]
    }
}

impl Record for Page {
    const TABLE: &'static str = "pages";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "school_id",
        "title",
        "slug",
        "content",
        "meta_title",
        "meta_description",
        "is_published",
        "sort_order",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Page {
            id: row.get(0)?,
            school_id: row.get(1)?,
            title: row.get(2)?,
            slug: row.get(3)?,
            content: row.get(4)?,
            meta_title: row.get(5)?,
            meta_description: row.get(6)?,
            is_published: row.get(7)?,
            order: row.get(8)?,
            created_at: get_time(row, 9)?,
            updated_at: get_time(row, 10)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.school_id),
            text(&self.title),
            text(&self.slug),
            text(&self.content),
            opt_text(self.meta_title.as_deref()),
            opt_text(self.meta_description.as_deref()),
            flag(self.is_published),
            int(self.order),
            time(&self.created_at),
            time(&self.updated_at),
        ]
    }
}

impl Record for WebsiteSection {
    const TABLE: &'static str = "website_sections";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "school_id",
        "section_type",
        "title",
        "content",
        "is_visible",
        "sort_order",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(WebsiteSection {
            id: row.get(0)?,
            school_id: row.get(1)?,
            section_type: row.get(2)?,
            title: row.get(3)?,
            content: get_json(row, 4)?,
            is_visible: row.get(5)?,
            order: row.get(6)?,
            created_at: get_time(row, 7)?,
            updated_at: get_time(row, 8)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.school_id),
            text(&self.section_type),
            opt_text(self.title.as_deref()),
            json(&self.content),
            flag(self.is_visible),
            int(self.order),
            time(&self.created_at),
            time(&self.updated_at),
        ]
    }
}

impl Record for Admission {
    const TABLE: &'static str = "admissions";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "school_id",
        "session",
        "is_open",
        "start_date",
        "end_date",
        "description",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Admission {
            id: row.get(0)?,
            school_id: row.get(1)?,
            session: row.get(2)?,
            is_open: row.get(3)?,
            start_date: get_opt_time(row, 4)?,
            end_date: get_opt_time(row, 5)?,
            description: row.get(6)?,
            created_at: get_time(row, 7)?,
            updated_at: get_time(row, 8)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.school_id),
            text(&self.session),
            flag(self.is_open),
            opt_time(self.start_date.as_ref()),
            opt_time(self.end_date.as_ref()),
            opt_text(self.description.as_deref()),
            time(&self.created_at),
            time(&self.updated_at),
        ]
    }
}

impl Record for AdmissionEnquiry {
    const TABLE: &'static str = "admission_enquiries";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "school_id",
        "admission_id",
        "student_name",
        "parent_name",
        "email",
        "phone",
        "grade",
        "message",
        "status",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(AdmissionEnquiry {
            id: row.get(0)?,
            school_id: row.get(1)?,
            admission_id: row.get(2)?,
            student_name: row.get(3)?,
            parent_name: row.get(4)?,
            email: row.get(5)?,
            phone: row.get(6)?,
            grade: row.get(7)?,
            message: row.get(8)?,
            status: get_enum(row, 9)?,
            created_at: get_time(row, 10)?,
            updated_at: get_time(row, 11)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.school_id),
            opt_text(self.admission_id.as_deref()),
            text(&self.student_name),
            text(&self.parent_name),
            text(&self.email),
            text(&self.phone),
            text(&self.grade),
            opt_text(self.message.as_deref()),
            label(self.status),
            time(&self.created_at),
            time(&self.updated_at),
        ]
    }
}

impl Record for Template {
    const TABLE: &'static str = "templates";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "school_id",
        "name",
        "description",
        "config",
        "is_premium",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Template {
            id: row.get(0)?,
            school_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            config: get_json(row, 4)?,
            is_premium: row.get(5)?,
            created_at: get_time(row, 6)?,
            updated_at: get_time(row, 7)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            opt_text(self.school_id.as_deref()),
            text(&self.name),
            opt_text(self.description.as_deref()),
            json(&self.config),
            flag(self.is_premium),
            time(&self.created_at),
            time(&self.updated_at),
        ]
    }
}

impl ContentStore for SqliteStore {
    // Notices

    fn list_notices(&self, school_id: &str) -> Result<Vec<Notice>> {
        self.list_by("school_id", school_id, BY_ORDER)
    }

    fn get_notice(&self, id: &str) -> Result<Option<Notice>> {
        self.find(id)
    }

    fn create_notice(&self, notice: &mut Notice) -> Result<()> {
        self.insert_ordered(notice)
    }

    fn update_notice(&self, notice: &Notice) -> Result<()> {
        self.save(notice)
    }

    fn delete_notice(&self, id: &str) -> Result<bool> {
        self.remove::<Notice>(id)
    }

    // Galleries

    fn list_galleries(&self, school_id: &str) -> Result<Vec<Gallery>> {
        self.list_by("school_id", school_id, BY_ORDER)
    }

    fn get_gallery(&self, id: &str) -> Result<Option<Gallery>> {
        self.find(id)
    }

    fn create_gallery(&self, gallery: &mut Gallery) -> Result<()> {
        self.insert_ordered(gallery)
    }

    fn update_gallery(&self, gallery: &Gallery) -> Result<()> {
        self.save(gallery)
    }

    fn delete_gallery(&self, id: &str) -> Result<bool> {
        self.remove::<Gallery>(id)
    }

    // Gallery images

    fn list_gallery_images(&self, gallery_id: &str) -> Result<Vec<GalleryImage>> {
        self.list_by("gallery_id", gallery_id, BY_ORDER)
    }

    fn get_gallery_image(&self, id: &str) -> Result<Option<GalleryImage>> {
        self.find(id)
    }

    fn create_gallery_image(&self, image: &mut GalleryImage) -> Result<()> {
        self.insert_ordered(image)
    }

    fn update_gallery_image(&self, image: &GalleryImage) -> Result<()> {
        self.save(image)
    }

    fn delete_gallery_image(&self, id: &str) -> Result<bool> {
        self.remove::<GalleryImage>(id)
    }

    // Achievements

    fn list_achievements(&self, school_id: &str) -> Result<Vec<Achievement>> {
        self.list_by("school_id", school_id, BY_ORDER)
    }

    fn get_achievement(&self, id: &str) -> Result<Option<Achievement>> {
        self.find(id)
    }

    fn create_achievement(&self, achievement: &mut Achievement) -> Result<()> {
        self.insert_ordered(achievement)
    }

    fn update_achievement(&self, achievement: &Achievement) -> Result<()> {
        self.save(achievement)
    }

    fn delete_achievement(&self, id: &str) -> Result<bool> {
        self.remove::<Achievement>(id)
    }

    // Staff

    fn list_staff(&self, school_id: &str) -> Result<Vec<Staff>> {
        self.list_by("school_id", school_id, BY_ORDER)
    }

    fn get_staff(&self, id: &str) -> Result<Option<Staff>> {
        self.find(id)
    }

    fn create_staff(&self, staff: &mut Staff) -> Result<()> {
        self.insert_ordered(staff)
    }

    fn update_staff(&self, staff: &Staff) -> Result<()> {
        self.save(staff)
    }

    fn delete_staff(&self, id: &str) -> Result<bool> {
        self.remove::<Staff>(id)
    }

    // Pages

    fn list_pages(&self, school_id: &str) -> Result<Vec<Page>> {
        self.list_by("school_id", school_id, BY_ORDER)
    }

    fn get_page(&self, id: &str) -> Result<Option<Page>> {
        self.find(id)
    }

    fn get_page_by_slug(&self, school_id: &str, slug: &str) -> Result<Option<Page>> {
        Ok(self
            .list_by::<Page>("school_id", school_id, BY_ORDER)?
            .into_iter()
            .find(|page| page.slug == slug))
    }

    fn create_page(&self, page: &mut Page) -> Result<()> {
        self.insert_ordered(page)
    }

    fn update_page(&self, page: &Page) -> Result<()> {
        self.save(page)
    }

    fn delete_page(&self, id: &str) -> Result<bool> {
        self.remove::<Page>(id)
    }

    // Website sections

    fn list_sections(&self, school_id: &str) -> Result<Vec<WebsiteSection>> {
        self.list_by("school_id", school_id, BY_ORDER)
    }

    fn get_section(&self, id: &str) -> Result<Option<WebsiteSection>> {
        self.find(id)
    }

    fn create_section(&self, section: &mut WebsiteSection) -> Result<()> {
        self.insert_ordered(section)
    }

    fn update_section(&self, section: &WebsiteSection) -> Result<()> {
        self.save(section)
    }

    fn delete_section(&self, id: &str) -> Result<bool> {
        self.remove::<WebsiteSection>(id)
    }

    fn reorder(&self, table: OrderedTable, scope_id: &str, entries: &[OrderEntry]) -> Result<()> {
        ordering::reorder(&mut self.conn(), table, scope_id, entries)
    }

    // Admissions

    fn list_admissions(&self, school_id: &str) -> Result<Vec<Admission>> {
        self.list_by("school_id", school_id, "created_at DESC, id")
    }

    fn get_admission(&self, id: &str) -> Result<Option<Admission>> {
        self.find(id)
    }

    fn create_admission(&self, admission: &Admission) -> Result<()> {
        self.insert(admission)
    }

    fn update_admission(&self, admission: &Admission) -> Result<()> {
        self.save(admission)
    }

    fn delete_admission(&self, id: &str) -> Result<bool> {
        self.remove::<Admission>(id)
    }

    // Enquiries

    fn list_enquiries(&self, school_id: &str) -> Result<Vec<AdmissionEnquiry>> {
        self.list_by("school_id", school_id, "created_at DESC, id")
    }

    fn get_enquiry(&self, id: &str) -> Result<Option<AdmissionEnquiry>> {
        self.find(id)
    }

    fn create_enquiry(&self, enquiry: &AdmissionEnquiry) -> Result<()> {
        self.insert(enquiry)
    }

    fn update_enquiry(&self, enquiry: &AdmissionEnquiry) -> Result<()> {
        self.save(enquiry)
    }

    fn delete_enquiry(&self, id: &str) -> Result<bool> {
        self.remove::<AdmissionEnquiry>(id)
    }

    // Templates

    fn list_templates(&self, school_id: &str) -> Result<Vec<Template>> {
        let sql = format!(
            "{} WHERE school_id = ?1 OR school_id IS NULL
             ORDER BY school_id IS NOT NULL, name, id",
            select_sql::<Template>()
        );
        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([school_id], Template::from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_catalog_templates(&self) -> Result<Vec<Template>> {
        let sql = format!(
            "{} WHERE school_id IS NULL ORDER BY name, id",
            select_sql::<Template>()
        );
        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], Template::from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn get_template(&self, id: &str) -> Result<Option<Template>> {
        self.find(id)
    }

    fn create_template(&self, template: &Template) -> Result<()> {
        self.insert(template)
    }

    fn update_template(&self, template: &Template) -> Result<()> {
        self.save(template)
    }

    fn delete_template(&self, id: &str) -> Result<bool> {
        self.remove::<Template>(id)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::super::test_support::store_with_school;
    use super::*;
    use crate::error::Error;
    use crate::store::TenantStore;

    fn notice(id: &str, school_id: &str) -> Notice {
        let now = Utc::now();
        Notice {
            id: id.to_string(),
            school_id: school_id.to_string(),
            title: format!("Notice {id}"),
            content: "Sports day on Friday".to_string(),
            category: None,
            is_important: false,
            publish_date: None,
            is_visible: true,
            order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn gallery(id: &str) -> Gallery {
        let now = Utc::now();
        Gallery {
            id: id.to_string(),
            school_id: "school-1".to_string(),
            title: "Annual day".to_string(),
            description: None,
            cover_image: None,
            is_visible: true,
            order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn image(id: &str, gallery_id: &str) -> GalleryImage {
        let now = Utc::now();
        GalleryImage {
            id: id.to_string(),
            school_id: "school-1".to_string(),
            gallery_id: gallery_id.to_string(),
            url: format!("https://cdn.example.com/{id}.jpg"),
            caption: None,
            order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_create_assigns_increasing_order() {
        let (_temp, store) = store_with_school();

        for (i, id) in ["n1", "n2", "n3"].iter().enumerate() {
            let mut n = notice(id, "school-1");
            store.create_notice(&mut n).unwrap();
            assert_eq!(n.order, i as i64 + 1);
        }

        let ids: Vec<String> = store
            .list_notices("school-1")
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec!["n1", "n2", "n3"]);
    }

    #[test]
    fn test_order_is_scoped_per_school() {
        let (_temp, store) = store_with_school();
        let other = School::new(
            "school-2".to_string(),
            "Other".to_string(),
            "other".to_string(),
            Utc::now(),
        );
        store.create_school(&other).unwrap();

        let mut a = notice("a", "school-1");
        store.create_notice(&mut a).unwrap();
        let mut b = notice("b", "school-2");
        store.create_notice(&mut b).unwrap();
        assert_eq!(a.order, 1);
        assert_eq!(b.order, 1);
    }

    #[test]
    fn test_reorder_applies_all_entries() {
        let (_temp, store) = store_with_school();
        for id in ["n1", "n2", "n3"] {
            store.create_notice(&mut notice(id, "school-1")).unwrap();
        }

        let entries = vec![
            OrderEntry {
                id: "n3".to_string(),
                order: 1,
            },
            OrderEntry {
                id: "n1".to_string(),
                order: 2,
            },
            OrderEntry {
                id: "n2".to_string(),
                order: 3,
            },
        ];
        store
            .reorder(OrderedTable::Notices, "school-1", &entries)
            .unwrap();

        let ids: Vec<String> = store
            .list_notices("school-1")
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec!["n3", "n1", "n2"]);
    }

    #[test]
    fn test_reorder_unknown_id_rolls_back() {
        let (_temp, store) = store_with_school();
        for id in ["n1", "n2"] {
            store.create_notice(&mut notice(id, "school-1")).unwrap();
        }

        let entries = vec![
            OrderEntry {
                id: "n2".to_string(),
                order: 10,
            },
            OrderEntry {
                id: "missing".to_string(),
                order: 11,
            },
        ];
        let result = store.reorder(OrderedTable::Notices, "school-1", &entries);
        assert!(matches!(result, Err(Error::NotFound)));

        let n2 = store.get_notice("n2").unwrap().unwrap();
        assert_eq!(n2.order, 2);
    }

    #[test]
    fn test_gallery_images_ordered_per_gallery() {
        let (_temp, store) = store_with_school();
        store.create_gallery(&mut gallery("g1")).unwrap();
        store.create_gallery(&mut gallery("g2")).unwrap();

        let mut a = image("a", "g1");
        let mut b = image("b", "g1");
        let mut c = image("c", "g2");
        store.create_gallery_image(&mut a).unwrap();
        store.create_gallery_image(&mut b).unwrap();
        store.create_gallery_image(&mut c).unwrap();
        assert_eq!((a.order, b.order, c.order), (1, 2, 1));

        // An image from another gallery is outside the scope.
        let entries = vec![OrderEntry {
            id: "c".to_string(),
            order: 5,
        }];
        let result = store.reorder(OrderedTable::GalleryImages, "g1", &entries);
        assert!(matches!(result, Err(Error::NotFound)));

        assert!(store.delete_gallery("g1").unwrap());
        assert!(store.list_gallery_images("g1").unwrap().is_empty());
    }

    #[test]
    fn test_page_slug_unique_per_school() {
        let (_temp, store) = store_with_school();
        let now = Utc::now();
        let page = |id: &str| Page {
            id: id.to_string(),
            school_id: "school-1".to_string(),
            title: "About us".to_string(),
            slug: "about".to_string(),
            content: "Founded in 1962".to_string(),
            meta_title: None,
            meta_description: None,
            is_published: true,
            order: 0,
            created_at: now,
            updated_at: now,
        };

        store.create_page(&mut page("p1")).unwrap();
        let result = store.create_page(&mut page("p2"));
        assert!(matches!(result, Err(Error::AlreadyExists)));

        let found = store.get_page_by_slug("school-1", "about").unwrap().unwrap();
        assert_eq!(found.id, "p1");
    }

    #[test]
    fn test_section_json_content() {
        let (_temp, store) = store_with_school();
        let now = Utc::now();
        let mut section = WebsiteSection {
            id: "s1".to_string(),
            school_id: "school-1".to_string(),
            section_type: "hero".to_string(),
            title: Some("Welcome".to_string()),
            content: serde_json::json!({"heading": "Welcome", "cta": {"label": "Apply"}}),
            is_visible: true,
            order: 0,
            created_at: now,
            updated_at: now,
        };
        store.create_section(&mut section).unwrap();

        let fetched = store.get_section("s1").unwrap().unwrap();
        assert_eq!(fetched.content["cta"]["label"], "Apply");
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let (_temp, store) = store_with_school();
        let n = notice("ghost", "school-1");
        assert!(matches!(store.update_notice(&n), Err(Error::NotFound)));
    }

    fn template(id: &str, school_id: Option<&str>, name: &str) -> Template {
        let now = Utc::now();
        Template {
            id: id.to_string(),
            school_id: school_id.map(str::to_string),
            name: name.to_string(),
            description: None,
            config: serde_json::json!({}),
            is_premium: school_id.is_none(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_templates_list_catalog_then_own() {
        let (_temp, store) = store_with_school();
        let other = School::new(
            "school-2".to_string(),
            "Other".to_string(),
            "other".to_string(),
            Utc::now(),
        );
        store.create_school(&other).unwrap();

        store.create_template(&template("own", Some("school-1"), "Alpha")).unwrap();
        store.create_template(&template("catalog", None, "Zenith")).unwrap();
        store.create_template(&template("foreign", Some("school-2"), "Beta")).unwrap();

        let listed: Vec<String> = store
            .list_templates("school-1")
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(listed, ["catalog", "own"]);

        let catalog = store.list_catalog_templates().unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog[0].school_id.is_none());
        assert!(catalog[0].visible_to("school-2"));
    }
}
