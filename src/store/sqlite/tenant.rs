use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use super::record::Record;
use super::{
    SqliteStore, flag, format_datetime, get_enum, get_opt_time, get_time, insert_with, label,
    opt_text, opt_time, select_sql, text, time, unique_violation,
};
use crate::error::{Error, Result};
use crate::store::TenantStore;
use crate::store::schema::COUNTED_TABLES;
use crate::types::*;

pub(super) const UPSERT_FLAG_SQL: &str = "INSERT INTO feature_flags (school_id, feature, is_enabled, updated_at)
     VALUES (?1, ?2, ?3, ?4)
     ON CONFLICT(school_id, feature) DO UPDATE SET
         is_enabled = excluded.is_enabled,
         updated_at = excluded.updated_at";

impl Record for School {
    const TABLE: &'static str = "schools";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "subdomain",
        "custom_domain",
        "domain_verified",
        "verification_token",
        "plan",
        "subscription_ends",
        "status",
        "tagline",
        "logo_url",
        "email",
        "phone",
        "address",
        "theme_color",
        "seo_title",
        "seo_description",
        "seo_keywords",
        "active_template_id",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(School {
            id: row.get(0)?,
            name: row.get(1)?,
            subdomain: row.get(2)?,
            custom_domain: row.get(3)?,
            domain_verified: row.get(4)?,
            verification_token: row.get(5)?,
            plan: get_enum(row, 6)?,
            subscription_ends: get_opt_time(row, 7)?,
            status: get_enum(row, 8)?,
            tagline: row.get(9)?,
            logo_url: row.get(10)?,
            email: row.get(11)?,
            phone: row.get(12)?,
            address: row.get(13)?,
            theme_color: row.get(14)?,
            seo_title: row.get(15)?,
            seo_description: row.get(16)?,
            seo_keywords: row.get(17)?,
            active_template_id: row.get(18)?,
            created_at: get_time(row, 19)?,
            updated_at: get_time(row, 20)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.name),
            text(&self.subdomain),
            opt_text(self.custom_domain.as_deref()),
            flag(self.domain_verified),
            opt_text(self.verification_token.as_deref()),
            label(self.plan),
            opt_time(self.subscription_ends.as_ref()),
            label(self.status),
            opt_text(self.tagline.as_deref()),
            opt_text(self.logo_url.as_deref()),
            opt_text(self.email.as_deref()),
            opt_text(self.phone.as_deref()),
            opt_text(self.address.as_deref()),
            opt_text(self.theme_color.as_deref()),
            opt_text(self.seo_title.as_deref()),
            opt_text(self.seo_description.as_deref()),
            opt_text(self.seo_keywords.as_deref()),
            opt_text(self.active_template_id.as_deref()),
            time(&self.created_at),
            time(&self.updated_at),
        ]
    }
}

fn read_school(conn: &Connection, id: &str) -> Result<School> {
    let sql = format!("{} WHERE id = ?1", select_sql::<School>());
    conn.query_row(&sql, [id], School::from_row)
        .optional()?
        .ok_or(Error::NotFound)
}

fn school_assignments(update: &SchoolUpdate) -> Vec<(&'static str, Value)> {
    let texts = [
        ("name", &update.name),
        ("tagline", &update.tagline),
        ("logo_url", &update.logo_url),
        ("email", &update.email),
        ("phone", &update.phone),
        ("address", &update.address),
        ("theme_color", &update.theme_color),
        ("seo_title", &update.seo_title),
        ("seo_description", &update.seo_description),
        ("seo_keywords", &update.seo_keywords),
        ("active_template_id", &update.active_template_id),
    ];
    let mut sets: Vec<(&'static str, Value)> = texts
        .into_iter()
        .filter_map(|(column, value)| value.as_deref().map(|v| (column, text(v))))
        .collect();

    match &update.domain {
        Some(DomainChange::Attach { domain, token }) => {
            sets.push(("custom_domain", text(domain)));
            sets.push(("verification_token", text(token)));
            sets.push(("domain_verified", flag(false)));
        }
        Some(DomainChange::Detach) => {
            sets.push(("custom_domain", Value::Null));
            sets.push(("verification_token", Value::Null));
            sets.push(("domain_verified", flag(false)));
        }
        None => {}
    }
    if let Some(plan) = update.plan {
        sets.push(("plan", label(plan)));
    }
    if let Some(status) = update.status {
        sets.push(("status", label(status)));
    }
    if let Some(ends) = &update.subscription_ends {
        sets.push(("subscription_ends", time(ends)));
    }
    sets
}

impl Record for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "email",
        "password_hash",
        "name",
        "role",
        "school_id",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            password_hash: row.get(2)?,
            name: row.get(3)?,
            role: get_enum(row, 4)?,
            school_id: row.get(5)?,
            created_at: get_time(row, 6)?,
            updated_at: get_time(row, 7)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.email),
            text(&self.password_hash),
            text(&self.name),
            label(self.role),
            opt_text(self.school_id.as_deref()),
            time(&self.created_at),
            time(&self.updated_at),
        ]
    }
}

impl Record for Token {
    const TABLE: &'static str = "tokens";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "token_hash",
        "token_lookup",
        "user_id",
        "created_at",
        "expires_at",
        "last_used_at",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Token {
            id: row.get(0)?,
            token_hash: row.get(1)?,
            token_lookup: row.get(2)?,
            user_id: row.get(3)?,
            created_at: get_time(row, 4)?,
            expires_at: get_opt_time(row, 5)?,
            last_used_at: get_opt_time(row, 6)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.id),
            text(&self.token_hash),
            text(&self.token_lookup),
            text(&self.user_id),
            time(&self.created_at),
            opt_time(self.expires_at.as_ref()),
            opt_time(self.last_used_at.as_ref()),
        ]
    }
}

pub(super) fn upsert_flag(conn: &Connection, flag: &FeatureFlag) -> Result<()> {
    conn.execute(
        UPSERT_FLAG_SQL,
        params![
            flag.school_id,
            flag.feature.as_str(),
            flag.is_enabled,
            format_datetime(&flag.updated_at),
        ],
    )?;
    Ok(())
}

impl TenantStore for SqliteStore {
    // School operations

    fn create_school(&self, school: &School) -> Result<()> {
        self.insert(school)
    }

    fn get_school(&self, id: &str) -> Result<Option<School>> {
        self.find(id)
    }

    fn get_school_by_subdomain(&self, subdomain: &str) -> Result<Option<School>> {
        self.find_by("subdomain", subdomain)
    }

    fn get_school_by_custom_domain(&self, domain: &str) -> Result<Option<School>> {
        self.find_by("custom_domain", domain)
    }

    fn list_schools(&self, cursor: &str, limit: i32) -> Result<Vec<School>> {
        let sql = format!(
            "SELECT {} FROM schools WHERE id > ?1 ORDER BY id LIMIT ?2",
            School::COLUMNS.join(", ")
        );
        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![cursor, limit], School::from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_school(&self, id: &str, update: &SchoolUpdate) -> Result<School> {
        let mut sets = school_assignments(update);
        sets.push(("updated_at", text(&format_datetime(&Utc::now()))));

        let clause: Vec<String> = sets
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("{column} = ?{}", i + 1))
            .collect();
        let sql = format!(
            "UPDATE schools SET {} WHERE id = ?{}",
            clause.join(", "),
            sets.len() + 1
        );
        let mut values: Vec<Value> = sets.into_iter().map(|(_, value)| value).collect();
        values.push(text(id));

        let conn = self.conn();
        let rows = conn
            .execute(&sql, params_from_iter(values))
            .map_err(unique_violation)?;
        if rows == 0 {
            return Err(Error::NotFound);
        }
        read_school(&conn, id)
    }

    fn publish_school(&self, id: &str) -> Result<School> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "UPDATE schools SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
            params![
                SchoolStatus::Published.as_str(),
                format_datetime(&Utc::now()),
                id,
                SchoolStatus::Draft.as_str(),
            ],
        )?;
        let school = read_school(&tx, id)?;
        if school.status == SchoolStatus::Suspended {
            return Err(Error::Conflict(
                "Suspended schools cannot be published".to_string(),
            ));
        }

        tx.commit()?;
        Ok(school)
    }

    fn verify_custom_domain(&self, id: &str, token: &str) -> Result<School> {
        let conn = self.conn();
        let rows = conn.execute(
            "UPDATE schools SET domain_verified = 1, updated_at = ?1
             WHERE id = ?2 AND custom_domain IS NOT NULL AND verification_token = ?3",
            params![format_datetime(&Utc::now()), id, token],
        )?;
        let school = read_school(&conn, id)?;
        if rows == 0 {
            return Err(Error::Conflict(
                "the custom domain changed during verification".to_string(),
            ));
        }
        Ok(school)
    }

    // User operations

    fn create_user(&self, user: &User) -> Result<()> {
        self.insert(user)
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.find(id)
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_by("email", email)
    }

    fn list_school_users(&self, school_id: &str) -> Result<Vec<User>> {
        self.list_by("school_id", school_id, "created_at, id")
    }

    fn update_user(&self, user: &User) -> Result<()> {
        self.save(user)
    }

    fn delete_user(&self, id: &str) -> Result<bool> {
        self.remove::<User>(id)
    }

    fn has_platform_admin(&self) -> Result<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM users WHERE role = ?1",
            params![UserRole::SuperAdmin.as_str()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // Token operations

    fn create_token(&self, token: &Token) -> Result<()> {
        match insert_with(&self.conn(), token) {
            Err(Error::AlreadyExists) => Err(Error::TokenLookupCollision),
            other => other,
        }
    }

    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>> {
        self.find_by("token_lookup", lookup)
    }

    fn delete_token(&self, id: &str) -> Result<bool> {
        self.remove::<Token>(id)
    }

    fn update_token_last_used(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE tokens SET last_used_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    // Feature flag overrides

    fn list_feature_flags(&self, school_id: &str) -> Result<Vec<FeatureFlag>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT school_id, feature, is_enabled, updated_at
             FROM feature_flags WHERE school_id = ?1 ORDER BY feature",
        )?;
        let rows = stmt.query_map(params![school_id], |row| {
            Ok(FeatureFlag {
                school_id: row.get(0)?,
                feature: get_enum(row, 1)?,
                is_enabled: row.get(2)?,
                updated_at: get_time(row, 3)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn upsert_feature_flag(&self, flag: &FeatureFlag) -> Result<()> {
        upsert_flag(&self.conn(), flag)
    }

    fn delete_feature_flag(&self, school_id: &str, feature: Feature) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM feature_flags WHERE school_id = ?1 AND feature = ?2",
            params![school_id, feature.as_str()],
        )?;
        Ok(rows > 0)
    }

    fn table_counts(&self) -> Result<Vec<(String, i64)>> {
        let conn = self.conn();
        COUNTED_TABLES
            .iter()
            .map(|table| {
                let count: i64 =
                    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                        row.get(0)
                    })?;
                Ok(((*table).to_string(), count))
            })
            .collect()
    }
}
