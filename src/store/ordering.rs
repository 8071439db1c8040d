//! Display ordering shared by every ordered content table.
//!
//! New rows get `MAX(sort_order) + 1` within their scope, computed under the
//! same connection lock as the insert. Bulk reorders run in one transaction.

use rusqlite::{Connection, params};

use crate::error::{Error, Result};
use crate::types::OrderEntry;

/// A content table carrying a `sort_order` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderedTable {
    Notices,
    Galleries,
    GalleryImages,
    Achievements,
    Staff,
    Pages,
    WebsiteSections,
}

impl OrderedTable {
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            OrderedTable::Notices => "notices",
            OrderedTable::Galleries => "galleries",
            OrderedTable::GalleryImages => "gallery_images",
            OrderedTable::Achievements => "achievements",
            OrderedTable::Staff => "staff",
            OrderedTable::Pages => "pages",
            OrderedTable::WebsiteSections => "website_sections",
        }
    }

    /// Column that partitions the ordering. Images are ordered per gallery,
    /// everything else per school.
    #[must_use]
    pub const fn scope_column(self) -> &'static str {
        match self {
            OrderedTable::GalleryImages => "gallery_id",
            _ => "school_id",
        }
    }
}

pub(super) fn next_order(conn: &Connection, table: OrderedTable, scope_id: &str) -> Result<i64> {
    let sql = format!(
        "SELECT COALESCE(MAX(sort_order), 0) + 1 FROM {} WHERE {} = ?1",
        table.table(),
        table.scope_column()
    );
    let next = conn.query_row(&sql, params![scope_id], |row| row.get(0))?;
    Ok(next)
}

pub(super) fn reorder(
    conn: &mut Connection,
    table: OrderedTable,
    scope_id: &str,
    entries: &[OrderEntry],
) -> Result<()> {
    let sql = format!(
        "UPDATE {} SET sort_order = ?1, updated_at = datetime('now') WHERE id = ?2 AND {} = ?3",
        table.table(),
        table.scope_column()
    );

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(&sql)?;
        for entry in entries {
            let rows = stmt.execute(params![entry.order, entry.id, scope_id])?;
            if rows == 0 {
                // Dropping the transaction rolls back the earlier updates.
                return Err(Error::NotFound);
            }
        }
    }
    tx.commit()?;
    Ok(())
}
