use rusqlite::Row;
use rusqlite::types::Value;

use crate::store::OrderedTable;

/// Maps a type onto one table. `COLUMNS[0]` must be `id`, and `values`
/// must yield one value per column in the same order.
pub(super) trait Record: Sized {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    fn values(&self) -> Vec<Value>;
}

/// A record positioned by the shared ordering index.
pub(super) trait Ordered: Record {
    const INDEX: OrderedTable;

    fn scope_id(&self) -> &str;

    fn set_order(&mut self, order: i64);
}
