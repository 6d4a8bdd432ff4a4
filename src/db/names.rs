//! Shared plumbing for the two single-column name tables (`categories` and
//! `genres`). Both tables have the same shape so the SQL differs only in the
//! table and column identifiers, which come from the constants below and never
//! from user input.

use rusqlite::{params, Connection, OptionalExtension};

use super::connection::UNICASE;
use super::error::{Entity, Error, Result, SqlResultExt};

pub(crate) struct NameTable {
    pub(crate) table: &'static str,
    pub(crate) column: &'static str,
    pub(crate) entity: Entity,
}

pub(crate) const CATEGORIES: NameTable = NameTable {
    table: "categories",
    column: "category",
    entity: Entity::Category,
};

pub(crate) const GENRES: NameTable = NameTable {
    table: "genres",
    column: "genre",
    entity: Entity::Genre,
};

impl NameTable {
    pub(crate) fn fetch_all(&self, conn: &Connection, operation: &'static str) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT {col} FROM {table} ORDER BY {col} COLLATE {UNICASE}, {col}",
            col = self.column,
            table = self.table
        );
        let mut stmt = conn.prepare(&sql).sql_context(operation)?;
        let names = stmt
            .query_map([], |row| row.get(0))
            .sql_context(operation)?
            .collect::<rusqlite::Result<Vec<String>>>()
            .sql_context(operation)?;
        Ok(names)
    }

    pub(crate) fn insert(&self, conn: &Connection, name: &str, operation: &'static str) -> Result<()> {
        let sql = format!("INSERT INTO {} ({}) VALUES (?1)", self.table, self.column);
        conn.execute(&sql, params![name]).sql_context(operation)?;
        Ok(())
    }

    pub(crate) fn lookup_id(&self, conn: &Connection, name: &str, operation: &'static str) -> Result<i64> {
        let sql = format!("SELECT id FROM {} WHERE {} = ?1", self.table, self.column);
        conn.query_row(&sql, params![name], |row| row.get(0))
            .optional()
            .sql_context(operation)?
            .ok_or_else(|| Error::not_found(self.entity, name))
    }

    pub(crate) fn rename(
        &self,
        conn: &Connection,
        old: &str,
        new: &str,
        operation: &'static str,
    ) -> Result<()> {
        let sql = format!(
            "UPDATE {table} SET {col} = ?1 WHERE {col} = ?2",
            table = self.table,
            col = self.column
        );
        let updated = conn.execute(&sql, params![new, old]).sql_context(operation)?;
        if updated == 0 {
            Err(Error::not_found(self.entity, old))
        } else {
            Ok(())
        }
    }

    /// Delete every listed name inside one transaction. Names that do not
    /// exist are skipped; the return value counts rows actually removed.
    pub(crate) fn delete_many<S: AsRef<str>>(
        &self,
        conn: &mut Connection,
        names: &[S],
        operation: &'static str,
    ) -> Result<usize> {
        let sql = format!("DELETE FROM {} WHERE {} = ?1", self.table, self.column);
        let tx = conn.transaction().sql_context(operation)?;
        let mut deleted = 0;
        {
            let mut stmt = tx.prepare(&sql).sql_context(operation)?;
            for name in names {
                deleted += stmt.execute(params![name.as_ref()]).sql_context(operation)?;
            }
        }
        tx.commit().sql_context(operation)?;
        Ok(deleted)
    }
}
