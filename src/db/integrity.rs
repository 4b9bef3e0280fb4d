// Structural verification of a database file against the schema catalog.
//
// Runs pragma introspection only, never ALTER or writes, so it is safe to
// point at an untrusted candidate file before adopting it. Every catalog
// expectation that the live file misses becomes one entry in the report;
// verification keeps going after the first mismatch so the log shows the
// full damage.

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::catalog::{self, ColumnDef, TableDef};
use crate::error::Result;

#[derive(Debug, Default)]
pub struct IntegrityReport {
    pub failures: Vec<String>,
}

impl IntegrityReport {
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, message: String) {
        log::warn!("integrity: {}", message);
        self.failures.push(message);
    }
}

/// One row of `PRAGMA table_info`.
struct TableInfoRow {
    name: String,
    declared_type: String,
    not_null: bool,
    pk_ordinal: i64,
}

/// One row of `PRAGMA foreign_key_list`.
struct ForeignKeyRow {
    parent_table: String,
    from_column: String,
    to_column: Option<String>,
    on_delete: String,
}

/// Check every table, column, primary key, autoincrement marker and foreign
/// key the catalog declares. Returns a report listing each mismatch.
pub fn verify_database(conn: &Connection) -> Result<IntegrityReport> {
    let mut report = IntegrityReport::default();
    for table in catalog::TABLES {
        verify_table(conn, table, &mut report)?;
    }
    Ok(report)
}

fn verify_table(conn: &Connection, table: &TableDef, report: &mut IntegrityReport) -> Result<()> {
    let info = table_info(conn, table.name)?;
    if info.is_empty() {
        report.fail(format!("missing table {}", table.name));
        return Ok(());
    }

    // pk_ordinal in table_info is 1-based in declaration order of the
    // primary key, 0 for non-key columns
    let mut expected_pk_ordinal = 0i64;
    for column in table.columns {
        if column.primary_key {
            expected_pk_ordinal += 1;
        }
        verify_column(
            table,
            column,
            if column.primary_key { expected_pk_ordinal } else { 0 },
            &info,
            report,
        );
    }

    let fks = foreign_key_list(conn, table.name)?;
    for column in table.columns {
        verify_foreign_key(table, column, &fks, report);
    }

    if table.has_autoincrement() && !table_sql_has_autoincrement(conn, table.name)? {
        report.fail(format!("table {} is missing AUTOINCREMENT", table.name));
    }

    Ok(())
}

fn verify_column(
    table: &TableDef,
    column: &ColumnDef,
    expected_pk_ordinal: i64,
    info: &[TableInfoRow],
    report: &mut IntegrityReport,
) {
    let row = match info.iter().find(|r| r.name == column.name) {
        Some(row) => row,
        None => {
            report.fail(format!("missing column {}.{}", table.name, column.name));
            return;
        }
    };

    if !column.kind.matches(&row.declared_type) {
        report.fail(format!(
            "column {}.{} has type {:?}, expected {}",
            table.name,
            column.name,
            row.declared_type,
            column.kind.as_sql()
        ));
    }
    if row.not_null != column.not_null {
        report.fail(format!(
            "column {}.{} NOT NULL is {}, expected {}",
            table.name, column.name, row.not_null, column.not_null
        ));
    }
    if row.pk_ordinal != expected_pk_ordinal {
        report.fail(format!(
            "column {}.{} primary-key position is {}, expected {}",
            table.name, column.name, row.pk_ordinal, expected_pk_ordinal
        ));
    }
}

fn verify_foreign_key(
    table: &TableDef,
    column: &ColumnDef,
    fks: &[ForeignKeyRow],
    report: &mut IntegrityReport,
) {
    let expected = match &column.foreign_key {
        Some(fk) => fk,
        None => return,
    };

    let row = match fks.iter().find(|r| r.from_column == column.name) {
        Some(row) => row,
        None => {
            report.fail(format!(
                "missing foreign key on {}.{}",
                table.name, column.name
            ));
            return;
        }
    };

    if row.parent_table != expected.parent_table {
        report.fail(format!(
            "foreign key {}.{} references {}, expected {}",
            table.name, column.name, row.parent_table, expected.parent_table
        ));
    }
    // The catalog renders implicit references to the parent's primary key;
    // an explicit target column means the DDL was not produced by us
    if let Some(to) = &row.to_column {
        report.fail(format!(
            "foreign key {}.{} names target column {:?}, expected implicit",
            table.name, column.name, to
        ));
    }
    if !row.on_delete.eq_ignore_ascii_case(expected.on_delete.as_sql()) {
        report.fail(format!(
            "foreign key {}.{} has ON DELETE {}, expected {}",
            table.name,
            column.name,
            row.on_delete,
            expected.on_delete.as_sql()
        ));
    }
}

fn table_info(conn: &Connection, table: &str) -> Result<Vec<TableInfoRow>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let rows = stmt
        .query_map([], |row| {
            Ok(TableInfoRow {
                name: row.get(1)?,
                declared_type: row.get(2)?,
                not_null: row.get(3)?,
                pk_ordinal: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn foreign_key_list(conn: &Connection, table: &str) -> Result<Vec<ForeignKeyRow>> {
    let mut stmt = conn.prepare(&format!("PRAGMA foreign_key_list({})", table))?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ForeignKeyRow {
                parent_table: row.get(2)?,
                from_column: row.get(3)?,
                to_column: row.get(4)?,
                on_delete: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn table_sql_has_autoincrement(conn: &Connection, table: &str) -> Result<bool> {
    let sql: Option<String> = conn
        .query_row(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )
        .optional()?;
    Ok(sql
        .map(|s| s.to_ascii_uppercase().contains("AUTOINCREMENT"))
        .unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::catalog::create_schema_sql;

    fn open_with_schema(schema: &str) -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(schema).unwrap();
        conn
    }

    #[test]
    fn freshly_created_schema_passes() {
        let conn = open_with_schema(&create_schema_sql());
        let report = verify_database(&conn).unwrap();
        assert!(report.is_valid(), "failures: {:?}", report.failures);
    }

    #[test]
    fn migrated_database_passes() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::migrations::run_migrations(&conn).unwrap();
        let report = verify_database(&conn).unwrap();
        assert!(report.is_valid(), "failures: {:?}", report.failures);
    }

    #[test]
    fn detects_missing_table() {
        let schema = create_schema_sql();
        let conn = open_with_schema(&schema);
        conn.execute_batch("DROP TABLE frame_filters;").unwrap();

        let report = verify_database(&conn).unwrap();
        assert!(report
            .failures
            .iter()
            .any(|f| f.contains("missing table frame_filters")));
    }

    #[test]
    fn detects_missing_not_null() {
        let schema = create_schema_sql().replacen("model TEXT NOT NULL", "model TEXT", 1);
        let conn = open_with_schema(&schema);

        let report = verify_database(&conn).unwrap();
        assert!(!report.is_valid());
        assert!(report.failures.iter().any(|f| f.contains("cameras.model")));
    }

    #[test]
    fn detects_wrong_column_type() {
        let schema = create_schema_sql().replacen("iso INTEGER", "iso TEXT", 1);
        let conn = open_with_schema(&schema);

        let report = verify_database(&conn).unwrap();
        assert!(report
            .failures
            .iter()
            .any(|f| f.contains("film_stocks.iso") && f.contains("expected INTEGER")));
    }

    #[test]
    fn detects_wrong_delete_action() {
        let schema = create_schema_sql().replacen(
            "REFERENCES cameras ON DELETE SET NULL",
            "REFERENCES cameras ON DELETE CASCADE",
            1,
        );
        let conn = open_with_schema(&schema);

        let report = verify_database(&conn).unwrap();
        assert!(report
            .failures
            .iter()
            .any(|f| f.contains("rolls.camera_id") && f.contains("ON DELETE")));
    }

    #[test]
    fn detects_explicit_foreign_key_target() {
        let schema = create_schema_sql().replacen(
            "roll_id INTEGER NOT NULL REFERENCES rolls ON DELETE CASCADE",
            "roll_id INTEGER NOT NULL REFERENCES rolls (id) ON DELETE CASCADE",
            1,
        );
        let conn = open_with_schema(&schema);

        let report = verify_database(&conn).unwrap();
        assert!(report
            .failures
            .iter()
            .any(|f| f.contains("frames.roll_id") && f.contains("implicit")));
    }

    #[test]
    fn detects_missing_column() {
        let schema = create_schema_sql().replacen(",\n    picture_filename TEXT", "", 1);
        let conn = open_with_schema(&schema);

        let report = verify_database(&conn).unwrap();
        assert!(report
            .failures
            .iter()
            .any(|f| f.contains("missing column frames.picture_filename")));
    }
}
