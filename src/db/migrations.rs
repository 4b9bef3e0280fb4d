// Database migrations
// Migrations are forward-only. Never edit or delete a migration after it ships.
//
// Each entry moves the schema one version forward; the stored version lives
// in PRAGMA user_version. Additive steps run as plain statement batches.
// Incompatible rewrites (rename aside, create new, copy rows, drop old) run
// as one transaction so a failed group leaves the prior version intact.
// Fresh databases skip the history entirely and are created from the catalog.

use anyhow::Result;
use rusqlite::Connection;

use super::catalog;
use super::seed;

/// Current schema version.
pub const DB_VERSION: u32 = 21;

enum Migration {
    /// Backward-compatible statements (new nullable/defaulted columns, new tables).
    Batch(&'static str),
    /// Table rewrite; must be atomic as a group.
    Rewrite(&'static str),
}

/// Transition steps in order. Entry at index i brings version i+1 to i+2.
const MIGRATIONS: &[Migration] = &[
    // v1 -> v2: per-frame focal length
    Migration::Batch("ALTER TABLE frames ADD COLUMN focal_length INTEGER;"),
    // v2 -> v3: exposure compensation as a free-form stop string
    Migration::Batch("ALTER TABLE frames ADD COLUMN exposure_comp TEXT;"),
    // v3 -> v4: serial numbers on gear
    Migration::Batch(
        "ALTER TABLE cameras ADD COLUMN serial_number TEXT;
         ALTER TABLE lenses ADD COLUMN serial_number TEXT;",
    ),
    // v4 -> v5: camera shutter increment class
    Migration::Batch(
        "ALTER TABLE cameras ADD COLUMN shutter_increments TEXT NOT NULL DEFAULT 'third';",
    ),
    // v5 -> v6: lens aperture increment class
    Migration::Batch(
        "ALTER TABLE lenses ADD COLUMN aperture_increments TEXT NOT NULL DEFAULT 'third';",
    ),
    // v6 -> v7: filters and the lens<->filter link table
    Migration::Batch(
        "CREATE TABLE filters (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            make TEXT NOT NULL,
            model TEXT NOT NULL
        );
        CREATE TABLE lens_filters (
            lens_id INTEGER NOT NULL REFERENCES lenses ON DELETE CASCADE,
            filter_id INTEGER NOT NULL REFERENCES filters ON DELETE CASCADE,
            PRIMARY KEY (lens_id, filter_id)
        );",
    ),
    // v7 -> v8: multi-exposure and flash fields
    Migration::Batch(
        "ALTER TABLE frames ADD COLUMN no_of_exposures INTEGER NOT NULL DEFAULT 1;
         ALTER TABLE frames ADD COLUMN flash_used INTEGER NOT NULL DEFAULT 0;
         ALTER TABLE frames ADD COLUMN flash_power TEXT;
         ALTER TABLE frames ADD COLUMN flash_comp TEXT;",
    ),
    // v8 -> v9: metering mode and light source
    Migration::Batch(
        "ALTER TABLE frames ADD COLUMN metering_mode TEXT;
         ALTER TABLE frames ADD COLUMN light_source TEXT;",
    ),
    // v9 -> v10: roll ISO, push/pull and format
    Migration::Batch(
        "ALTER TABLE rolls ADD COLUMN iso INTEGER;
         ALTER TABLE rolls ADD COLUMN push TEXT;
         ALTER TABLE rolls ADD COLUMN format TEXT;",
    ),
    // v10 -> v11: frame location coordinates
    Migration::Batch("ALTER TABLE frames ADD COLUMN location TEXT;"),
    // v11 -> v12: reverse-geocoded address alongside the coordinates
    Migration::Batch("ALTER TABLE frames ADD COLUMN formatted_address TEXT;"),
    // v12 -> v13: frame<->filter link table
    Migration::Batch(
        "CREATE TABLE frame_filters (
            frame_id INTEGER NOT NULL REFERENCES frames ON DELETE CASCADE,
            filter_id INTEGER NOT NULL REFERENCES filters ON DELETE CASCADE,
            PRIMARY KEY (frame_id, filter_id)
        );",
    ),
    // v13 -> v14: film stocks and the roll reference to them
    Migration::Batch(
        "CREATE TABLE film_stocks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            make TEXT NOT NULL,
            model TEXT NOT NULL,
            iso INTEGER NOT NULL DEFAULT 0,
            type TEXT,
            process TEXT
        );
        ALTER TABLE rolls ADD COLUMN film_stock_id INTEGER REFERENCES film_stocks ON DELETE SET NULL;",
    ),
    // v14 -> v15: rolls rewrite. The original rolls table carried no delete
    // action on camera_id; the new one clears camera references when the
    // camera goes away, and picks up unload/developed dates and the archived
    // flag. Unresolvable camera/film-stock ids are copied as NULL.
    Migration::Rewrite(
        "ALTER TABLE rolls RENAME TO rolls_old;
        CREATE TABLE rolls (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            date TEXT,
            unloaded TEXT,
            developed TEXT,
            note TEXT,
            iso INTEGER,
            push TEXT,
            format TEXT,
            archived INTEGER NOT NULL DEFAULT 0,
            camera_id INTEGER REFERENCES cameras ON DELETE SET NULL,
            film_stock_id INTEGER REFERENCES film_stocks ON DELETE SET NULL
        );
        INSERT INTO rolls (id, name, date, note, iso, push, format, camera_id, film_stock_id)
        SELECT id, name, date, note, iso, push, format,
               CASE WHEN camera_id IN (SELECT id FROM cameras) THEN camera_id END,
               CASE WHEN film_stock_id IN (SELECT id FROM film_stocks) THEN film_stock_id END
        FROM rolls_old;
        DROP TABLE rolls_old;",
    ),
    // v15 -> v16: camera exposure compensation increment class
    Migration::Batch(
        "ALTER TABLE cameras ADD COLUMN exposure_comp_increments TEXT NOT NULL DEFAULT 'third';",
    ),
    // v16 -> v17: lens focal length range
    Migration::Batch(
        "ALTER TABLE lenses ADD COLUMN min_focal_length INTEGER NOT NULL DEFAULT 0;
         ALTER TABLE lenses ADD COLUMN max_focal_length INTEGER NOT NULL DEFAULT 0;",
    ),
    // v17 -> v18: frames rewrite. Attaches the delete actions (roll delete
    // cascades, lens delete clears the reference). Unresolvable lens ids are
    // copied as NULL; rows are never dropped.
    Migration::Rewrite(
        "ALTER TABLE frames RENAME TO frames_old;
        CREATE TABLE frames (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            roll_id INTEGER NOT NULL REFERENCES rolls ON DELETE CASCADE,
            count INTEGER NOT NULL,
            date TEXT,
            lens_id INTEGER REFERENCES lenses ON DELETE SET NULL,
            shutter TEXT,
            aperture TEXT,
            note TEXT,
            focal_length INTEGER,
            exposure_comp TEXT,
            no_of_exposures INTEGER NOT NULL DEFAULT 1,
            flash_used INTEGER NOT NULL DEFAULT 0,
            flash_power TEXT,
            flash_comp TEXT,
            metering_mode TEXT,
            light_source TEXT,
            location TEXT,
            formatted_address TEXT
        );
        INSERT INTO frames (id, roll_id, count, date, lens_id, shutter, aperture, note,
                            focal_length, exposure_comp, no_of_exposures, flash_used,
                            flash_power, flash_comp, metering_mode, light_source,
                            location, formatted_address)
        SELECT id, roll_id, count, date,
               CASE WHEN lens_id IN (SELECT id FROM lenses) THEN lens_id END,
               shutter, aperture, note, focal_length, exposure_comp, no_of_exposures,
               flash_used, flash_power, flash_comp, metering_mode, light_source,
               location, formatted_address
        FROM frames_old;
        DROP TABLE frames_old;",
    ),
    // v18 -> v19: complementary digital picture per frame
    Migration::Batch("ALTER TABLE frames ADD COLUMN picture_filename TEXT;"),
    // v19 -> v20: distinguish bundled film stocks from user-entered ones
    Migration::Batch("ALTER TABLE film_stocks ADD COLUMN preadded INTEGER NOT NULL DEFAULT 0;"),
    // v20 -> v21: indexes for common queries
    Migration::Batch(
        "CREATE INDEX idx_frames_roll ON frames(roll_id);
         CREATE INDEX idx_frames_lens ON frames(lens_id);
         CREATE INDEX idx_rolls_camera ON rolls(camera_id);
         CREATE INDEX idx_rolls_film_stock ON rolls(film_stock_id);",
    ),
];

/// Get current schema version from database
pub fn get_schema_version(conn: &Connection) -> Result<u32> {
    let version: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    Ok(version)
}

fn set_schema_version(conn: &Connection, version: u32) -> Result<()> {
    conn.execute_batch(&format!("PRAGMA user_version = {}", version))?;
    Ok(())
}

/// Run all pending migrations (crash-safe)
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    // Refuse to open a DB created by a newer Filmlog build
    if current_version > DB_VERSION {
        anyhow::bail!(
            "Database schema version {} is newer than this build supports (max {}). Please upgrade Filmlog.",
            current_version,
            DB_VERSION
        );
    }

    if current_version == DB_VERSION {
        return Ok(());
    }

    // First-ever creation: build the current schema directly and seed the
    // bundled film stocks instead of replaying two dozen revisions.
    if current_version == 0 {
        conn.execute_batch(&catalog::create_schema_sql())?;
        set_schema_version(conn, DB_VERSION)?;
        let seeded = seed::seed_film_stocks(conn)?;
        log::info!(
            "Created schema version {} ({} bundled film stocks seeded)",
            DB_VERSION,
            seeded
        );
        return Ok(());
    }

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let target_version = (i + 2) as u32;
        if target_version <= current_version {
            continue;
        }

        match migration {
            Migration::Batch(sql) => apply_step(conn, sql, target_version)?,
            Migration::Rewrite(sql) => run_rewrite(conn, sql, target_version)?,
        }

        log::info!("Applied migration to schema version {}", target_version);
    }

    // The reference list may have grown since the file was created; existing
    // make+model pairs are skipped.
    seed::seed_film_stocks(conn)?;

    Ok(())
}

/// Execute one transition and its version stamp as a single transaction,
/// so a crash between the two can never leave a migrated schema marked as
/// the old version and replay the step on the next open.
fn apply_step(conn: &Connection, sql: &str, target_version: u32) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(sql)?;
    tx.execute_batch(&format!("PRAGMA user_version = {}", target_version))?;
    tx.commit()?;
    Ok(())
}

/// Execute a rewrite group atomically. Foreign-key enforcement goes off for
/// the duration (the old table is renamed aside and dropped), and legacy
/// rename semantics keep child tables pointing at the table name rather than
/// following the rename.
fn run_rewrite(conn: &Connection, sql: &str, target_version: u32) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = OFF; PRAGMA legacy_alter_table = ON;")?;

    let result = apply_step(conn, sql, target_version);

    conn.execute_batch("PRAGMA legacy_alter_table = OFF; PRAGMA foreign_keys = ON;")?;

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::integrity;

    /// Schema as shipped at version 14, for upgrade tests. Built by hand
    /// from the transition history: rolls and frames still carry their
    /// pre-rewrite foreign keys without delete actions.
    const V14_SCHEMA: &str = "
        PRAGMA foreign_keys = OFF;
        CREATE TABLE cameras (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            make TEXT NOT NULL,
            model TEXT NOT NULL,
            min_shutter TEXT,
            max_shutter TEXT,
            serial_number TEXT,
            shutter_increments TEXT NOT NULL DEFAULT 'third'
        );
        CREATE TABLE lenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            make TEXT NOT NULL,
            model TEXT NOT NULL,
            min_aperture TEXT,
            max_aperture TEXT,
            serial_number TEXT,
            aperture_increments TEXT NOT NULL DEFAULT 'third'
        );
        CREATE TABLE filters (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            make TEXT NOT NULL,
            model TEXT NOT NULL
        );
        CREATE TABLE film_stocks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            make TEXT NOT NULL,
            model TEXT NOT NULL,
            iso INTEGER NOT NULL DEFAULT 0,
            type TEXT,
            process TEXT
        );
        CREATE TABLE rolls (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            date TEXT,
            note TEXT,
            camera_id INTEGER REFERENCES cameras,
            iso INTEGER,
            push TEXT,
            format TEXT,
            film_stock_id INTEGER REFERENCES film_stocks ON DELETE SET NULL
        );
        CREATE TABLE frames (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            roll_id INTEGER NOT NULL REFERENCES rolls,
            count INTEGER NOT NULL,
            date TEXT,
            lens_id INTEGER REFERENCES lenses,
            shutter TEXT,
            aperture TEXT,
            note TEXT,
            focal_length INTEGER,
            exposure_comp TEXT,
            no_of_exposures INTEGER NOT NULL DEFAULT 1,
            flash_used INTEGER NOT NULL DEFAULT 0,
            flash_power TEXT,
            flash_comp TEXT,
            metering_mode TEXT,
            light_source TEXT,
            location TEXT,
            formatted_address TEXT
        );
        CREATE TABLE camera_lenses (
            camera_id INTEGER NOT NULL REFERENCES cameras ON DELETE CASCADE,
            lens_id INTEGER NOT NULL REFERENCES lenses ON DELETE CASCADE,
            PRIMARY KEY (camera_id, lens_id)
        );
        CREATE TABLE lens_filters (
            lens_id INTEGER NOT NULL REFERENCES lenses ON DELETE CASCADE,
            filter_id INTEGER NOT NULL REFERENCES filters ON DELETE CASCADE,
            PRIMARY KEY (lens_id, filter_id)
        );
        CREATE TABLE frame_filters (
            frame_id INTEGER NOT NULL REFERENCES frames ON DELETE CASCADE,
            filter_id INTEGER NOT NULL REFERENCES filters ON DELETE CASCADE,
            PRIMARY KEY (frame_id, filter_id)
        );
        PRAGMA user_version = 14;
    ";

    fn open_v14_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(V14_SCHEMA).unwrap();
        conn
    }

    #[test]
    fn fresh_init_creates_current_schema() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), DB_VERSION);

        let table_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(table_count, catalog::TABLES.len() as i64);

        // Bundled stocks were seeded
        let stocks: i64 = conn
            .query_row("SELECT COUNT(*) FROM film_stocks WHERE preadded = 1", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert!(stocks > 0, "fresh DB should carry bundled film stocks");

        let report = integrity::verify_database(&conn).unwrap();
        assert!(report.is_valid(), "fresh schema must pass integrity: {:?}", report.failures);
    }

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let stocks_before: i64 = conn
            .query_row("SELECT COUNT(*) FROM film_stocks", [], |row| row.get(0))
            .unwrap();

        // Run twice -- should be a no-op
        run_migrations(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), DB_VERSION);
        let stocks_after: i64 = conn
            .query_row("SELECT COUNT(*) FROM film_stocks", [], |row| row.get(0))
            .unwrap();
        assert_eq!(stocks_before, stocks_after);
    }

    #[test]
    fn newer_schema_version_is_refused() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(&format!("PRAGMA user_version = {}", DB_VERSION + 1))
            .unwrap();
        assert!(run_migrations(&conn).is_err());
    }

    #[test]
    fn upgrade_from_v14_reaches_current_and_verifies() {
        let conn = open_v14_db();
        conn.execute_batch(
            "INSERT INTO cameras (id, make, model) VALUES (1, 'Nikon', 'F3');
             INSERT INTO lenses (id, make, model) VALUES (1, 'Nikon', 'Nikkor 50mm f/1.8');
             INSERT INTO rolls (id, name, date, camera_id) VALUES (1, 'Trip', '2019-05-01', 1);
             INSERT INTO frames (id, roll_id, count, lens_id, shutter, aperture)
                 VALUES (1, 1, 1, 1, '1/250', '8');",
        )
        .unwrap();

        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), DB_VERSION);

        // Data survived both rewrites
        let (roll_name, camera_id): (String, i64) = conn
            .query_row("SELECT name, camera_id FROM rolls WHERE id = 1", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(roll_name, "Trip");
        assert_eq!(camera_id, 1);

        let shutter: String = conn
            .query_row("SELECT shutter FROM frames WHERE id = 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(shutter, "1/250");

        let report = integrity::verify_database(&conn).unwrap();
        assert!(report.is_valid(), "migrated schema must pass integrity: {:?}", report.failures);
    }

    #[test]
    fn rewrites_null_out_unresolvable_references() {
        let conn = open_v14_db();
        // camera 99 and lens 42 do not exist; the fixture turns FK
        // enforcement off so the dangling values go in as-is
        conn.execute_batch(
            "INSERT INTO cameras (id, make, model) VALUES (1, 'Nikon', 'F3');
             INSERT INTO rolls (id, name, camera_id) VALUES (1, 'Kept', 1);
             INSERT INTO rolls (id, name, camera_id) VALUES (2, 'Orphan', 99);
             INSERT INTO frames (id, roll_id, count, lens_id) VALUES (1, 1, 1, 42);",
        )
        .unwrap();

        run_migrations(&conn).unwrap();

        // Orphaned references were nulled, never dropped
        let roll_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM rolls", [], |row| row.get(0))
            .unwrap();
        assert_eq!(roll_count, 2);

        let orphan_camera: Option<i64> = conn
            .query_row("SELECT camera_id FROM rolls WHERE id = 2", [], |row| row.get(0))
            .unwrap();
        assert_eq!(orphan_camera, None);

        let kept_camera: Option<i64> = conn
            .query_row("SELECT camera_id FROM rolls WHERE id = 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(kept_camera, Some(1));

        let orphan_lens: Option<i64> = conn
            .query_row("SELECT lens_id FROM frames WHERE id = 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(orphan_lens, None);
    }

    #[test]
    fn failed_rewrite_leaves_prior_version_and_data() {
        let conn = open_v14_db();
        // Dropping film_stocks makes the rolls rewrite fail at its copy
        // step, after the rename and create already ran
        conn.execute_batch(
            "INSERT INTO rolls (id, name) VALUES (1, 'Kept');
             DROP TABLE film_stocks;",
        )
        .unwrap();

        assert!(run_migrations(&conn).is_err());

        // The whole group rolled back together with its version stamp
        assert_eq!(get_schema_version(&conn).unwrap(), 14);
        let name: String = conn
            .query_row("SELECT name FROM rolls WHERE id = 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(name, "Kept");
    }
}
