// Bundled film stock reference list
// Seeded into film_stocks with preadded = 1 so user-entered stocks stay
// distinguishable. Reseeding skips any make+model pair already present.

use rusqlite::{params, Connection};
use serde::Deserialize;

use crate::error::Result;

const FILM_STOCKS_JSON: &str = include_str!("../../data/film_stocks.json");

#[derive(Debug, Deserialize)]
struct SeedEntry {
    make: String,
    model: String,
    iso: i64,
    #[serde(rename = "type")]
    film_type: String,
    process: String,
}

/// Insert any bundled film stocks not already present.
/// Returns the count of newly inserted rows.
pub fn seed_film_stocks(conn: &Connection) -> Result<u32> {
    let entries: Vec<SeedEntry> = serde_json::from_str(FILM_STOCKS_JSON)?;

    let mut inserted = 0u32;

    for entry in entries {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM film_stocks WHERE make = ?1 AND model = ?2)",
            params![entry.make, entry.model],
            |row| row.get(0),
        )?;

        if !exists {
            conn.execute(
                "INSERT INTO film_stocks (make, model, iso, type, process, preadded)
                 VALUES (?1, ?2, ?3, ?4, ?5, 1)",
                params![entry.make, entry.model, entry.iso, entry.film_type, entry.process],
            )?;
            inserted += 1;
        }
    }

    if inserted > 0 {
        log::info!("Seeded {} bundled film stocks", inserted);
    }

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::migrations::run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn reseeding_adds_nothing() {
        let conn = open_test_db();
        let count_once: i64 = conn
            .query_row("SELECT COUNT(*) FROM film_stocks", [], |row| row.get(0))
            .unwrap();
        assert!(count_once > 0);

        let added = seed_film_stocks(&conn).unwrap();
        assert_eq!(added, 0);

        let count_twice: i64 = conn
            .query_row("SELECT COUNT(*) FROM film_stocks", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count_once, count_twice);
    }

    #[test]
    fn user_stock_with_same_name_is_not_duplicated() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(&crate::db::catalog::create_schema_sql()).unwrap();

        // User enters a stock that also exists in the bundle, before seeding
        conn.execute(
            "INSERT INTO film_stocks (make, model, iso, preadded) VALUES ('Kodak', 'Portra 400', 400, 0)",
            [],
        )
        .unwrap();

        seed_film_stocks(&conn).unwrap();

        let portras: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM film_stocks WHERE make = 'Kodak' AND model = 'Portra 400'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(portras, 1);
    }
}
