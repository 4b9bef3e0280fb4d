// Typed CRUD operations per entity and link table.
//
// Queries return owned, fully materialized records; no cursor state leaks
// across calls. Row<->record mapping is explicit per entity. Deleting a roll
// cascades to its frames and their filter links through the schema's
// foreign-key actions, not application code.

use std::collections::HashMap;

use rusqlite::{params, Connection, OptionalExtension};

use crate::constants::{APERTURE_VALUES, SHUTTER_VALUES};
use crate::error::Result;
use crate::models::{
    Camera, Filter, FilmProcess, FilmStock, FilmType, Frame, IncrementClass, Lens, LightSource,
    Location, MeteringMode, Roll, RollFormat,
};

// ----- Listing options -----

/// Which rolls to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RollFilter {
    #[default]
    Active,
    Archived,
    All,
}

/// Roll list ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RollSort {
    /// Load date, newest first.
    #[default]
    Date,
    Name,
    /// Camera make and model, rolls without a camera last.
    Camera,
}

/// Frame list ordering within a roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameSort {
    #[default]
    Count,
    Date,
    /// Position in the reference aperture scale, not numeric order.
    Aperture,
    /// Position in the reference shutter scale, not numeric order.
    Shutter,
    /// Lens make and model, frames without a lens last.
    Lens,
}

// ----- Camera -----

fn map_camera(row: &rusqlite::Row) -> rusqlite::Result<Camera> {
    Ok(Camera {
        id: row.get(0)?,
        make: row.get(1)?,
        model: row.get(2)?,
        min_shutter: row.get(3)?,
        max_shutter: row.get(4)?,
        serial_number: row.get(5)?,
        shutter_increments: IncrementClass::from_db(&row.get::<_, String>(6)?),
        exposure_comp_increments: IncrementClass::from_db(&row.get::<_, String>(7)?),
    })
}

const CAMERA_COLUMNS: &str = "id, make, model, min_shutter, max_shutter, serial_number,
    shutter_increments, exposure_comp_increments";

pub fn insert_camera(conn: &Connection, camera: &Camera) -> Result<i64> {
    conn.execute(
        "INSERT INTO cameras (make, model, min_shutter, max_shutter, serial_number,
                              shutter_increments, exposure_comp_increments)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            camera.make,
            camera.model,
            camera.min_shutter,
            camera.max_shutter,
            camera.serial_number,
            camera.shutter_increments.as_db(),
            camera.exposure_comp_increments.as_db(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_camera(conn: &Connection, id: i64) -> Result<Option<Camera>> {
    let result = conn
        .query_row(
            &format!("SELECT {} FROM cameras WHERE id = ?1", CAMERA_COLUMNS),
            params![id],
            map_camera,
        )
        .optional()?;
    Ok(result)
}

pub fn list_cameras(conn: &Connection) -> Result<Vec<Camera>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM cameras ORDER BY make COLLATE NOCASE, model COLLATE NOCASE",
        CAMERA_COLUMNS
    ))?;
    let cameras = stmt
        .query_map([], map_camera)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(cameras)
}

pub fn update_camera(conn: &Connection, camera: &Camera) -> Result<()> {
    conn.execute(
        "UPDATE cameras SET make = ?1, model = ?2, min_shutter = ?3, max_shutter = ?4,
                serial_number = ?5, shutter_increments = ?6, exposure_comp_increments = ?7
         WHERE id = ?8",
        params![
            camera.make,
            camera.model,
            camera.min_shutter,
            camera.max_shutter,
            camera.serial_number,
            camera.shutter_increments.as_db(),
            camera.exposure_comp_increments.as_db(),
            camera.id,
        ],
    )?;
    Ok(())
}

pub fn delete_camera(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM cameras WHERE id = ?1", params![id])?;
    Ok(())
}

/// True iff at least one roll references this camera. Callers are expected
/// to check this before delete; the gateway itself does not refuse.
pub fn camera_in_use(conn: &Connection, id: i64) -> Result<bool> {
    let in_use: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM rolls WHERE camera_id = ?1)",
        params![id],
        |row| row.get(0),
    )?;
    Ok(in_use)
}

// ----- Lens -----

fn map_lens(row: &rusqlite::Row) -> rusqlite::Result<Lens> {
    Ok(Lens {
        id: row.get(0)?,
        make: row.get(1)?,
        model: row.get(2)?,
        min_aperture: row.get(3)?,
        max_aperture: row.get(4)?,
        serial_number: row.get(5)?,
        aperture_increments: IncrementClass::from_db(&row.get::<_, String>(6)?),
        min_focal_length: row.get(7)?,
        max_focal_length: row.get(8)?,
    })
}

const LENS_COLUMNS: &str = "id, make, model, min_aperture, max_aperture, serial_number,
    aperture_increments, min_focal_length, max_focal_length";

pub fn insert_lens(conn: &Connection, lens: &Lens) -> Result<i64> {
    conn.execute(
        "INSERT INTO lenses (make, model, min_aperture, max_aperture, serial_number,
                             aperture_increments, min_focal_length, max_focal_length)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            lens.make,
            lens.model,
            lens.min_aperture,
            lens.max_aperture,
            lens.serial_number,
            lens.aperture_increments.as_db(),
            lens.min_focal_length,
            lens.max_focal_length,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_lens(conn: &Connection, id: i64) -> Result<Option<Lens>> {
    let result = conn
        .query_row(
            &format!("SELECT {} FROM lenses WHERE id = ?1", LENS_COLUMNS),
            params![id],
            map_lens,
        )
        .optional()?;
    Ok(result)
}

pub fn list_lenses(conn: &Connection) -> Result<Vec<Lens>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM lenses ORDER BY make COLLATE NOCASE, model COLLATE NOCASE",
        LENS_COLUMNS
    ))?;
    let lenses = stmt
        .query_map([], map_lens)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(lenses)
}

pub fn update_lens(conn: &Connection, lens: &Lens) -> Result<()> {
    conn.execute(
        "UPDATE lenses SET make = ?1, model = ?2, min_aperture = ?3, max_aperture = ?4,
                serial_number = ?5, aperture_increments = ?6,
                min_focal_length = ?7, max_focal_length = ?8
         WHERE id = ?9",
        params![
            lens.make,
            lens.model,
            lens.min_aperture,
            lens.max_aperture,
            lens.serial_number,
            lens.aperture_increments.as_db(),
            lens.min_focal_length,
            lens.max_focal_length,
            lens.id,
        ],
    )?;
    Ok(())
}

pub fn delete_lens(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM lenses WHERE id = ?1", params![id])?;
    Ok(())
}

/// True iff at least one frame references this lens.
pub fn lens_in_use(conn: &Connection, id: i64) -> Result<bool> {
    let in_use: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM frames WHERE lens_id = ?1)",
        params![id],
        |row| row.get(0),
    )?;
    Ok(in_use)
}

// ----- Filter -----

fn map_filter(row: &rusqlite::Row) -> rusqlite::Result<Filter> {
    Ok(Filter {
        id: row.get(0)?,
        make: row.get(1)?,
        model: row.get(2)?,
    })
}

pub fn insert_filter(conn: &Connection, filter: &Filter) -> Result<i64> {
    conn.execute(
        "INSERT INTO filters (make, model) VALUES (?1, ?2)",
        params![filter.make, filter.model],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_filter(conn: &Connection, id: i64) -> Result<Option<Filter>> {
    let result = conn
        .query_row(
            "SELECT id, make, model FROM filters WHERE id = ?1",
            params![id],
            map_filter,
        )
        .optional()?;
    Ok(result)
}

pub fn list_filters(conn: &Connection) -> Result<Vec<Filter>> {
    let mut stmt = conn.prepare(
        "SELECT id, make, model FROM filters ORDER BY make COLLATE NOCASE, model COLLATE NOCASE",
    )?;
    let filters = stmt
        .query_map([], map_filter)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(filters)
}

pub fn update_filter(conn: &Connection, filter: &Filter) -> Result<()> {
    conn.execute(
        "UPDATE filters SET make = ?1, model = ?2 WHERE id = ?3",
        params![filter.make, filter.model, filter.id],
    )?;
    Ok(())
}

pub fn delete_filter(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM filters WHERE id = ?1", params![id])?;
    Ok(())
}

/// True iff at least one frame-filter link references this filter.
pub fn filter_in_use(conn: &Connection, id: i64) -> Result<bool> {
    let in_use: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM frame_filters WHERE filter_id = ?1)",
        params![id],
        |row| row.get(0),
    )?;
    Ok(in_use)
}

// ----- Film stock -----

fn map_film_stock(row: &rusqlite::Row) -> rusqlite::Result<FilmStock> {
    Ok(FilmStock {
        id: row.get(0)?,
        make: row.get(1)?,
        model: row.get(2)?,
        iso: row.get(3)?,
        film_type: FilmType::from_db(&row.get::<_, Option<String>>(4)?.unwrap_or_default()),
        process: FilmProcess::from_db(&row.get::<_, Option<String>>(5)?.unwrap_or_default()),
        preadded: row.get(6)?,
    })
}

const FILM_STOCK_COLUMNS: &str = "id, make, model, iso, type, process, preadded";

pub fn insert_film_stock(conn: &Connection, stock: &FilmStock) -> Result<i64> {
    conn.execute(
        "INSERT INTO film_stocks (make, model, iso, type, process, preadded)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            stock.make,
            stock.model,
            stock.iso,
            stock.film_type.as_db(),
            stock.process.as_db(),
            stock.preadded,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_film_stock(conn: &Connection, id: i64) -> Result<Option<FilmStock>> {
    let result = conn
        .query_row(
            &format!("SELECT {} FROM film_stocks WHERE id = ?1", FILM_STOCK_COLUMNS),
            params![id],
            map_film_stock,
        )
        .optional()?;
    Ok(result)
}

pub fn list_film_stocks(conn: &Connection) -> Result<Vec<FilmStock>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM film_stocks ORDER BY make COLLATE NOCASE, model COLLATE NOCASE",
        FILM_STOCK_COLUMNS
    ))?;
    let stocks = stmt
        .query_map([], map_film_stock)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(stocks)
}

pub fn update_film_stock(conn: &Connection, stock: &FilmStock) -> Result<()> {
    conn.execute(
        "UPDATE film_stocks SET make = ?1, model = ?2, iso = ?3, type = ?4,
                process = ?5, preadded = ?6
         WHERE id = ?7",
        params![
            stock.make,
            stock.model,
            stock.iso,
            stock.film_type.as_db(),
            stock.process.as_db(),
            stock.preadded,
            stock.id,
        ],
    )?;
    Ok(())
}

pub fn delete_film_stock(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM film_stocks WHERE id = ?1", params![id])?;
    Ok(())
}

/// True iff at least one roll references this film stock.
pub fn film_stock_in_use(conn: &Connection, id: i64) -> Result<bool> {
    let in_use: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM rolls WHERE film_stock_id = ?1)",
        params![id],
        |row| row.get(0),
    )?;
    Ok(in_use)
}

// ----- Roll -----

fn map_roll(row: &rusqlite::Row) -> rusqlite::Result<Roll> {
    Ok(Roll {
        id: row.get(0)?,
        name: row.get(1)?,
        date: row.get(2)?,
        unloaded: row.get(3)?,
        developed: row.get(4)?,
        note: row.get(5)?,
        iso: row.get(6)?,
        push_pull: row.get(7)?,
        format: RollFormat::from_db(&row.get::<_, Option<String>>(8)?.unwrap_or_default()),
        archived: row.get(9)?,
        camera_id: row.get(10)?,
        film_stock_id: row.get(11)?,
    })
}

const ROLL_COLUMNS: &str = "r.id, r.name, r.date, r.unloaded, r.developed, r.note, r.iso,
    r.push, r.format, r.archived, r.camera_id, r.film_stock_id";

pub fn insert_roll(conn: &Connection, roll: &Roll) -> Result<i64> {
    conn.execute(
        "INSERT INTO rolls (name, date, unloaded, developed, note, iso, push, format,
                            archived, camera_id, film_stock_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            roll.name,
            roll.date,
            roll.unloaded,
            roll.developed,
            roll.note,
            roll.iso,
            roll.push_pull,
            roll.format.as_db(),
            roll.archived,
            roll.camera_id,
            roll.film_stock_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_roll(conn: &Connection, id: i64) -> Result<Option<Roll>> {
    let result = conn
        .query_row(
            &format!("SELECT {} FROM rolls r WHERE r.id = ?1", ROLL_COLUMNS),
            params![id],
            map_roll,
        )
        .optional()?;
    Ok(result)
}

pub fn list_rolls(conn: &Connection, filter: RollFilter, sort: RollSort) -> Result<Vec<Roll>> {
    let where_clause = match filter {
        RollFilter::Active => "WHERE r.archived = 0",
        RollFilter::Archived => "WHERE r.archived = 1",
        RollFilter::All => "",
    };
    // Rolls without a camera sort last under camera ordering
    let order_clause = match sort {
        RollSort::Date => "ORDER BY r.date DESC",
        RollSort::Name => "ORDER BY r.name COLLATE NOCASE",
        RollSort::Camera => {
            "ORDER BY c.id IS NULL, c.make COLLATE NOCASE, c.model COLLATE NOCASE"
        }
    };

    let sql = format!(
        "SELECT {} FROM rolls r LEFT JOIN cameras c ON r.camera_id = c.id {} {}",
        ROLL_COLUMNS, where_clause, order_clause
    );

    let mut stmt = conn.prepare(&sql)?;
    let rolls = stmt
        .query_map([], map_roll)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rolls)
}

pub fn update_roll(conn: &Connection, roll: &Roll) -> Result<()> {
    conn.execute(
        "UPDATE rolls SET name = ?1, date = ?2, unloaded = ?3, developed = ?4, note = ?5,
                iso = ?6, push = ?7, format = ?8, archived = ?9, camera_id = ?10,
                film_stock_id = ?11
         WHERE id = ?12",
        params![
            roll.name,
            roll.date,
            roll.unloaded,
            roll.developed,
            roll.note,
            roll.iso,
            roll.push_pull,
            roll.format.as_db(),
            roll.archived,
            roll.camera_id,
            roll.film_stock_id,
            roll.id,
        ],
    )?;
    Ok(())
}

/// Deleting a roll removes its frames and their filter links via the
/// schema's CASCADE actions.
pub fn delete_roll(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM rolls WHERE id = ?1", params![id])?;
    Ok(())
}

// ----- Frame -----

fn map_frame(row: &rusqlite::Row) -> rusqlite::Result<Frame> {
    let coordinates: Option<String> = row.get(16)?;
    let formatted_address: Option<String> = row.get(17)?;
    let location = coordinates.and_then(|c| Location::from_db(&c, formatted_address));

    Ok(Frame {
        id: row.get(0)?,
        roll_id: row.get(1)?,
        count: row.get(2)?,
        date: row.get(3)?,
        lens_id: row.get(4)?,
        shutter: row.get(5)?,
        aperture: row.get(6)?,
        note: row.get(7)?,
        focal_length: row.get(8)?,
        exposure_comp: row.get(9)?,
        no_of_exposures: row.get(10)?,
        flash_used: row.get(11)?,
        flash_power: row.get(12)?,
        flash_comp: row.get(13)?,
        metering_mode: MeteringMode::from_db(&row.get::<_, Option<String>>(14)?.unwrap_or_default()),
        light_source: LightSource::from_db(&row.get::<_, Option<String>>(15)?.unwrap_or_default()),
        location,
        picture_filename: row.get(18)?,
        filter_ids: Vec::new(),
    })
}

const FRAME_COLUMNS: &str = "id, roll_id, count, date, lens_id, shutter, aperture, note,
    focal_length, exposure_comp, no_of_exposures, flash_used, flash_power, flash_comp,
    metering_mode, light_source, location, formatted_address, picture_filename";

fn frame_filter_ids(conn: &Connection, frame_id: i64) -> Result<Vec<i64>> {
    let mut stmt = conn
        .prepare("SELECT filter_id FROM frame_filters WHERE frame_id = ?1 ORDER BY filter_id")?;
    let ids = stmt
        .query_map(params![frame_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<i64>, _>>()?;
    Ok(ids)
}

pub fn insert_frame(conn: &Connection, frame: &Frame) -> Result<i64> {
    conn.execute(
        "INSERT INTO frames (roll_id, count, date, lens_id, shutter, aperture, note,
                             focal_length, exposure_comp, no_of_exposures, flash_used,
                             flash_power, flash_comp, metering_mode, light_source,
                             location, formatted_address, picture_filename)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        params![
            frame.roll_id,
            frame.count,
            frame.date,
            frame.lens_id,
            frame.shutter,
            frame.aperture,
            frame.note,
            frame.focal_length,
            frame.exposure_comp,
            frame.no_of_exposures,
            frame.flash_used,
            frame.flash_power,
            frame.flash_comp,
            frame.metering_mode.as_db(),
            frame.light_source.as_db(),
            frame.location.as_ref().map(|l| l.to_db()),
            frame.location.as_ref().and_then(|l| l.formatted_address.clone()),
            frame.picture_filename,
        ],
    )?;
    let id = conn.last_insert_rowid();

    for filter_id in &frame.filter_ids {
        link_frame_filter(conn, id, *filter_id)?;
    }

    Ok(id)
}

pub fn get_frame(conn: &Connection, id: i64) -> Result<Option<Frame>> {
    let result = conn
        .query_row(
            &format!("SELECT {} FROM frames WHERE id = ?1", FRAME_COLUMNS),
            params![id],
            map_frame,
        )
        .optional()?;

    match result {
        Some(mut frame) => {
            frame.filter_ids = frame_filter_ids(conn, frame.id)?;
            Ok(Some(frame))
        }
        None => Ok(None),
    }
}

/// List the frames of one roll. The default order is frame count ascending;
/// the other modes re-sort the materialized rows, with count as tie-break.
pub fn list_frames(conn: &Connection, roll_id: i64, sort: FrameSort) -> Result<Vec<Frame>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM frames WHERE roll_id = ?1 ORDER BY count ASC",
        FRAME_COLUMNS
    ))?;
    let mut frames = stmt
        .query_map(params![roll_id], map_frame)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    for frame in &mut frames {
        frame.filter_ids = frame_filter_ids(conn, frame.id)?;
    }

    match sort {
        FrameSort::Count => {}
        FrameSort::Date => {
            // ISO-8601 strings order chronologically; undated frames last
            frames.sort_by(|a, b| match (&a.date, &b.date) {
                (Some(da), Some(db)) => da.cmp(db).then(a.count.cmp(&b.count)),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => a.count.cmp(&b.count),
            });
        }
        FrameSort::Aperture => {
            frames.sort_by_key(|f| {
                (
                    scale_position(APERTURE_VALUES, f.aperture.as_deref()),
                    f.count,
                )
            });
        }
        FrameSort::Shutter => {
            frames.sort_by_key(|f| {
                (
                    scale_position(SHUTTER_VALUES, f.shutter.as_deref()),
                    f.count,
                )
            });
        }
        FrameSort::Lens => {
            let names = lens_names(conn)?;
            frames.sort_by(|a, b| {
                let name_a = a.lens_id.and_then(|id| names.get(&id));
                let name_b = b.lens_id.and_then(|id| names.get(&id));
                match (name_a, name_b) {
                    (Some(na), Some(nb)) => na
                        .to_lowercase()
                        .cmp(&nb.to_lowercase())
                        .then(a.count.cmp(&b.count)),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => a.count.cmp(&b.count),
                }
            });
        }
    }

    Ok(frames)
}

/// Position of a value in a reference scale; values off the scale sort last.
fn scale_position(scale: &[&str], value: Option<&str>) -> usize {
    value
        .and_then(|v| scale.iter().position(|s| *s == v))
        .unwrap_or(usize::MAX)
}

fn lens_names(conn: &Connection) -> Result<HashMap<i64, String>> {
    let mut stmt = conn.prepare("SELECT id, make, model FROM lenses")?;
    let mut names = HashMap::new();
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;
    for row in rows {
        let (id, make, model) = row?;
        names.insert(id, format!("{} {}", make, model));
    }
    Ok(names)
}

/// Full replace by id; the frame's filter links are rewritten to match the
/// record's filter set.
pub fn update_frame(conn: &Connection, frame: &Frame) -> Result<()> {
    conn.execute(
        "UPDATE frames SET roll_id = ?1, count = ?2, date = ?3, lens_id = ?4, shutter = ?5,
                aperture = ?6, note = ?7, focal_length = ?8, exposure_comp = ?9,
                no_of_exposures = ?10, flash_used = ?11, flash_power = ?12, flash_comp = ?13,
                metering_mode = ?14, light_source = ?15, location = ?16,
                formatted_address = ?17, picture_filename = ?18
         WHERE id = ?19",
        params![
            frame.roll_id,
            frame.count,
            frame.date,
            frame.lens_id,
            frame.shutter,
            frame.aperture,
            frame.note,
            frame.focal_length,
            frame.exposure_comp,
            frame.no_of_exposures,
            frame.flash_used,
            frame.flash_power,
            frame.flash_comp,
            frame.metering_mode.as_db(),
            frame.light_source.as_db(),
            frame.location.as_ref().map(|l| l.to_db()),
            frame.location.as_ref().and_then(|l| l.formatted_address.clone()),
            frame.picture_filename,
            frame.id,
        ],
    )?;

    conn.execute(
        "DELETE FROM frame_filters WHERE frame_id = ?1",
        params![frame.id],
    )?;
    for filter_id in &frame.filter_ids {
        link_frame_filter(conn, frame.id, *filter_id)?;
    }

    Ok(())
}

pub fn delete_frame(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM frames WHERE id = ?1", params![id])?;
    Ok(())
}

// ----- Camera <-> Lens links -----

pub fn link_camera_lens(conn: &Connection, camera_id: i64, lens_id: i64) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO camera_lenses (camera_id, lens_id) VALUES (?1, ?2)",
        params![camera_id, lens_id],
    )?;
    Ok(())
}

pub fn unlink_camera_lens(conn: &Connection, camera_id: i64, lens_id: i64) -> Result<()> {
    conn.execute(
        "DELETE FROM camera_lenses WHERE camera_id = ?1 AND lens_id = ?2",
        params![camera_id, lens_id],
    )?;
    Ok(())
}

pub fn lenses_for_camera(conn: &Connection, camera_id: i64) -> Result<Vec<Lens>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM lenses
         WHERE id IN (SELECT lens_id FROM camera_lenses WHERE camera_id = ?1)
         ORDER BY make COLLATE NOCASE, model COLLATE NOCASE",
        LENS_COLUMNS
    ))?;
    let lenses = stmt
        .query_map(params![camera_id], map_lens)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(lenses)
}

pub fn cameras_for_lens(conn: &Connection, lens_id: i64) -> Result<Vec<Camera>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM cameras
         WHERE id IN (SELECT camera_id FROM camera_lenses WHERE lens_id = ?1)
         ORDER BY make COLLATE NOCASE, model COLLATE NOCASE",
        CAMERA_COLUMNS
    ))?;
    let cameras = stmt
        .query_map(params![lens_id], map_camera)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(cameras)
}

// ----- Lens <-> Filter links -----

pub fn link_lens_filter(conn: &Connection, lens_id: i64, filter_id: i64) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO lens_filters (lens_id, filter_id) VALUES (?1, ?2)",
        params![lens_id, filter_id],
    )?;
    Ok(())
}

pub fn unlink_lens_filter(conn: &Connection, lens_id: i64, filter_id: i64) -> Result<()> {
    conn.execute(
        "DELETE FROM lens_filters WHERE lens_id = ?1 AND filter_id = ?2",
        params![lens_id, filter_id],
    )?;
    Ok(())
}

pub fn filters_for_lens(conn: &Connection, lens_id: i64) -> Result<Vec<Filter>> {
    let mut stmt = conn.prepare(
        "SELECT id, make, model FROM filters
         WHERE id IN (SELECT filter_id FROM lens_filters WHERE lens_id = ?1)
         ORDER BY make COLLATE NOCASE, model COLLATE NOCASE",
    )?;
    let filters = stmt
        .query_map(params![lens_id], map_filter)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(filters)
}

pub fn lenses_for_filter(conn: &Connection, filter_id: i64) -> Result<Vec<Lens>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM lenses
         WHERE id IN (SELECT lens_id FROM lens_filters WHERE filter_id = ?1)
         ORDER BY make COLLATE NOCASE, model COLLATE NOCASE",
        LENS_COLUMNS
    ))?;
    let lenses = stmt
        .query_map(params![filter_id], map_lens)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(lenses)
}

// ----- Frame <-> Filter links -----

pub fn link_frame_filter(conn: &Connection, frame_id: i64, filter_id: i64) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO frame_filters (frame_id, filter_id) VALUES (?1, ?2)",
        params![frame_id, filter_id],
    )?;
    Ok(())
}

pub fn unlink_frame_filter(conn: &Connection, frame_id: i64, filter_id: i64) -> Result<()> {
    conn.execute(
        "DELETE FROM frame_filters WHERE frame_id = ?1 AND filter_id = ?2",
        params![frame_id, filter_id],
    )?;
    Ok(())
}

pub fn filters_for_frame(conn: &Connection, frame_id: i64) -> Result<Vec<Filter>> {
    let mut stmt = conn.prepare(
        "SELECT id, make, model FROM filters
         WHERE id IN (SELECT filter_id FROM frame_filters WHERE frame_id = ?1)
         ORDER BY make COLLATE NOCASE, model COLLATE NOCASE",
    )?;
    let filters = stmt
        .query_map(params![frame_id], map_filter)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(filters)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        crate::db::migrations::run_migrations(&conn).unwrap();
        conn
    }

    fn sample_camera() -> Camera {
        Camera {
            id: 0,
            make: "Nikon".to_string(),
            model: "F3".to_string(),
            serial_number: Some("1840159".to_string()),
            min_shutter: Some("8".to_string()),
            max_shutter: Some("1/2000".to_string()),
            shutter_increments: IncrementClass::Full,
            exposure_comp_increments: IncrementClass::Third,
        }
    }

    fn sample_lens(conn: &Connection) -> i64 {
        insert_lens(
            conn,
            &Lens {
                id: 0,
                make: "Nikon".to_string(),
                model: "Nikkor 50mm f/1.8".to_string(),
                serial_number: None,
                min_aperture: Some("22".to_string()),
                max_aperture: Some("1.8".to_string()),
                min_focal_length: 50,
                max_focal_length: 50,
                aperture_increments: IncrementClass::Third,
            },
        )
        .unwrap()
    }

    #[test]
    fn camera_round_trip() {
        let conn = open_test_db();
        let mut camera = sample_camera();
        let id = insert_camera(&conn, &camera).unwrap();
        camera.id = id;

        let loaded = get_camera(&conn, id).unwrap().unwrap();
        assert_eq!(loaded, camera);
    }

    #[test]
    fn frame_round_trip_with_filters_and_location() {
        let conn = open_test_db();
        let roll_id = insert_roll(&conn, &Roll::default()).unwrap();
        let lens_id = sample_lens(&conn);
        let filter_a = insert_filter(
            &conn,
            &Filter { id: 0, make: "Hoya".to_string(), model: "ND8".to_string() },
        )
        .unwrap();
        let filter_b = insert_filter(
            &conn,
            &Filter { id: 0, make: "B+W".to_string(), model: "KR3".to_string() },
        )
        .unwrap();

        let mut frame = Frame {
            id: 0,
            roll_id,
            count: 7,
            date: Some("2023-09-14 16:12".to_string()),
            lens_id: Some(lens_id),
            shutter: Some("1/250".to_string()),
            aperture: Some("5.6".to_string()),
            note: Some("harbour".to_string()),
            location: Some(Location {
                latitude: 60.1699,
                longitude: 24.9384,
                formatted_address: Some("Helsinki".to_string()),
            }),
            focal_length: Some(50),
            exposure_comp: Some("+2/3".to_string()),
            no_of_exposures: 1,
            flash_used: true,
            flash_power: Some("1/4".to_string()),
            flash_comp: Some("-1".to_string()),
            metering_mode: MeteringMode::Spot,
            light_source: LightSource::Sunset,
            picture_filename: Some("roll7_frame7.jpg".to_string()),
            filter_ids: vec![filter_a, filter_b],
        };

        let id = insert_frame(&conn, &frame).unwrap();
        frame.id = id;
        frame.filter_ids.sort();

        let loaded = get_frame(&conn, id).unwrap().unwrap();
        assert_eq!(loaded, frame);
    }

    #[test]
    fn update_frame_rewrites_filter_links() {
        let conn = open_test_db();
        let roll_id = insert_roll(&conn, &Roll::default()).unwrap();
        let filter_a = insert_filter(
            &conn,
            &Filter { id: 0, make: "Hoya".to_string(), model: "ND8".to_string() },
        )
        .unwrap();
        let filter_b = insert_filter(
            &conn,
            &Filter { id: 0, make: "B+W".to_string(), model: "KR3".to_string() },
        )
        .unwrap();

        let mut frame = Frame {
            roll_id,
            count: 1,
            no_of_exposures: 1,
            filter_ids: vec![filter_a],
            ..Frame::default()
        };
        frame.id = insert_frame(&conn, &frame).unwrap();

        frame.filter_ids = vec![filter_b];
        update_frame(&conn, &frame).unwrap();

        let loaded = get_frame(&conn, frame.id).unwrap().unwrap();
        assert_eq!(loaded.filter_ids, vec![filter_b]);
    }

    #[test]
    fn deleting_roll_cascades_to_frames_and_links() {
        let conn = open_test_db();
        let roll_id = insert_roll(&conn, &Roll::default()).unwrap();
        let filter_id = insert_filter(
            &conn,
            &Filter { id: 0, make: "Hoya".to_string(), model: "ND8".to_string() },
        )
        .unwrap();

        for count in 1..=3 {
            insert_frame(
                &conn,
                &Frame {
                    roll_id,
                    count,
                    no_of_exposures: 1,
                    filter_ids: vec![filter_id],
                    ..Frame::default()
                },
            )
            .unwrap();
        }

        delete_roll(&conn, roll_id).unwrap();

        let frames: i64 = conn
            .query_row("SELECT COUNT(*) FROM frames", [], |row| row.get(0))
            .unwrap();
        let links: i64 = conn
            .query_row("SELECT COUNT(*) FROM frame_filters", [], |row| row.get(0))
            .unwrap();
        assert_eq!(frames, 0);
        assert_eq!(links, 0);
        // The filter itself survives
        assert!(get_filter(&conn, filter_id).unwrap().is_some());
    }

    #[test]
    fn deleting_lens_clears_frame_reference() {
        let conn = open_test_db();
        let roll_id = insert_roll(&conn, &Roll::default()).unwrap();
        let lens_id = sample_lens(&conn);
        let frame_id = insert_frame(
            &conn,
            &Frame {
                roll_id,
                count: 1,
                lens_id: Some(lens_id),
                no_of_exposures: 1,
                ..Frame::default()
            },
        )
        .unwrap();

        delete_lens(&conn, lens_id).unwrap();

        let frame = get_frame(&conn, frame_id).unwrap().unwrap();
        assert_eq!(frame.lens_id, None);
    }

    #[test]
    fn links_are_idempotent() {
        let conn = open_test_db();
        let camera_id = insert_camera(&conn, &sample_camera()).unwrap();
        let lens_id = sample_lens(&conn);

        link_camera_lens(&conn, camera_id, lens_id).unwrap();
        link_camera_lens(&conn, camera_id, lens_id).unwrap();

        let links: i64 = conn
            .query_row("SELECT COUNT(*) FROM camera_lenses", [], |row| row.get(0))
            .unwrap();
        assert_eq!(links, 1);
        assert_eq!(lenses_for_camera(&conn, camera_id).unwrap().len(), 1);

        unlink_camera_lens(&conn, camera_id, lens_id).unwrap();
        assert!(lenses_for_camera(&conn, camera_id).unwrap().is_empty());
    }

    #[test]
    fn usage_guard_follows_references() {
        let conn = open_test_db();
        let camera_id = insert_camera(&conn, &sample_camera()).unwrap();
        let roll_id = insert_roll(
            &conn,
            &Roll { camera_id: Some(camera_id), ..Roll::default() },
        )
        .unwrap();

        assert!(camera_in_use(&conn, camera_id).unwrap());

        delete_roll(&conn, roll_id).unwrap();
        assert!(!camera_in_use(&conn, camera_id).unwrap());
    }

    #[test]
    fn roll_listing_filters_and_sorts() {
        let conn = open_test_db();
        insert_roll(
            &conn,
            &Roll {
                name: Some("beta".to_string()),
                date: Some("2023-01-01".to_string()),
                ..Roll::default()
            },
        )
        .unwrap();
        insert_roll(
            &conn,
            &Roll {
                name: Some("Alpha".to_string()),
                date: Some("2024-01-01".to_string()),
                ..Roll::default()
            },
        )
        .unwrap();
        insert_roll(
            &conn,
            &Roll {
                name: Some("old".to_string()),
                date: Some("2020-01-01".to_string()),
                archived: true,
                ..Roll::default()
            },
        )
        .unwrap();

        let active = list_rolls(&conn, RollFilter::Active, RollSort::Date).unwrap();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].name.as_deref(), Some("Alpha"));

        let archived = list_rolls(&conn, RollFilter::Archived, RollSort::Date).unwrap();
        assert_eq!(archived.len(), 1);

        let by_name = list_rolls(&conn, RollFilter::All, RollSort::Name).unwrap();
        assert_eq!(by_name[0].name.as_deref(), Some("Alpha"));
        assert_eq!(by_name[1].name.as_deref(), Some("beta"));
        assert_eq!(by_name.len(), 3);
    }

    #[test]
    fn frame_sort_uses_reference_scales() {
        let conn = open_test_db();
        let roll_id = insert_roll(&conn, &Roll::default()).unwrap();

        // Lexicographic order would put "16" before "2.8"
        for (count, aperture, shutter) in
            [(1, "16", "1/30"), (2, "2.8", "1/1000"), (3, "5.6", "1/250")]
        {
            insert_frame(
                &conn,
                &Frame {
                    roll_id,
                    count,
                    aperture: Some(aperture.to_string()),
                    shutter: Some(shutter.to_string()),
                    no_of_exposures: 1,
                    ..Frame::default()
                },
            )
            .unwrap();
        }

        let by_aperture = list_frames(&conn, roll_id, FrameSort::Aperture).unwrap();
        let apertures: Vec<_> = by_aperture.iter().map(|f| f.aperture.clone().unwrap()).collect();
        assert_eq!(apertures, vec!["2.8", "5.6", "16"]);

        let by_shutter = list_frames(&conn, roll_id, FrameSort::Shutter).unwrap();
        let shutters: Vec<_> = by_shutter.iter().map(|f| f.shutter.clone().unwrap()).collect();
        assert_eq!(shutters, vec!["1/1000", "1/250", "1/30"]);

        let by_count = list_frames(&conn, roll_id, FrameSort::Count).unwrap();
        let counts: Vec<_> = by_count.iter().map(|f| f.count).collect();
        assert_eq!(counts, vec![1, 2, 3]);
    }
}
