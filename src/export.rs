// Per-roll exports: a spreadsheet-friendly CSV and a list of ExifTool
// commands that stamp the logged metadata onto scanned image files.
//
// Both exports are plain text files named after the roll, with characters
// that are unsafe in file names replaced.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};

use crate::constants::{CSV_EXPORT_SUFFIX, EXIFTOOL_EXPORT_SUFFIX, FILENAME_RESERVED_CHARS};
use crate::db::gateway::{self, FrameSort};
use crate::error::{FilmlogError, Result};
use crate::models::{Camera, FilmStock, Frame, Roll};
use rusqlite::Connection;

/// Replace characters that are reserved on common filesystems.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if FILENAME_RESERVED_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Render a roll and its frames as CSV text. Roll-level metadata comes
/// first as key/value rows, then the frame table.
pub fn roll_csv(conn: &Connection, roll: &Roll) -> Result<String> {
    let frames = gateway::list_frames(conn, roll.id, FrameSort::Count)?;
    let camera = lookup_camera(conn, roll)?;
    let stock = lookup_film_stock(conn, roll)?;

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    let stock_name = stock.as_ref().map(FilmStock::name).unwrap_or_default();
    let camera_name = camera.as_ref().map(Camera::name).unwrap_or_default();
    let iso = roll.iso.map(|i| i.to_string()).unwrap_or_default();

    writer.write_record(["Roll", roll.name.as_deref().unwrap_or("")])?;
    writer.write_record(["Loaded", roll.date.as_deref().unwrap_or("")])?;
    writer.write_record(["Unloaded", roll.unloaded.as_deref().unwrap_or("")])?;
    writer.write_record(["Developed", roll.developed.as_deref().unwrap_or("")])?;
    writer.write_record(["Film stock", stock_name.as_str()])?;
    writer.write_record(["ISO", iso.as_str()])?;
    writer.write_record(["Push/pull", roll.push_pull.as_deref().unwrap_or("")])?;
    writer.write_record(["Format", roll.format.as_db()])?;
    writer.write_record(["Camera", camera_name.as_str()])?;
    writer.write_record(["Notes", roll.note.as_deref().unwrap_or("")])?;
    writer.write_record([""])?;

    writer.write_record([
        "Count",
        "Date",
        "Lens",
        "Shutter",
        "Aperture",
        "Focal length",
        "Exposure comp",
        "Filters",
        "Flash",
        "Metering",
        "Light source",
        "Location",
        "Note",
    ])?;

    for frame in &frames {
        let lens = match frame.lens_id {
            Some(id) => gateway::get_lens(conn, id)?.map(|l| l.name()).unwrap_or_default(),
            None => String::new(),
        };
        let filters = gateway::filters_for_frame(conn, frame.id)?
            .iter()
            .map(|f| f.name())
            .collect::<Vec<_>>()
            .join("; ");
        let location = frame
            .location
            .as_ref()
            .map(|l| l.formatted_address.clone().unwrap_or_else(|| l.to_db()))
            .unwrap_or_default();

        writer.write_record([
            frame.count.to_string(),
            frame.date.clone().unwrap_or_default(),
            lens,
            frame.shutter.clone().unwrap_or_default(),
            frame.aperture.clone().unwrap_or_default(),
            frame
                .focal_length
                .map(|f| f.to_string())
                .unwrap_or_default(),
            frame.exposure_comp.clone().unwrap_or_default(),
            filters,
            if frame.flash_used { "Yes" } else { "No" }.to_string(),
            frame.metering_mode.as_db().to_string(),
            frame.light_source.as_db().to_string(),
            location,
            frame.note.clone().unwrap_or_default(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| FilmlogError::Other(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| FilmlogError::Other(e.to_string()))
}

/// Frame dates are stored as text; ExifTool wants "YYYY:MM:DD HH:MM:SS".
fn exif_date(date: &str) -> Option<String> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M") {
        return Some(dt.format("%Y:%m:%d %H:%M:%S").to_string());
    }
    if let Ok(d) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return Some(format!("{} 00:00:00", d.format("%Y:%m:%d")));
    }
    None
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\\\""))
}

fn frame_command(
    frame: &Frame,
    roll: &Roll,
    camera: Option<&Camera>,
    lens_name: Option<&str>,
) -> String {
    let mut parts = vec!["exiftool".to_string()];

    if let Some(exif) = frame.date.as_deref().and_then(exif_date) {
        parts.push(format!("-DateTimeOriginal={}", quoted(&exif)));
    }
    if let Some(shutter) = &frame.shutter {
        // The bulb marker is not a numeric exposure time
        if shutter != "B" {
            parts.push(format!("-ShutterSpeedValue={}", quoted(shutter)));
            parts.push(format!("-ExposureTime={}", quoted(shutter)));
        }
    }
    if let Some(aperture) = &frame.aperture {
        parts.push(format!("-ApertureValue={}", quoted(aperture)));
        parts.push(format!("-FNumber={}", quoted(aperture)));
    }
    if let Some(camera) = camera {
        parts.push(format!("-Make={}", quoted(&camera.make)));
        parts.push(format!("-Model={}", quoted(&camera.model)));
    }
    if let Some(lens) = lens_name {
        parts.push(format!("-LensModel={}", quoted(lens)));
    }
    if let Some(focal_length) = frame.focal_length {
        parts.push(format!("-FocalLength={}", quoted(&focal_length.to_string())));
    }
    if let Some(comp) = &frame.exposure_comp {
        parts.push(format!("-ExposureCompensation={}", quoted(comp)));
    }
    if let Some(iso) = roll.iso {
        parts.push(format!("-ISO={}", iso));
    }
    if let Some(location) = &frame.location {
        parts.push(format!("-GPSLatitude={}", location.latitude.abs()));
        parts.push(format!(
            "-GPSLatitudeRef={}",
            if location.latitude < 0.0 { "S" } else { "N" }
        ));
        parts.push(format!("-GPSLongitude={}", location.longitude.abs()));
        parts.push(format!(
            "-GPSLongitudeRef={}",
            if location.longitude < 0.0 { "W" } else { "E" }
        ));
    }
    if let Some(note) = &frame.note {
        parts.push(format!("-ImageDescription={}", quoted(note)));
    }

    let target = frame
        .picture_filename
        .clone()
        .unwrap_or_else(|| format!("<frame {} file>", frame.count));
    parts.push(quoted(&target));

    parts.join(" ")
}

/// One ExifTool invocation per frame, newline separated.
pub fn roll_exiftool_commands(conn: &Connection, roll: &Roll) -> Result<String> {
    let frames = gateway::list_frames(conn, roll.id, FrameSort::Count)?;
    let camera = lookup_camera(conn, roll)?;

    let mut lines = Vec::with_capacity(frames.len());
    for frame in &frames {
        let lens_name = match frame.lens_id {
            Some(id) => gateway::get_lens(conn, id)?.map(|l| l.name()),
            None => None,
        };
        lines.push(frame_command(frame, roll, camera.as_ref(), lens_name.as_deref()));
    }

    let mut text = lines.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    Ok(text)
}

/// Write both export files for a roll into `directory`. Returns the CSV
/// and ExifTool file paths.
pub fn write_roll_export(
    conn: &Connection,
    roll_id: i64,
    directory: &Path,
) -> Result<(PathBuf, PathBuf)> {
    let roll = gateway::get_roll(conn, roll_id)?
        .ok_or_else(|| FilmlogError::NotFound(format!("roll {}", roll_id)))?;

    let base = sanitize_file_name(roll.name.as_deref().unwrap_or("Roll"));
    let csv_path = directory.join(format!("{}{}", base, CSV_EXPORT_SUFFIX));
    let cmds_path = directory.join(format!("{}{}", base, EXIFTOOL_EXPORT_SUFFIX));

    fs::write(&csv_path, roll_csv(conn, &roll)?)?;
    fs::write(&cmds_path, roll_exiftool_commands(conn, &roll)?)?;
    log::info!(
        "Exported roll {:?} to {} and {}",
        roll.name.as_deref().unwrap_or(""),
        csv_path.display(),
        cmds_path.display()
    );

    Ok((csv_path, cmds_path))
}

fn lookup_camera(conn: &Connection, roll: &Roll) -> Result<Option<Camera>> {
    match roll.camera_id {
        Some(id) => gateway::get_camera(conn, id),
        None => Ok(None),
    }
}

fn lookup_film_stock(conn: &Connection, roll: &Roll) -> Result<Option<FilmStock>> {
    match roll.film_stock_id {
        Some(id) => gateway::get_film_stock(conn, id),
        None => Ok(None),
    }
}
