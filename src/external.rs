// Seams for services the surrounding application provides: place lookup
// for frame locations, and native pickers for transfer destinations.
// The library only defines the contracts; hosts supply implementations.

use std::path::PathBuf;

use crate::error::Result;
use crate::models::Location;

/// Resolves place names to coordinates and back.
pub trait Geocoder {
    /// Forward search for a free-form query. `Ok(None)` means nothing
    /// matched, which is not an error.
    fn search(&self, query: &str) -> Result<Option<Location>>;

    /// Reverse lookup of a coordinate pair to a display address.
    fn reverse(&self, latitude: f64, longitude: f64) -> Result<Option<String>>;
}

/// Lets the user choose filesystem locations for import and export.
/// `Ok(None)` means the dialog was cancelled.
pub trait TransferPicker {
    /// Pick a directory to write exports into.
    fn pick_directory(&self) -> Result<Option<PathBuf>>;

    /// Pick an existing file to import.
    fn pick_file(&self) -> Result<Option<PathBuf>>;
}
