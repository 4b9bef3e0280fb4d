// Filmlog constants

// Paths
pub const APP_FOLDER: &str = ".filmlog";
pub const DB_FILENAME: &str = "filmlog.db";
pub const DB_BACKUP_SUFFIX: &str = ".backup";

// Characters replaced with '_' in export file names
pub const FILENAME_RESERVED_CHARS: [char; 9] = ['|', '\\', '?', '*', '<', '"', ':', '>', '/'];

// Export file name suffixes (appended to the sanitized roll name)
pub const CSV_EXPORT_SUFFIX: &str = "_csv.txt";
pub const EXIFTOOL_EXPORT_SUFFIX: &str = "_ExifToolCmds.txt";

// Reference aperture scale in third stops, widest first. Frame lists sorted
// by aperture use the position in this sequence, not a numeric parse, since
// values like "1.2" and "22" are free-form strings on the frame.
pub const APERTURE_VALUES: &[&str] = &[
    "1.0", "1.1", "1.2", "1.4", "1.6", "1.8", "2.0", "2.2", "2.5", "2.8",
    "3.2", "3.5", "4.0", "4.5", "5.0", "5.6", "6.3", "7.1", "8", "9",
    "10", "11", "13", "14", "16", "18", "20", "22", "25", "29",
    "32", "36", "45", "64",
];

// Reference shutter scale, fastest first. "B" sorts last.
pub const SHUTTER_VALUES: &[&str] = &[
    "1/8000", "1/6400", "1/5000", "1/4000", "1/3200", "1/2500", "1/2000",
    "1/1600", "1/1250", "1/1000", "1/800", "1/640", "1/500", "1/400",
    "1/320", "1/250", "1/200", "1/160", "1/125", "1/100", "1/80", "1/60",
    "1/50", "1/40", "1/30", "1/25", "1/20", "1/15", "1/13", "1/10",
    "1/8", "1/6", "1/5", "1/4", "1/3", "1/2.5", "1/2", "1/1.6", "1/1.3",
    "1", "1.3", "1.6", "2", "2.5", "3", "4", "5", "6", "8", "10", "13",
    "15", "20", "25", "30", "B",
];
