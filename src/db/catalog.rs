// Schema catalog: the declarative description of the current schema version.
//
// This is the single source of truth for the table layout. Fresh databases
// are created from the DDL rendered here, and the integrity verifier checks
// candidate files against these same declarations, so the two can never
// drift apart. Autoincrement is a declared property of a column, not
// something re-derived from generated SQL.
//
// Foreign keys reference the parent's primary key implicitly (no target
// column in the REFERENCES clause).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Text,
}

impl ColumnKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ColumnKind::Integer => "INTEGER",
            ColumnKind::Text => "TEXT",
        }
    }

    /// Type-name match with "INT"/"INTEGER" treated as synonyms.
    pub fn matches(&self, declared: &str) -> bool {
        let declared = declared.trim().to_ascii_uppercase();
        match self {
            ColumnKind::Integer => declared == "INTEGER" || declared == "INT",
            ColumnKind::Text => declared == "TEXT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    Cascade,
    SetNull,
}

impl OnDelete {
    pub fn as_sql(&self) -> &'static str {
        match self {
            OnDelete::Cascade => "CASCADE",
            OnDelete::SetNull => "SET NULL",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ForeignKeyDef {
    pub parent_table: &'static str,
    pub on_delete: OnDelete,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub not_null: bool,
    pub primary_key: bool,
    pub autoincrement: bool,
    pub default: Option<&'static str>,
    pub foreign_key: Option<ForeignKeyDef>,
}

impl ColumnDef {
    pub const fn integer(name: &'static str) -> Self {
        ColumnDef {
            name,
            kind: ColumnKind::Integer,
            not_null: false,
            primary_key: false,
            autoincrement: false,
            default: None,
            foreign_key: None,
        }
    }

    pub const fn text(name: &'static str) -> Self {
        ColumnDef {
            name,
            kind: ColumnKind::Text,
            not_null: false,
            primary_key: false,
            autoincrement: false,
            default: None,
            foreign_key: None,
        }
    }

    pub const fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub const fn autoincrement(mut self) -> Self {
        self.autoincrement = true;
        self
    }

    pub const fn default_value(mut self, value: &'static str) -> Self {
        self.default = Some(value);
        self
    }

    pub const fn references(mut self, parent_table: &'static str, on_delete: OnDelete) -> Self {
        self.foreign_key = Some(ForeignKeyDef {
            parent_table,
            on_delete,
        });
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
}

impl TableDef {
    pub fn primary_key_count(&self) -> usize {
        self.columns.iter().filter(|c| c.primary_key).count()
    }

    /// True when this table has a single AUTOINCREMENT primary key.
    pub fn has_autoincrement(&self) -> bool {
        self.primary_key_count() == 1 && self.columns.iter().any(|c| c.autoincrement)
    }

    pub fn create_sql(&self) -> String {
        let pk_count = self.primary_key_count();
        let mut defs: Vec<String> = Vec::new();

        for col in self.columns {
            let mut def = format!("{} {}", col.name, col.kind.as_sql());
            if col.primary_key && pk_count == 1 {
                def.push_str(" PRIMARY KEY");
                if col.autoincrement {
                    def.push_str(" AUTOINCREMENT");
                }
            }
            if col.not_null {
                def.push_str(" NOT NULL");
            }
            if let Some(value) = col.default {
                def.push_str(" DEFAULT ");
                def.push_str(value);
            }
            if let Some(fk) = &col.foreign_key {
                def.push_str(" REFERENCES ");
                def.push_str(fk.parent_table);
                def.push_str(" ON DELETE ");
                def.push_str(fk.on_delete.as_sql());
            }
            defs.push(def);
        }

        if pk_count > 1 {
            let pk_cols: Vec<&str> = self
                .columns
                .iter()
                .filter(|c| c.primary_key)
                .map(|c| c.name)
                .collect();
            defs.push(format!("PRIMARY KEY ({})", pk_cols.join(", ")));
        }

        format!("CREATE TABLE {} (\n    {}\n)", self.name, defs.join(",\n    "))
    }
}

// ----- Current-version table declarations -----

const CAMERAS: TableDef = TableDef {
    name: "cameras",
    columns: &[
        ColumnDef::integer("id").primary_key().autoincrement(),
        ColumnDef::text("make").not_null(),
        ColumnDef::text("model").not_null(),
        ColumnDef::text("min_shutter"),
        ColumnDef::text("max_shutter"),
        ColumnDef::text("serial_number"),
        ColumnDef::text("shutter_increments")
            .not_null()
            .default_value("'third'"),
        ColumnDef::text("exposure_comp_increments")
            .not_null()
            .default_value("'third'"),
    ],
};

const LENSES: TableDef = TableDef {
    name: "lenses",
    columns: &[
        ColumnDef::integer("id").primary_key().autoincrement(),
        ColumnDef::text("make").not_null(),
        ColumnDef::text("model").not_null(),
        ColumnDef::text("min_aperture"),
        ColumnDef::text("max_aperture"),
        ColumnDef::text("serial_number"),
        ColumnDef::text("aperture_increments")
            .not_null()
            .default_value("'third'"),
        ColumnDef::integer("min_focal_length").not_null().default_value("0"),
        ColumnDef::integer("max_focal_length").not_null().default_value("0"),
    ],
};

const FILTERS: TableDef = TableDef {
    name: "filters",
    columns: &[
        ColumnDef::integer("id").primary_key().autoincrement(),
        ColumnDef::text("make").not_null(),
        ColumnDef::text("model").not_null(),
    ],
};

const FILM_STOCKS: TableDef = TableDef {
    name: "film_stocks",
    columns: &[
        ColumnDef::integer("id").primary_key().autoincrement(),
        ColumnDef::text("make").not_null(),
        ColumnDef::text("model").not_null(),
        ColumnDef::integer("iso").not_null().default_value("0"),
        ColumnDef::text("type"),
        ColumnDef::text("process"),
        ColumnDef::integer("preadded").not_null().default_value("0"),
    ],
};

const ROLLS: TableDef = TableDef {
    name: "rolls",
    columns: &[
        ColumnDef::integer("id").primary_key().autoincrement(),
        ColumnDef::text("name"),
        ColumnDef::text("date"),
        ColumnDef::text("unloaded"),
        ColumnDef::text("developed"),
        ColumnDef::text("note"),
        ColumnDef::integer("iso"),
        ColumnDef::text("push"),
        ColumnDef::text("format"),
        ColumnDef::integer("archived").not_null().default_value("0"),
        ColumnDef::integer("camera_id").references("cameras", OnDelete::SetNull),
        ColumnDef::integer("film_stock_id").references("film_stocks", OnDelete::SetNull),
    ],
};

const FRAMES: TableDef = TableDef {
    name: "frames",
    columns: &[
        ColumnDef::integer("id").primary_key().autoincrement(),
        ColumnDef::integer("roll_id")
            .not_null()
            .references("rolls", OnDelete::Cascade),
        ColumnDef::integer("count").not_null(),
        ColumnDef::text("date"),
        ColumnDef::integer("lens_id").references("lenses", OnDelete::SetNull),
        ColumnDef::text("shutter"),
        ColumnDef::text("aperture"),
        ColumnDef::text("note"),
        ColumnDef::integer("focal_length"),
        ColumnDef::text("exposure_comp"),
        ColumnDef::integer("no_of_exposures").not_null().default_value("1"),
        ColumnDef::integer("flash_used").not_null().default_value("0"),
        ColumnDef::text("flash_power"),
        ColumnDef::text("flash_comp"),
        ColumnDef::text("metering_mode"),
        ColumnDef::text("light_source"),
        ColumnDef::text("location"),
        ColumnDef::text("formatted_address"),
        ColumnDef::text("picture_filename"),
    ],
};

const CAMERA_LENSES: TableDef = TableDef {
    name: "camera_lenses",
    columns: &[
        ColumnDef::integer("camera_id")
            .not_null()
            .primary_key()
            .references("cameras", OnDelete::Cascade),
        ColumnDef::integer("lens_id")
            .not_null()
            .primary_key()
            .references("lenses", OnDelete::Cascade),
    ],
};

const LENS_FILTERS: TableDef = TableDef {
    name: "lens_filters",
    columns: &[
        ColumnDef::integer("lens_id")
            .not_null()
            .primary_key()
            .references("lenses", OnDelete::Cascade),
        ColumnDef::integer("filter_id")
            .not_null()
            .primary_key()
            .references("filters", OnDelete::Cascade),
    ],
};

const FRAME_FILTERS: TableDef = TableDef {
    name: "frame_filters",
    columns: &[
        ColumnDef::integer("frame_id")
            .not_null()
            .primary_key()
            .references("frames", OnDelete::Cascade),
        ColumnDef::integer("filter_id")
            .not_null()
            .primary_key()
            .references("filters", OnDelete::Cascade),
    ],
};

/// Every table of the current schema version, parents before children.
pub const TABLES: &[TableDef] = &[
    CAMERAS,
    LENSES,
    FILTERS,
    FILM_STOCKS,
    ROLLS,
    FRAMES,
    CAMERA_LENSES,
    LENS_FILTERS,
    FRAME_FILTERS,
];

/// Secondary indexes for common queries.
pub const INDEXES: &[&str] = &[
    "CREATE INDEX idx_frames_roll ON frames(roll_id)",
    "CREATE INDEX idx_frames_lens ON frames(lens_id)",
    "CREATE INDEX idx_rolls_camera ON rolls(camera_id)",
    "CREATE INDEX idx_rolls_film_stock ON rolls(film_stock_id)",
];

/// Full current-version DDL for first-ever creation.
pub fn create_schema_sql() -> String {
    let mut sql = String::new();
    for table in TABLES {
        sql.push_str(&table.create_sql());
        sql.push_str(";\n");
    }
    for index in INDEXES {
        sql.push_str(index);
        sql.push_str(";\n");
    }
    sql
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_pk_renders_autoincrement() {
        let sql = CAMERAS.create_sql();
        assert!(sql.contains("id INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(sql.contains("make TEXT NOT NULL"));
        assert!(sql.contains("shutter_increments TEXT NOT NULL DEFAULT 'third'"));
    }

    #[test]
    fn composite_pk_renders_table_constraint() {
        let sql = FRAME_FILTERS.create_sql();
        assert!(sql.contains("PRIMARY KEY (frame_id, filter_id)"));
        assert!(!sql.contains("AUTOINCREMENT"));
    }

    #[test]
    fn foreign_keys_are_implicit_with_actions() {
        let sql = FRAMES.create_sql();
        assert!(sql.contains("roll_id INTEGER NOT NULL REFERENCES rolls ON DELETE CASCADE"));
        assert!(sql.contains("lens_id INTEGER REFERENCES lenses ON DELETE SET NULL"));
        // Implicit parent key: no target column list after the table name
        assert!(!sql.contains("REFERENCES rolls("));
    }

    #[test]
    fn full_schema_is_executable() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(&create_schema_sql()).unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, TABLES.len() as i64);
    }
}
