/// SQL-schema för FS Pal

pub const SCHEMA_VERSION: i32 = 2;

/// Tabeller som fanns redan i första versionen
pub const CREATE_TABLES_V1: &str = r#"
-- Besökta personer och adresser
CREATE TABLE IF NOT EXISTS persons (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    block TEXT,
    unit TEXT,
    street TEXT,
    contact TEXT,
    category TEXT NOT NULL DEFAULT 'call-again',
    remarks TEXT,
    publications TEXT,
    date TEXT,
    initial_visit TEXT,
    latitude REAL,
    longitude REAL,
    is_private INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'irregular',
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_persons_name ON persons(name);

-- Uppföljningar (tas bort av applikationen tillsammans med personen)
CREATE TABLE IF NOT EXISTS follow_ups (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    person_id INTEGER NOT NULL,
    date TEXT NOT NULL,
    notes TEXT NOT NULL DEFAULT '',
    FOREIGN KEY (person_id) REFERENCES persons(id)
);

CREATE INDEX IF NOT EXISTS idx_follow_ups_person ON follow_ups(person_id);

-- Etiketter
CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

-- Koppling person <-> etikett
CREATE TABLE IF NOT EXISTS person_tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    person_id INTEGER NOT NULL,
    tag_id INTEGER NOT NULL,
    FOREIGN KEY (person_id) REFERENCES persons(id),
    FOREIGN KEY (tag_id) REFERENCES tags(id),
    UNIQUE (person_id, tag_id)
);

CREATE INDEX IF NOT EXISTS idx_person_tags_tag ON person_tags(tag_id);

-- Rapporter
CREATE TABLE IF NOT EXISTS reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    hours REAL NOT NULL DEFAULT 0,
    bible_studies INTEGER NOT NULL DEFAULT 0,
    type TEXT,
    credit_hours REAL,
    comment TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_reports_date ON reports(date);

-- Beständiga flaggor och inställningar
CREATE TABLE IF NOT EXISTS app_settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Migrationshistorik
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// Kartanteckningar och påminnelser, tillagda i version 2
pub const CREATE_TABLES_V2: &str = r#"
CREATE TABLE IF NOT EXISTS marker_annotations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    text TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS reminders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    note TEXT NOT NULL,
    created_at TEXT NOT NULL
);
"#;

/// Standardinställningar att skapa vid första start
pub const DEFAULT_SETTINGS: &[(&str, &str)] = &[
    ("language", "sv"),
    ("dark_map", "false"),
];
