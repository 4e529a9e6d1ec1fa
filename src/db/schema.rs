pub const SCHEMA: &str = r#"
-- Albums: directories (local) or library albums (remote)
CREATE TABLE IF NOT EXISTS albums (
    source TEXT NOT NULL,          -- 'local' or 'remote'
    id TEXT NOT NULL,              -- relative directory path or remote album id
    title TEXT NOT NULL,
    creation_time TEXT NOT NULL DEFAULT '',
    path TEXT NOT NULL DEFAULT '', -- empty for remote albums
    inserted_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY (source, id)
);

CREATE INDEX IF NOT EXISTS idx_albums_title ON albums(source, title);

-- Photos: media files (local) or media items (remote)
CREATE TABLE IF NOT EXISTS photos (
    source TEXT NOT NULL,
    id TEXT NOT NULL,              -- relative file path or remote item id
    filename TEXT NOT NULL,
    normalized_filename TEXT NOT NULL,
    creation_time TEXT NOT NULL DEFAULT '',
    mime_type TEXT NOT NULL DEFAULT '',
    width INTEGER NOT NULL DEFAULT 0,
    height INTEGER NOT NULL DEFAULT 0,
    path TEXT NOT NULL DEFAULT '',
    size INTEGER,                  -- local only
    PRIMARY KEY (source, id)
);

CREATE INDEX IF NOT EXISTS idx_photos_filename ON photos(source, filename);
CREATE INDEX IF NOT EXISTS idx_photos_normalized ON photos(source, normalized_filename);
CREATE INDEX IF NOT EXISTS idx_photos_creation_time ON photos(source, creation_time);

-- Album membership, never crossing sources
CREATE TABLE IF NOT EXISTS album_photos (
    source TEXT NOT NULL,
    album_id TEXT NOT NULL,
    photo_id TEXT NOT NULL,
    PRIMARY KEY (source, album_id, photo_id),
    FOREIGN KEY (source, album_id) REFERENCES albums(source, id) ON DELETE CASCADE,
    FOREIGN KEY (source, photo_id) REFERENCES photos(source, id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_album_photos_photo ON album_photos(source, photo_id);
"#;

/// Tables that must exist before the store can be queried.
pub const REQUIRED_TABLES: [&str; 3] = ["albums", "photos", "album_photos"];
