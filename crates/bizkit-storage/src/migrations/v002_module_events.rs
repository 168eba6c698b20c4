//! v002: append-only audit trail of lifecycle transitions.

pub const SQL: &str = "
CREATE TABLE IF NOT EXISTS module_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    slug TEXT NOT NULL,
    event_type TEXT NOT NULL,
    actor TEXT,
    created_at TEXT NOT NULL
) STRICT;

CREATE INDEX IF NOT EXISTS idx_module_events_slug
    ON module_events(slug, id);
";
