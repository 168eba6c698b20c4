//! v001: lifecycle ledger and key/value settings.

pub const SQL: &str = "
-- One row per module slug. Status and its timestamps are only ever
-- written together in one statement.
CREATE TABLE IF NOT EXISTS module_lifecycle (
    slug TEXT PRIMARY KEY,
    status TEXT NOT NULL CHECK (status IN ('active', 'inactive')),
    installed_at TEXT NOT NULL,
    activated_at TEXT,
    deactivated_at TEXT,
    deactivated_by TEXT,
    updated_at TEXT NOT NULL
) STRICT;

CREATE INDEX IF NOT EXISTS idx_module_lifecycle_status
    ON module_lifecycle(status, updated_at);

-- Application-wide settings. Older deployments kept a single global
-- install timestamp here.
CREATE TABLE IF NOT EXISTS app_settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
) STRICT;
";
