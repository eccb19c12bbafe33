//! SQL schema for the gatepass SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS` / `INSERT OR IGNORE`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Visits are never deleted. The only UPDATE ever issued is the checkout
-- transition, guarded on status = 'INSIDE'.
CREATE TABLE IF NOT EXISTS visits (
    visit_id        TEXT PRIMARY KEY,
    full_name       TEXT NOT NULL,
    phone_number    TEXT NOT NULL,
    purpose         TEXT NOT NULL,
    visiting_person TEXT NOT NULL,
    department      TEXT NOT NULL,
    status          TEXT NOT NULL DEFAULT 'INSIDE'
                    CHECK (status IN ('INSIDE', 'OUTSIDE')),
    check_in_time   TEXT NOT NULL,   -- RFC 3339 UTC, fixed width
    check_out_time  TEXT,
    remarks         TEXT,
    CHECK ((status = 'OUTSIDE') = (check_out_time IS NOT NULL)),
    CHECK (check_out_time IS NULL OR check_out_time >= check_in_time)
);

CREATE INDEX IF NOT EXISTS visits_status_idx   ON visits(status);
CREATE INDEX IF NOT EXISTS visits_check_in_idx ON visits(check_in_time);

CREATE TABLE IF NOT EXISTS profiles (
    profile_id    TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE COLLATE NOCASE,
    full_name     TEXT,
    role          TEXT CHECK (role IN ('admin', 'staff')),   -- NULL until assigned
    password_hash TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS settings (
    setting_key   TEXT PRIMARY KEY,
    category      TEXT NOT NULL,
    setting_value TEXT NOT NULL,   -- JSON
    updated_by    TEXT REFERENCES profiles(profile_id),
    updated_at    TEXT NOT NULL
);

INSERT OR IGNORE INTO settings (setting_key, category, setting_value, updated_at) VALUES
    ('organization_name',        'general',       '\"Main Campus\"',        '1970-01-01T00:00:00.000000Z'),
    ('organization_address',     'general',       '\"\"',                   '1970-01-01T00:00:00.000000Z'),
    ('contact_email',            'general',       '\"\"',                   '1970-01-01T00:00:00.000000Z'),
    ('session_timeout_minutes',  'security',      '60',                     '1970-01-01T00:00:00.000000Z'),
    ('require_two_factor',       'security',      'false',                  '1970-01-01T00:00:00.000000Z'),
    ('email_alerts',             'notifications', 'true',                   '1970-01-01T00:00:00.000000Z'),
    ('long_stay_alert_hours',    'notifications', '4',                      '1970-01-01T00:00:00.000000Z'),
    ('max_visit_duration_hours', 'visits',        '8',                      '1970-01-01T00:00:00.000000Z');

PRAGMA user_version = 1;
";
