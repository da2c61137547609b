pub(crate) const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS profiles (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    email       TEXT NOT NULL UNIQUE,
    full_name   TEXT,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS households (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    name         TEXT NOT NULL,
    invite_code  TEXT NOT NULL UNIQUE,
    created_by   INTEGER NOT NULL REFERENCES profiles(id),
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS household_members (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    household_id  INTEGER NOT NULL REFERENCES households(id) ON DELETE CASCADE,
    user_id       INTEGER NOT NULL REFERENCES profiles(id),
    role          TEXT NOT NULL DEFAULT 'member' CHECK (role IN ('owner', 'admin', 'member')),
    joined_at     TEXT NOT NULL,
    UNIQUE(household_id, user_id)
);

CREATE TABLE IF NOT EXISTS plan_categories (
    household_id  INTEGER NOT NULL REFERENCES households(id) ON DELETE CASCADE,
    position      INTEGER NOT NULL,
    key           TEXT NOT NULL,
    label         TEXT NOT NULL,
    percentage    INTEGER NOT NULL,
    PRIMARY KEY (household_id, key)
);

CREATE TABLE IF NOT EXISTS budgets (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    household_id  INTEGER NOT NULL REFERENCES households(id) ON DELETE CASCADE,
    month         TEXT NOT NULL,
    income        TEXT NOT NULL DEFAULT '0',
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    UNIQUE(household_id, month)
);

CREATE TABLE IF NOT EXISTS expenses (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    household_id  INTEGER NOT NULL REFERENCES households(id) ON DELETE CASCADE,
    category      TEXT NOT NULL,
    description   TEXT NOT NULL,
    amount        TEXT NOT NULL,
    date          TEXT NOT NULL,
    created_by    INTEGER REFERENCES profiles(id),
    created_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_expenses_household_date ON expenses(household_id, date);

CREATE TABLE IF NOT EXISTS settings (
    key    TEXT PRIMARY KEY,
    value  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS expense_changes (
    seq           INTEGER PRIMARY KEY AUTOINCREMENT,
    household_id  INTEGER NOT NULL,
    expense_id    INTEGER NOT NULL,
    kind          TEXT NOT NULL CHECK (kind IN ('insert', 'update', 'delete'))
);

CREATE INDEX IF NOT EXISTS idx_expense_changes_household ON expense_changes(household_id, seq);

CREATE TRIGGER IF NOT EXISTS expenses_after_insert AFTER INSERT ON expenses
BEGIN
    INSERT INTO expense_changes (household_id, expense_id, kind)
    VALUES (NEW.household_id, NEW.id, 'insert');
END;

CREATE TRIGGER IF NOT EXISTS expenses_after_update AFTER UPDATE ON expenses
BEGIN
    INSERT INTO expense_changes (household_id, expense_id, kind)
    VALUES (NEW.household_id, NEW.id, 'update');
END;

CREATE TRIGGER IF NOT EXISTS expenses_after_delete AFTER DELETE ON expenses
BEGIN
    INSERT INTO expense_changes (household_id, expense_id, kind)
    VALUES (OLD.household_id, OLD.id, 'delete');
END;
"#;

pub(crate) const CURRENT_VERSION: i32 = 1;

/// Migrations from version N to N+1.
/// Each entry is (from_version, sql).
pub(crate) const MIGRATIONS: &[(i32, &str)] = &[];
