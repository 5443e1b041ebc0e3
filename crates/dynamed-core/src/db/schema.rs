//! SQLite schema definition.

/// Complete database schema for the DynaMed core.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Reference Data
-- ============================================================================

-- Flat name-only entities, discriminated by kind
CREATE TABLE IF NOT EXISTS reference_items (
    id INTEGER PRIMARY KEY,
    kind TEXT NOT NULL CHECK (kind IN (
        'allergy', 'medical_history', 'current_medication',
        'indication', 'precaution', 'medical_class'
    )),
    name TEXT NOT NULL,
    description TEXT,
    UNIQUE (kind, name)
);

CREATE INDEX IF NOT EXISTS idx_reference_kind_name ON reference_items(kind, name);

CREATE TABLE IF NOT EXISTS molecules (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    pregnancy_unsafe INTEGER NOT NULL DEFAULT 0,
    breastfeeding_unsafe INTEGER NOT NULL DEFAULT 0,
    major_side_effects TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Molecule associations of every reference kind
CREATE TABLE IF NOT EXISTS molecule_links (
    molecule_id INTEGER NOT NULL REFERENCES molecules(id) ON DELETE CASCADE,
    item_id INTEGER NOT NULL REFERENCES reference_items(id) ON DELETE CASCADE,
    PRIMARY KEY (molecule_id, item_id)
);

CREATE INDEX IF NOT EXISTS idx_molecule_links_item ON molecule_links(item_id);

CREATE TABLE IF NOT EXISTS commercial_names (
    id INTEGER PRIMARY KEY,
    molecule_id INTEGER NOT NULL REFERENCES molecules(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    dosage TEXT,
    form TEXT,
    packaging TEXT,
    UNIQUE (molecule_id, name)
);

CREATE TABLE IF NOT EXISTS diagnoses (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS diagnosis_classes (
    diagnosis_id INTEGER NOT NULL REFERENCES diagnoses(id) ON DELETE CASCADE,
    medical_class_id INTEGER NOT NULL REFERENCES reference_items(id) ON DELETE CASCADE,
    PRIMARY KEY (diagnosis_id, medical_class_id)
);

CREATE TRIGGER IF NOT EXISTS diagnosis_classes_check_kind BEFORE INSERT ON diagnosis_classes
BEGIN
    SELECT CASE
        WHEN (SELECT kind FROM reference_items WHERE id = new.medical_class_id) IS NOT 'medical_class' THEN
            RAISE(ABORT, 'Diagnoses can only link medical classes')
    END;
END;

-- Interactions are unordered pairs, stored lower molecule ID first
CREATE TABLE IF NOT EXISTS interactions (
    id INTEGER PRIMARY KEY,
    molecule_low INTEGER NOT NULL REFERENCES molecules(id) ON DELETE CASCADE,
    molecule_high INTEGER NOT NULL REFERENCES molecules(id) ON DELETE CASCADE,
    medical_class_id INTEGER REFERENCES reference_items(id) ON DELETE SET NULL,
    interaction_type TEXT NOT NULL,
    CHECK (molecule_low <= molecule_high)
);

CREATE INDEX IF NOT EXISTS idx_interactions_pair ON interactions(molecule_low, molecule_high);

-- ============================================================================
-- Reference Revision (single row, bumped on every reference-data write)
-- ============================================================================

CREATE TABLE IF NOT EXISTS reference_revision (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    revision INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

INSERT OR IGNORE INTO reference_revision (id, revision) VALUES (1, 0);

CREATE TRIGGER IF NOT EXISTS reference_items_rev_ai AFTER INSERT ON reference_items BEGIN
    UPDATE reference_revision SET revision = revision + 1, updated_at = datetime('now') WHERE id = 1;
END;
CREATE TRIGGER IF NOT EXISTS reference_items_rev_au AFTER UPDATE ON reference_items BEGIN
    UPDATE reference_revision SET revision = revision + 1, updated_at = datetime('now') WHERE id = 1;
END;
CREATE TRIGGER IF NOT EXISTS reference_items_rev_ad AFTER DELETE ON reference_items BEGIN
    UPDATE reference_revision SET revision = revision + 1, updated_at = datetime('now') WHERE id = 1;
END;

CREATE TRIGGER IF NOT EXISTS molecules_rev_ai AFTER INSERT ON molecules BEGIN
    UPDATE reference_revision SET revision = revision + 1, updated_at = datetime('now') WHERE id = 1;
END;
CREATE TRIGGER IF NOT EXISTS molecules_rev_au AFTER UPDATE ON molecules BEGIN
    UPDATE reference_revision SET revision = revision + 1, updated_at = datetime('now') WHERE id = 1;
END;
CREATE TRIGGER IF NOT EXISTS molecules_rev_ad AFTER DELETE ON molecules BEGIN
    UPDATE reference_revision SET revision = revision + 1, updated_at = datetime('now') WHERE id = 1;
END;

CREATE TRIGGER IF NOT EXISTS molecule_links_rev_ai AFTER INSERT ON molecule_links BEGIN
    UPDATE reference_revision SET revision = revision + 1, updated_at = datetime('now') WHERE id = 1;
END;
CREATE TRIGGER IF NOT EXISTS molecule_links_rev_ad AFTER DELETE ON molecule_links BEGIN
    UPDATE reference_revision SET revision = revision + 1, updated_at = datetime('now') WHERE id = 1;
END;

CREATE TRIGGER IF NOT EXISTS diagnosis_classes_rev_ai AFTER INSERT ON diagnosis_classes BEGIN
    UPDATE reference_revision SET revision = revision + 1, updated_at = datetime('now') WHERE id = 1;
END;
CREATE TRIGGER IF NOT EXISTS diagnosis_classes_rev_ad AFTER DELETE ON diagnosis_classes BEGIN
    UPDATE reference_revision SET revision = revision + 1, updated_at = datetime('now') WHERE id = 1;
END;

-- ============================================================================
-- Consultations
-- ============================================================================

CREATE TABLE IF NOT EXISTS consultations (
    id TEXT PRIMARY KEY,
    patient_ref TEXT,
    consultation_date TEXT NOT NULL,
    pregnant INTEGER NOT NULL DEFAULT 0,
    breastfeeding INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_consultations_patient ON consultations(patient_ref);

CREATE TABLE IF NOT EXISTS consultation_diagnoses (
    consultation_id TEXT NOT NULL REFERENCES consultations(id) ON DELETE CASCADE,
    diagnosis_id INTEGER NOT NULL REFERENCES diagnoses(id) ON DELETE CASCADE,
    PRIMARY KEY (consultation_id, diagnosis_id)
);

-- Selected allergies, history, current medications, indications, precautions
CREATE TABLE IF NOT EXISTS consultation_items (
    consultation_id TEXT NOT NULL REFERENCES consultations(id) ON DELETE CASCADE,
    item_id INTEGER NOT NULL REFERENCES reference_items(id) ON DELETE CASCADE,
    PRIMARY KEY (consultation_id, item_id)
);

CREATE TRIGGER IF NOT EXISTS consultation_items_check_kind BEFORE INSERT ON consultation_items
BEGIN
    SELECT CASE
        WHEN (SELECT kind FROM reference_items WHERE id = new.item_id) = 'medical_class' THEN
            RAISE(ABORT, 'Medical classes derive from diagnoses')
    END;
END;

-- Cached scorer output, at most one per consultation
CREATE TABLE IF NOT EXISTS molecule_snapshots (
    consultation_id TEXT PRIMARY KEY REFERENCES consultations(id) ON DELETE CASCADE,
    molecule_ids TEXT NOT NULL DEFAULT '[]',     -- JSON array, best first
    fingerprint TEXT NOT NULL,                   -- SHA-256 of inputs + reference revision
    computed_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Prescriptions
-- ============================================================================

CREATE TABLE IF NOT EXISTS prescriptions (
    id TEXT PRIMARY KEY,
    reference TEXT NOT NULL UNIQUE,
    consultation_id TEXT NOT NULL REFERENCES consultations(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_prescriptions_consultation ON prescriptions(consultation_id);

CREATE TABLE IF NOT EXISTS prescription_lines (
    id INTEGER PRIMARY KEY,
    prescription_id TEXT NOT NULL REFERENCES prescriptions(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    molecule_id INTEGER NOT NULL REFERENCES molecules(id),
    commercial_name_id INTEGER REFERENCES commercial_names(id) ON DELETE SET NULL,
    dosage TEXT,
    form TEXT,
    packaging TEXT,
    UNIQUE (prescription_id, position)
);

CREATE TRIGGER IF NOT EXISTS prescription_lines_check_brand BEFORE INSERT ON prescription_lines
WHEN new.commercial_name_id IS NOT NULL
BEGIN
    SELECT CASE
        WHEN (SELECT molecule_id FROM commercial_names WHERE id = new.commercial_name_id) IS NOT new.molecule_id THEN
            RAISE(ABORT, 'Commercial name does not belong to molecule')
    END;
END;

CREATE TRIGGER IF NOT EXISTS prescription_lines_check_brand_update BEFORE UPDATE ON prescription_lines
WHEN new.commercial_name_id IS NOT NULL
BEGIN
    SELECT CASE
        WHEN (SELECT molecule_id FROM commercial_names WHERE id = new.commercial_name_id) IS NOT new.molecule_id THEN
            RAISE(ABORT, 'Commercial name does not belong to molecule')
    END;
END;

-- Reference sequences
CREATE TABLE IF NOT EXISTS sequences (
    name TEXT PRIMARY KEY,
    next_value INTEGER NOT NULL DEFAULT 1
);

INSERT OR IGNORE INTO sequences (name, next_value) VALUES ('prescription', 1);
"#;
