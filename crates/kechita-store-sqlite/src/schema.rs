//! SQL schema for the Kechita SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.
//!
//! Money is stored as decimal TEXT so that no amount passes through a float.
//! Dates are ISO 8601 `YYYY-MM-DD`, which sorts correctly as text. Foreign
//! keys are documented but not enforced: snapshot rows may reference
//! entities outside the snapshot.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS branches (
    branch_id   TEXT PRIMARY KEY,
    branch_name TEXT NOT NULL,
    region      TEXT NOT NULL,
    urban_rural TEXT NOT NULL,
    staff_count INTEGER NOT NULL,
    target_tier TEXT NOT NULL,
    latitude    REAL NOT NULL,
    longitude   REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS officers (
    officer_id TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    branch_id  TEXT NOT NULL,   -- branches.branch_id
    role       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS customers (
    customer_id        TEXT PRIMARY KEY,
    first_name         TEXT NOT NULL,
    last_name          TEXT NOT NULL,
    gender             TEXT NOT NULL,
    birth_year         INTEGER NOT NULL,
    national_id        TEXT NOT NULL,
    phone              TEXT NOT NULL,
    primary_branch     TEXT NOT NULL,   -- branches.branch_id
    region             TEXT NOT NULL,
    business_type      TEXT NOT NULL,
    income_band        TEXT NOT NULL,
    historical_cycles  INTEGER NOT NULL,
    avg_weekly_cash    TEXT NOT NULL,
    fraud_flag_initial INTEGER NOT NULL
);

-- Loans are append-only history; status and flags are corrected in place.
CREATE TABLE IF NOT EXISTS loans (
    loan_id           TEXT PRIMARY KEY,
    customer_id       TEXT NOT NULL,   -- customers.customer_id
    branch_id         TEXT NOT NULL,   -- branches.branch_id
    officer_id        TEXT NOT NULL,   -- officers.officer_id
    disbursement_date TEXT NOT NULL,
    due_date          TEXT NOT NULL,
    amount            TEXT NOT NULL,
    tenor_weeks       INTEGER NOT NULL,
    daily_installment TEXT NOT NULL,
    miss_rate         REAL NOT NULL,
    rescheduled       INTEGER NOT NULL,
    default_flag      INTEGER NOT NULL,
    status            TEXT NOT NULL    -- 'active' | 'completed' | 'defaulted' | 'written_off'
);

CREATE TABLE IF NOT EXISTS repayments (
    repayment_id TEXT PRIMARY KEY,
    loan_id      TEXT NOT NULL,   -- loans.loan_id
    customer_id  TEXT NOT NULL,
    branch_id    TEXT NOT NULL,
    payment_date TEXT NOT NULL,
    amount_paid  TEXT NOT NULL,
    status       TEXT NOT NULL    -- 'paid' | 'partial' | 'missed'
);

CREATE TABLE IF NOT EXISTS daily_branch_performance (
    date                 TEXT NOT NULL,
    branch_id            TEXT NOT NULL,
    region               TEXT NOT NULL,
    recruited_today      INTEGER NOT NULL,
    disbursed_amount_ksh TEXT NOT NULL,
    daily_dues_ksh       TEXT NOT NULL,
    collected_ksh        TEXT NOT NULL,
    missed_calls         INTEGER NOT NULL,
    arrears_new_ksh      TEXT NOT NULL,
    par_percent          REAL NOT NULL,
    daily_target_ksh     TEXT NOT NULL,
    PRIMARY KEY (date, branch_id)
);

CREATE TABLE IF NOT EXISTS monthly_branch_summary (
    branch_id             TEXT NOT NULL,
    month                 TEXT NOT NULL,   -- YYYY-MM
    recruited_monthly     INTEGER NOT NULL,
    disbursed_monthly_ksh TEXT NOT NULL,
    dues_monthly_ksh      TEXT NOT NULL,
    collected_monthly_ksh TEXT NOT NULL,
    arrears_monthly_ksh   TEXT NOT NULL,
    avg_par_percent       REAL NOT NULL,
    PRIMARY KEY (branch_id, month)
);

CREATE TABLE IF NOT EXISTS officer_performance (
    officer_id           TEXT NOT NULL,
    branch_id            TEXT NOT NULL,
    month                TEXT NOT NULL,
    loans_disbursed      INTEGER NOT NULL,
    amount_disbursed_ksh TEXT NOT NULL,
    collected_ksh        TEXT NOT NULL,
    dues_ksh             TEXT NOT NULL,
    par_percent          REAL NOT NULL,
    PRIMARY KEY (officer_id, month)
);

CREATE TABLE IF NOT EXISTS fraud_signals (
    customer_id                  TEXT PRIMARY KEY,
    national_id_mismatch         INTEGER NOT NULL,
    shared_phone_number          INTEGER NOT NULL,
    distance_anomaly             INTEGER NOT NULL,
    suspicious_repayment_pattern INTEGER NOT NULL,
    synthetic_customer_score     REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS ai_customer_features (
    customer_id           TEXT PRIMARY KEY,
    primary_branch        TEXT NOT NULL,
    avg_weekly_cash       TEXT NOT NULL,
    historical_cycles     INTEGER NOT NULL,
    risk_score            REAL NOT NULL,
    default_prob          REAL NOT NULL,
    churn_prob            REAL NOT NULL,
    recommended_limit_ksh TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS officers_branch_idx   ON officers(branch_id);
CREATE INDEX IF NOT EXISTS customers_branch_idx  ON customers(primary_branch);
CREATE INDEX IF NOT EXISTS loans_customer_idx    ON loans(customer_id);
CREATE INDEX IF NOT EXISTS loans_branch_idx      ON loans(branch_id);
CREATE INDEX IF NOT EXISTS repayments_loan_idx   ON repayments(loan_id, payment_date);
CREATE INDEX IF NOT EXISTS daily_branch_date_idx ON daily_branch_performance(branch_id, date);

PRAGMA user_version = 1;
";

/// Tables in the order they are emptied by `clear`.
pub const TABLES: [&str; 10] = [
  "ai_customer_features",
  "fraud_signals",
  "officer_performance",
  "monthly_branch_summary",
  "daily_branch_performance",
  "repayments",
  "loans",
  "customers",
  "officers",
  "branches",
];
