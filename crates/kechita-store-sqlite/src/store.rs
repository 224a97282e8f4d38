//! [`SqliteStore`]: the SQLite implementation of [`EntityStore`].

use std::path::Path;

use rusqlite::{OptionalExtension as _, Transaction, params, params_from_iter};

use kechita_core::{
  entity::{Branch, Customer, Officer},
  loan::{Loan, Repayment},
  performance::{DailyBranchPerformance, MonthlyBranchSummary, OfficerPerformance},
  risk::{AiCustomerFeatures, FraudSignal},
  store::{CustomerQuery, EntityStore, LoanQuery, PerformanceQuery, RowBatch},
};

use crate::{
  Result,
  encode::{
    BRANCH_COLUMNS, CUSTOMER_COLUMNS, DAILY_COLUMNS, FEATURE_COLUMNS, FRAUD_COLUMNS,
    LOAN_COLUMNS, MONTHLY_COLUMNS, OFFICER_COLUMNS, OFFICER_PERF_COLUMNS, REPAYMENT_COLUMNS,
    RawCustomer, RawDaily, RawFeatures, RawLoan, RawMonthly, RawOfficerPerformance,
    RawRepayment, branch_from_row, encode_date, encode_decimal, encode_loan_status,
    encode_repayment_status, encode_uuid, fraud_signal_from_row, officer_from_row,
  },
  schema::{SCHEMA, TABLES},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Kechita entity store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `sql` with positional text parameters and map every row with `f`.
  async fn query_all<T, F>(&self, sql: String, args: Vec<Option<String>>, f: F) -> Result<Vec<T>>
  where
    T: Send + 'static,
    F: Fn(&rusqlite::Row<'_>) -> rusqlite::Result<T> + Send + 'static,
  {
    Ok(
      self
        .conn
        .call(move |conn| {
          let mut stmt = conn.prepare(&sql)?;
          let rows = stmt
            .query_map(params_from_iter(args), |row| f(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?,
    )
  }

  /// Run `sql` with one text parameter and map at most one row with `f`.
  async fn query_one<T, F>(&self, sql: String, param: String, f: F) -> Result<Option<T>>
  where
    T: Send + 'static,
    F: Fn(&rusqlite::Row<'_>) -> rusqlite::Result<T> + Send + 'static,
  {
    Ok(
      self
        .conn
        .call(move |conn| Ok(conn.query_row(&sql, params![param], |row| f(row)).optional()?))
        .await?,
    )
  }
}

// ─── Batch writes ────────────────────────────────────────────────────────────

fn write_batch(tx: &Transaction<'_>, batch: &RowBatch) -> rusqlite::Result<()> {
  match batch {
    RowBatch::Branches(rows) => insert_branches(tx, rows),
    RowBatch::Officers(rows) => insert_officers(tx, rows),
    RowBatch::Customers(rows) => insert_customers(tx, rows),
    RowBatch::Loans(rows) => insert_loans(tx, rows),
    RowBatch::Repayments(rows) => insert_repayments(tx, rows),
    RowBatch::DailyPerformance(rows) => insert_daily(tx, rows),
    RowBatch::MonthlySummaries(rows) => insert_monthly(tx, rows),
    RowBatch::OfficerPerformance(rows) => insert_officer_performance(tx, rows),
    RowBatch::FraudSignals(rows) => insert_fraud_signals(tx, rows),
    RowBatch::AiFeatures(rows) => insert_features(tx, rows),
  }
}

fn insert_branches(tx: &Transaction<'_>, rows: &[Branch]) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare(&format!(
    "INSERT INTO branches ({BRANCH_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
  ))?;
  for b in rows {
    stmt.execute(params![
      b.branch_id,
      b.branch_name,
      b.region,
      b.urban_rural,
      b.staff_count,
      b.target_tier,
      b.latitude,
      b.longitude,
    ])?;
  }
  Ok(())
}

fn insert_officers(tx: &Transaction<'_>, rows: &[Officer]) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare(&format!(
    "INSERT INTO officers ({OFFICER_COLUMNS}) VALUES (?1, ?2, ?3, ?4)"
  ))?;
  for o in rows {
    stmt.execute(params![o.officer_id, o.name, o.branch_id, o.role])?;
  }
  Ok(())
}

fn insert_customers(tx: &Transaction<'_>, rows: &[Customer]) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare(&format!(
    "INSERT INTO customers ({CUSTOMER_COLUMNS})
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
  ))?;
  for c in rows {
    stmt.execute(params![
      c.customer_id,
      c.first_name,
      c.last_name,
      c.gender,
      c.birth_year,
      c.national_id,
      c.phone,
      c.primary_branch,
      c.region,
      c.business_type,
      c.income_band,
      c.historical_cycles,
      encode_decimal(c.avg_weekly_cash),
      c.fraud_flag_initial,
    ])?;
  }
  Ok(())
}

fn insert_loans(tx: &Transaction<'_>, rows: &[Loan]) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare(&format!(
    "INSERT INTO loans ({LOAN_COLUMNS})
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
  ))?;
  for l in rows {
    stmt.execute(params![
      l.loan_id,
      l.customer_id,
      l.branch_id,
      l.officer_id,
      encode_date(l.disbursement_date),
      encode_date(l.due_date),
      encode_decimal(l.amount),
      l.tenor_weeks,
      encode_decimal(l.daily_installment),
      l.miss_rate,
      l.rescheduled,
      l.default_flag,
      encode_loan_status(l.status),
    ])?;
  }
  Ok(())
}

fn insert_repayments(tx: &Transaction<'_>, rows: &[Repayment]) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare(&format!(
    "INSERT INTO repayments ({REPAYMENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
  ))?;
  for r in rows {
    stmt.execute(params![
      encode_uuid(r.repayment_id),
      r.loan_id,
      r.customer_id,
      r.branch_id,
      encode_date(r.payment_date),
      encode_decimal(r.amount_paid),
      encode_repayment_status(r.status),
    ])?;
  }
  Ok(())
}

fn insert_daily(tx: &Transaction<'_>, rows: &[DailyBranchPerformance]) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare(&format!(
    "INSERT INTO daily_branch_performance ({DAILY_COLUMNS})
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
  ))?;
  for d in rows {
    stmt.execute(params![
      encode_date(d.date),
      d.branch_id,
      d.region,
      d.recruited_today,
      encode_decimal(d.disbursed_amount_ksh),
      encode_decimal(d.daily_dues_ksh),
      encode_decimal(d.collected_ksh),
      d.missed_calls,
      encode_decimal(d.arrears_new_ksh),
      d.par_percent,
      encode_decimal(d.daily_target_ksh),
    ])?;
  }
  Ok(())
}

fn insert_monthly(tx: &Transaction<'_>, rows: &[MonthlyBranchSummary]) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare(&format!(
    "INSERT INTO monthly_branch_summary ({MONTHLY_COLUMNS})
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
  ))?;
  for m in rows {
    stmt.execute(params![
      m.branch_id,
      m.month,
      i64::try_from(m.recruited_monthly).unwrap_or(i64::MAX),
      encode_decimal(m.disbursed_monthly_ksh),
      encode_decimal(m.dues_monthly_ksh),
      encode_decimal(m.collected_monthly_ksh),
      encode_decimal(m.arrears_monthly_ksh),
      m.avg_par_percent,
    ])?;
  }
  Ok(())
}

fn insert_officer_performance(
  tx: &Transaction<'_>,
  rows: &[OfficerPerformance],
) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare(&format!(
    "INSERT INTO officer_performance ({OFFICER_PERF_COLUMNS})
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
  ))?;
  for o in rows {
    stmt.execute(params![
      o.officer_id,
      o.branch_id,
      o.month,
      o.loans_disbursed,
      encode_decimal(o.amount_disbursed_ksh),
      encode_decimal(o.collected_ksh),
      encode_decimal(o.dues_ksh),
      o.par_percent,
    ])?;
  }
  Ok(())
}

fn insert_fraud_signals(tx: &Transaction<'_>, rows: &[FraudSignal]) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare(&format!(
    "INSERT INTO fraud_signals ({FRAUD_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
  ))?;
  for f in rows {
    stmt.execute(params![
      f.customer_id,
      f.national_id_mismatch,
      f.shared_phone_number,
      f.distance_anomaly,
      f.suspicious_repayment_pattern,
      f.synthetic_customer_score,
    ])?;
  }
  Ok(())
}

fn insert_features(tx: &Transaction<'_>, rows: &[AiCustomerFeatures]) -> rusqlite::Result<()> {
  let mut stmt = tx.prepare(&format!(
    "INSERT INTO ai_customer_features ({FEATURE_COLUMNS})
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
  ))?;
  for f in rows {
    stmt.execute(params![
      f.customer_id,
      f.primary_branch,
      encode_decimal(f.avg_weekly_cash),
      f.historical_cycles,
      f.risk_score,
      f.default_prob,
      f.churn_prob,
      encode_decimal(f.recommended_limit_ksh),
    ])?;
  }
  Ok(())
}

// ─── EntityStore impl ────────────────────────────────────────────────────────

impl EntityStore for SqliteStore {
  type Error = crate::Error;

  // ── Reference data ────────────────────────────────────────────────────────

  async fn list_branches(&self) -> Result<Vec<Branch>> {
    self
      .query_all(
        format!("SELECT {BRANCH_COLUMNS} FROM branches ORDER BY branch_id"),
        vec![],
        branch_from_row,
      )
      .await
  }

  async fn get_branch(&self, branch_id: &str) -> Result<Option<Branch>> {
    self
      .query_one(
        format!("SELECT {BRANCH_COLUMNS} FROM branches WHERE branch_id = ?1"),
        branch_id.to_owned(),
        branch_from_row,
      )
      .await
  }

  async fn list_officers(&self, branch_id: Option<&str>) -> Result<Vec<Officer>> {
    self
      .query_all(
        format!(
          "SELECT {OFFICER_COLUMNS} FROM officers
           WHERE ?1 IS NULL OR branch_id = ?1
           ORDER BY officer_id"
        ),
        vec![branch_id.map(str::to_owned)],
        officer_from_row,
      )
      .await
  }

  async fn list_customers(&self, query: &CustomerQuery) -> Result<Vec<Customer>> {
    let branch_id = query.branch_id.clone();
    let region = query.region.clone();
    let pattern = query
      .text
      .as_deref()
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .map(|t| format!("%{t}%"));
    // SQLite treats a negative LIMIT as "no limit".
    let limit = query
      .limit
      .map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
    let offset = query
      .offset
      .map_or(0, |o| i64::try_from(o).unwrap_or(i64::MAX));

    let raws: Vec<RawCustomer> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CUSTOMER_COLUMNS} FROM customers
           WHERE (?1 IS NULL OR primary_branch = ?1)
             AND (?2 IS NULL OR region = ?2)
             AND (?3 IS NULL
                  OR customer_id LIKE ?3
                  OR first_name  LIKE ?3
                  OR last_name   LIKE ?3
                  OR (first_name || ' ' || last_name) LIKE ?3
                  OR phone       LIKE ?3
                  OR national_id LIKE ?3)
           ORDER BY customer_id
           LIMIT ?4 OFFSET ?5"
        ))?;
        let rows = stmt
          .query_map(
            params![branch_id, region, pattern, limit, offset],
            RawCustomer::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCustomer::into_customer).collect()
  }

  async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>> {
    self
      .query_one(
        format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE customer_id = ?1"),
        customer_id.to_owned(),
        RawCustomer::from_row,
      )
      .await?
      .map(RawCustomer::into_customer)
      .transpose()
  }

  // ── Loans ─────────────────────────────────────────────────────────────────

  async fn list_loans(&self, query: &LoanQuery) -> Result<Vec<Loan>> {
    let customer_id = query.customer_id.clone();
    let branch_id = query.branch_id.clone();
    let status = query.status.map(encode_loan_status);

    let raws: Vec<RawLoan> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {LOAN_COLUMNS} FROM loans
           WHERE (?1 IS NULL OR customer_id = ?1)
             AND (?2 IS NULL OR branch_id = ?2)
             AND (?3 IS NULL OR status = ?3)
           ORDER BY loan_id"
        ))?;
        let rows = stmt
          .query_map(params![customer_id, branch_id, status], RawLoan::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawLoan::into_loan).collect()
  }

  async fn get_loan(&self, loan_id: &str) -> Result<Option<Loan>> {
    self
      .query_one(
        format!("SELECT {LOAN_COLUMNS} FROM loans WHERE loan_id = ?1"),
        loan_id.to_owned(),
        RawLoan::from_row,
      )
      .await?
      .map(RawLoan::into_loan)
      .transpose()
  }

  async fn list_repayments(&self, loan_id: &str) -> Result<Vec<Repayment>> {
    self
      .query_all(
        format!(
          "SELECT {REPAYMENT_COLUMNS} FROM repayments
           WHERE loan_id = ?1
           ORDER BY payment_date, repayment_id"
        ),
        vec![Some(loan_id.to_owned())],
        RawRepayment::from_row,
      )
      .await?
      .into_iter()
      .map(RawRepayment::into_repayment)
      .collect()
  }

  // ── Performance snapshots ─────────────────────────────────────────────────

  async fn list_daily_performance(
    &self,
    query: &PerformanceQuery,
  ) -> Result<Vec<DailyBranchPerformance>> {
    let branch_id = query.branch_id.clone();
    let from = query.window.from.map(encode_date);
    let to = query.window.to.map(encode_date);

    let raws: Vec<RawDaily> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {DAILY_COLUMNS} FROM daily_branch_performance
           WHERE (?1 IS NULL OR branch_id = ?1)
             AND (?2 IS NULL OR date >= ?2)
             AND (?3 IS NULL OR date <= ?3)
           ORDER BY date, branch_id"
        ))?;
        let rows = stmt
          .query_map(params![branch_id, from, to], RawDaily::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDaily::into_daily).collect()
  }

  async fn list_monthly_summaries(
    &self,
    branch_id: Option<&str>,
  ) -> Result<Vec<MonthlyBranchSummary>> {
    self
      .query_all(
        format!(
          "SELECT {MONTHLY_COLUMNS} FROM monthly_branch_summary
           WHERE ?1 IS NULL OR branch_id = ?1
           ORDER BY branch_id, month"
        ),
        vec![branch_id.map(str::to_owned)],
        RawMonthly::from_row,
      )
      .await?
      .into_iter()
      .map(RawMonthly::into_monthly)
      .collect()
  }

  async fn list_officer_performance(
    &self,
    branch_id: Option<&str>,
  ) -> Result<Vec<OfficerPerformance>> {
    self
      .query_all(
        format!(
          "SELECT {OFFICER_PERF_COLUMNS} FROM officer_performance
           WHERE ?1 IS NULL OR branch_id = ?1
           ORDER BY officer_id, month"
        ),
        vec![branch_id.map(str::to_owned)],
        RawOfficerPerformance::from_row,
      )
      .await?
      .into_iter()
      .map(RawOfficerPerformance::into_officer_performance)
      .collect()
  }

  // ── Risk ──────────────────────────────────────────────────────────────────

  async fn list_ai_features(&self) -> Result<Vec<AiCustomerFeatures>> {
    self
      .query_all(
        format!("SELECT {FEATURE_COLUMNS} FROM ai_customer_features ORDER BY customer_id"),
        vec![],
        RawFeatures::from_row,
      )
      .await?
      .into_iter()
      .map(RawFeatures::into_features)
      .collect()
  }

  async fn get_ai_features(&self, customer_id: &str) -> Result<Option<AiCustomerFeatures>> {
    self
      .query_one(
        format!("SELECT {FEATURE_COLUMNS} FROM ai_customer_features WHERE customer_id = ?1"),
        customer_id.to_owned(),
        RawFeatures::from_row,
      )
      .await?
      .map(RawFeatures::into_features)
      .transpose()
  }

  async fn get_fraud_signal(&self, customer_id: &str) -> Result<Option<FraudSignal>> {
    self
      .query_one(
        format!("SELECT {FRAUD_COLUMNS} FROM fraud_signals WHERE customer_id = ?1"),
        customer_id.to_owned(),
        fraud_signal_from_row,
      )
      .await
  }

  // ── Loading ───────────────────────────────────────────────────────────────

  async fn clear(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        for table in TABLES {
          tx.execute(&format!("DELETE FROM {table}"), [])?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn insert_batch(&self, batch: RowBatch) -> Result<()> {
    if batch.is_empty() {
      return Ok(());
    }
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        write_batch(&tx, &batch)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
