//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::NaiveDate;
use kechita_core::{
  entity::{Branch, Customer, Officer},
  load::{Dataset, LoadOptions, load_dataset},
  loan::{Loan, LoanStatus, Repayment, RepaymentStatus},
  metrics::{self, BranchScope, DateWindow},
  performance::{DailyBranchPerformance, OfficerPerformance},
  risk::{AiCustomerFeatures, FraudSignal},
  store::{CustomerQuery, EntityStore, LoanQuery, PerformanceQuery, RowBatch},
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn date(s: &str) -> NaiveDate { s.parse().unwrap() }

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn branch(id: &str, region: &str) -> Branch {
  Branch {
    branch_id:   id.into(),
    branch_name: format!("{id} Market"),
    region:      region.into(),
    urban_rural: "Urban".into(),
    staff_count: 12,
    target_tier: "B".into(),
    latitude:    -1.2921,
    longitude:   36.8219,
  }
}

fn officer(id: &str, branch_id: &str) -> Officer {
  Officer {
    officer_id: id.into(),
    name:       format!("Officer {id}"),
    branch_id:  branch_id.into(),
    role:       "Loan Officer".into(),
  }
}

fn customer(id: &str, first: &str, last: &str, branch_id: &str, region: &str) -> Customer {
  Customer {
    customer_id:        id.into(),
    first_name:         first.into(),
    last_name:          last.into(),
    gender:             "F".into(),
    birth_year:         1988,
    national_id:        format!("NID{id}"),
    phone:              format!("07{}", &id[1..]),
    primary_branch:     branch_id.into(),
    region:             region.into(),
    business_type:      "Mama Mboga".into(),
    income_band:        "10-20k".into(),
    historical_cycles:  3,
    avg_weekly_cash:    dec!(4350.75),
    fraud_flag_initial: id == "C0000003",
  }
}

fn loan(id: &str, customer_id: &str, branch_id: &str, amount: Decimal, status: LoanStatus) -> Loan {
  Loan {
    loan_id:           id.into(),
    customer_id:       customer_id.into(),
    branch_id:         branch_id.into(),
    officer_id:        "OF000001".into(),
    disbursement_date: date("2025-01-06"),
    due_date:          date("2025-02-03"),
    amount,
    tenor_weeks:       4,
    daily_installment: dec!(357.142857),
    miss_rate:         0.05,
    rescheduled:       false,
    default_flag:      status == LoanStatus::Defaulted,
    status,
  }
}

fn repayment(loan_id: &str, day: &str, paid: Decimal, status: RepaymentStatus) -> Repayment {
  Repayment {
    repayment_id: Uuid::new_v4(),
    loan_id:      loan_id.into(),
    customer_id:  "C0000001".into(),
    branch_id:    "BR001".into(),
    payment_date: date(day),
    amount_paid:  paid,
    status,
  }
}

fn daily(day: &str, branch_id: &str, dues: Decimal, collected: Decimal) -> DailyBranchPerformance {
  DailyBranchPerformance {
    date:                 date(day),
    branch_id:            branch_id.into(),
    region:               String::new(),
    recruited_today:      3,
    disbursed_amount_ksh: dec!(15000.50),
    daily_dues_ksh:       dues,
    collected_ksh:        collected,
    missed_calls:         2,
    arrears_new_ksh:      dues - collected,
    par_percent:          4.25,
    daily_target_ksh:     dec!(50000),
  }
}

fn features(customer_id: &str, risk_score: f64) -> AiCustomerFeatures {
  AiCustomerFeatures {
    customer_id: customer_id.into(),
    primary_branch: "BR001".into(),
    avg_weekly_cash: dec!(4350.75),
    historical_cycles: 3,
    risk_score,
    default_prob: 0.31,
    churn_prob: 0.12,
    recommended_limit_ksh: dec!(25000),
  }
}

fn dataset() -> Dataset {
  let daily_performance = vec![
    daily("2025-01-01", "BR001", dec!(1000), dec!(800)),
    daily("2025-01-02", "BR001", dec!(2000), dec!(1900)),
    daily("2025-01-01", "BR002", dec!(500), dec!(500)),
    daily("2025-02-01", "BR002", dec!(500), dec!(250)),
  ];
  let branches = vec![branch("BR001", "Nairobi"), branch("BR002", "Coast")];
  Dataset {
    monthly_summaries: metrics::rollup_monthly(&branches, &daily_performance),
    branches,
    officers: vec![officer("OF000001", "BR001"), officer("OF000002", "BR002")],
    customers: vec![
      customer("C0000001", "Mercy", "Wanjiku", "BR001", "Nairobi"),
      customer("C0000002", "Otieno", "Ouma", "BR001", "Nairobi"),
      customer("C0000003", "Amina", "Hassan", "BR002", "Coast"),
    ],
    loans: vec![
      loan("L00000001", "C0000001", "BR001", dec!(10000), LoanStatus::Active),
      loan("L00000002", "C0000001", "BR001", dec!(8000), LoanStatus::Completed),
      loan("L00000003", "C0000003", "BR002", dec!(12000), LoanStatus::WrittenOff),
    ],
    repayments: vec![
      repayment("L00000001", "2025-01-08", dec!(357.14), RepaymentStatus::Paid),
      repayment("L00000001", "2025-01-07", dec!(0), RepaymentStatus::Missed),
      repayment("L00000002", "2025-01-07", dec!(200), RepaymentStatus::Partial),
    ],
    daily_performance,
    officer_performance: vec![OfficerPerformance {
      officer_id:           "OF000001".into(),
      branch_id:            "BR001".into(),
      month:                "2025-01".into(),
      loans_disbursed:      14,
      amount_disbursed_ksh: dec!(168000),
      collected_ksh:        dec!(2700),
      dues_ksh:             dec!(3000),
      par_percent:          4.25,
    }],
    fraud_signals: vec![FraudSignal {
      customer_id:                  "C0000003".into(),
      national_id_mismatch:         true,
      shared_phone_number:          true,
      distance_anomaly:             false,
      suspicious_repayment_pattern: false,
      synthetic_customer_score:     0.82,
    }],
    ai_features: vec![
      features("C0000001", 22.5),
      features("C0000002", 55.0),
      features("C0000003", 91.0),
    ],
  }
}

async fn loaded() -> SqliteStore {
  let s = store().await;
  load_dataset(&s, dataset(), LoadOptions::default())
    .await
    .expect("load dataset");
  s
}

// ─── Reference data ──────────────────────────────────────────────────────────

#[tokio::test]
async fn branches_round_trip_in_id_order() {
  let s = loaded().await;

  let branches = s.list_branches().await.unwrap();
  assert_eq!(branches, vec![branch("BR001", "Nairobi"), branch("BR002", "Coast")]);

  let one = s.get_branch("BR002").await.unwrap();
  assert_eq!(one.map(|b| b.region), Some("Coast".to_owned()));
}

#[tokio::test]
async fn missing_entities_are_none() {
  let s = loaded().await;
  assert!(s.get_branch("BR999").await.unwrap().is_none());
  assert!(s.get_customer("C9999999").await.unwrap().is_none());
  assert!(s.get_loan("L99999999").await.unwrap().is_none());
  assert!(s.get_ai_features("C9999999").await.unwrap().is_none());
  assert!(s.get_fraud_signal("C0000001").await.unwrap().is_none());
}

#[tokio::test]
async fn officers_filter_by_branch() {
  let s = loaded().await;
  assert_eq!(s.list_officers(None).await.unwrap().len(), 2);

  let coast = s.list_officers(Some("BR002")).await.unwrap();
  assert_eq!(coast, vec![officer("OF000002", "BR002")]);
}

#[tokio::test]
async fn customer_round_trip_keeps_decimals_and_flags() {
  let s = loaded().await;
  let c = s.get_customer("C0000003").await.unwrap().unwrap();
  assert_eq!(c, customer("C0000003", "Amina", "Hassan", "BR002", "Coast"));
  assert!(c.fraud_flag_initial);
  assert_eq!(c.avg_weekly_cash, dec!(4350.75));
}

#[tokio::test]
async fn customer_query_filters_and_pages() {
  let s = loaded().await;

  let by_branch = s
    .list_customers(&CustomerQuery {
      branch_id: Some("BR001".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(by_branch.len(), 2);

  let by_text = s
    .list_customers(&CustomerQuery {
      text: Some("amina h".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(by_text.len(), 1);
  assert_eq!(by_text[0].customer_id, "C0000003");

  let by_region = s
    .list_customers(&CustomerQuery {
      region: Some("Nairobi".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(by_region.len(), 2);

  let page = s
    .list_customers(&CustomerQuery {
      limit: Some(1),
      offset: Some(1),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(page.len(), 1);
  assert_eq!(page[0].customer_id, "C0000002");
}

// ─── Loans ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn loans_filter_by_customer_and_status() {
  let s = loaded().await;

  let mine = s
    .list_loans(&LoanQuery {
      customer_id: Some("C0000001".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(mine.len(), 2);

  let written_off = s
    .list_loans(&LoanQuery {
      status: Some(LoanStatus::WrittenOff),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(written_off.len(), 1);
  assert_eq!(written_off[0].loan_id, "L00000003");

  let loan = s.get_loan("L00000001").await.unwrap().unwrap();
  assert_eq!(loan.amount, dec!(10000));
  assert_eq!(loan.daily_installment, dec!(357.142857));
  assert_eq!(loan.due_date, date("2025-02-03"));
}

#[tokio::test]
async fn repayments_come_back_oldest_first() {
  let s = loaded().await;
  let repayments = s.list_repayments("L00000001").await.unwrap();
  assert_eq!(repayments.len(), 2);
  assert_eq!(repayments[0].status, RepaymentStatus::Missed);
  assert_eq!(repayments[1].amount_paid, dec!(357.14));
}

// ─── Performance ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn daily_window_is_inclusive() {
  let s = loaded().await;

  let all = s
    .list_daily_performance(&PerformanceQuery::default())
    .await
    .unwrap();
  assert_eq!(all.len(), 4);
  assert_eq!(all[0].date, date("2025-01-01"));
  assert_eq!(all[0].branch_id, "BR001");

  let january = s
    .list_daily_performance(&PerformanceQuery {
      branch_id: None,
      window:    DateWindow::new(Some(date("2025-01-01")), Some(date("2025-01-02"))).unwrap(),
    })
    .await
    .unwrap();
  assert_eq!(january.len(), 3);

  let coast = s
    .list_daily_performance(&PerformanceQuery {
      branch_id: Some("BR002".into()),
      window:    DateWindow::new(Some(date("2025-02-01")), None).unwrap(),
    })
    .await
    .unwrap();
  assert_eq!(coast.len(), 1);
  assert_eq!(coast[0].collected_ksh, dec!(250));
}

#[tokio::test]
async fn monthly_cache_matches_daily_rows() {
  let s = loaded().await;
  let cached = s.list_monthly_summaries(None).await.unwrap();
  let daily = s
    .list_daily_performance(&PerformanceQuery::default())
    .await
    .unwrap();

  let branches = s.list_branches().await.unwrap();

  assert_eq!(cached.len(), 3);
  assert!(metrics::monthly_drift(&branches, &cached, &daily).is_empty());
  assert_eq!(s.list_monthly_summaries(Some("BR002")).await.unwrap().len(), 2);
}

#[tokio::test]
async fn officer_performance_filters_by_branch() {
  let s = loaded().await;
  assert_eq!(s.list_officer_performance(None).await.unwrap().len(), 1);
  assert!(s.list_officer_performance(Some("BR002")).await.unwrap().is_empty());
}

#[tokio::test]
async fn risk_rows_round_trip() {
  let s = loaded().await;
  let signal = s.get_fraud_signal("C0000003").await.unwrap().unwrap();
  assert_eq!(signal.indicator_count(), 2);

  let f = s.get_ai_features("C0000002").await.unwrap().unwrap();
  assert_eq!(f, features("C0000002", 55.0));
  assert_eq!(s.list_ai_features().await.unwrap().len(), 3);
}

// ─── Loader ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn loader_issues_ceiling_batches() {
  let s = store().await;
  let report = load_dataset(&s, dataset(), LoadOptions {
    batch_size: 2,
    ..LoadOptions::default()
  })
  .await
  .unwrap();

  let daily = report
    .tables
    .iter()
    .find(|t| t.table == "daily_branch_performance")
    .unwrap();
  assert_eq!((daily.rows, daily.batches), (4, 2));

  let customers = report.tables.iter().find(|t| t.table == "customers").unwrap();
  assert_eq!((customers.rows, customers.batches), (3, 2));

  let officer_perf = report
    .tables
    .iter()
    .find(|t| t.table == "officer_performance")
    .unwrap();
  assert_eq!(officer_perf.batches, 1);
}

#[tokio::test]
async fn failed_batch_stops_the_rest_of_its_table() {
  let s = store().await;
  let mut data = dataset();
  data.customers = vec![
    customer("C0000001", "Mercy", "Wanjiku", "BR001", "Nairobi"),
    customer("C0000002", "Otieno", "Ouma", "BR001", "Nairobi"),
    customer("C0000003", "Amina", "Hassan", "BR002", "Coast"),
    customer("C0000003", "Amina", "Hassan", "BR002", "Coast"),
    customer("C0000005", "Wairimu", "Njeri", "BR002", "Coast"),
  ];

  let err = load_dataset(&s, data, LoadOptions {
    batch_size: 2,
    ..LoadOptions::default()
  })
  .await
  .unwrap_err();

  match err {
    kechita_core::Error::Load {
      table,
      batch,
      rows_written,
      ..
    } => {
      assert_eq!(table, "customers");
      assert_eq!(batch, 2);
      assert_eq!(rows_written, 2);
    }
    other => panic!("expected a load error, got {other:?}"),
  }

  let customers = s.list_customers(&CustomerQuery::default()).await.unwrap();
  let ids: Vec<&str> = customers.iter().map(|c| c.customer_id.as_str()).collect();
  assert_eq!(ids, ["C0000001", "C0000002"]);

  // Tables before the failure are kept; tables after it were never written.
  assert_eq!(s.list_branches().await.unwrap().len(), 2);
  assert!(s.list_loans(&LoanQuery::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn reload_replaces_previous_contents() {
  let s = loaded().await;
  let mut data = dataset();
  data.branches.truncate(1);
  data.customers.clear();

  load_dataset(&s, data, LoadOptions::default()).await.unwrap();
  assert_eq!(s.list_branches().await.unwrap().len(), 1);
  assert!(s.list_customers(&CustomerQuery::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn derive_monthly_replaces_a_stale_cache() {
  let s = store().await;
  let mut data = dataset();
  data.monthly_summaries[0].collected_monthly_ksh = dec!(1);

  load_dataset(&s, data, LoadOptions {
    derive_monthly: true,
    ..Default::default()
  })
  .await
  .unwrap();

  let cached = s.list_monthly_summaries(None).await.unwrap();
  let daily = s
    .list_daily_performance(&PerformanceQuery::default())
    .await
    .unwrap();
  let branches = s.list_branches().await.unwrap();
  assert!(metrics::monthly_drift(&branches, &cached, &daily).is_empty());
}

#[tokio::test]
async fn derived_months_skip_rows_of_unknown_branches() {
  let s = store().await;
  let mut data = dataset();
  data.daily_performance.push(daily("2025-01-03", "BR999", dec!(700), dec!(0)));

  load_dataset(&s, data, LoadOptions {
    derive_monthly: true,
    ..Default::default()
  })
  .await
  .unwrap();

  let cached = s.list_monthly_summaries(None).await.unwrap();
  assert_eq!(cached.len(), 3);
  assert!(cached.iter().all(|m| m.branch_id != "BR999"));
  let jan = &cached[0];
  assert_eq!((jan.branch_id.as_str(), jan.month.as_str()), ("BR001", "2025-01"));
  assert_eq!(jan.dues_monthly_ksh, dec!(3000));
}

#[tokio::test]
async fn empty_dataset_leaves_the_store_untouched() {
  let s = loaded().await;

  let err = load_dataset(&s, Dataset::default(), LoadOptions::default())
    .await
    .unwrap_err();
  assert!(matches!(err, kechita_core::Error::EmptyDataset));
  assert_eq!(s.list_branches().await.unwrap().len(), 2);
  assert_eq!(s.list_customers(&CustomerQuery::default()).await.unwrap().len(), 3);
}

#[tokio::test]
async fn empty_dataset_clears_the_store_when_allowed() {
  let s = loaded().await;

  let report = load_dataset(&s, Dataset::default(), LoadOptions {
    allow_empty: true,
    ..LoadOptions::default()
  })
  .await
  .unwrap();
  assert_eq!(report.total_rows(), 0);
  assert!(s.list_branches().await.unwrap().is_empty());
}

#[tokio::test]
async fn insert_batch_is_atomic() {
  let s = store().await;
  let batch = RowBatch::Branches(vec![
    branch("BR001", "Nairobi"),
    branch("BR002", "Coast"),
    branch("BR001", "Nairobi"),
  ]);
  assert!(s.insert_batch(batch).await.is_err());
  assert!(s.list_branches().await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_batch_is_a_no_op() {
  let s = loaded().await;
  let batch = RowBatch::Loans(Vec::new());
  assert!(batch.is_empty());
  s.insert_batch(batch).await.unwrap();
  assert_eq!(s.list_loans(&LoanQuery::default()).await.unwrap().len(), 3);
}

// ─── Aggregation over stored rows ────────────────────────────────────────────

#[tokio::test]
async fn branch_performance_over_stored_rows() {
  let s = loaded().await;
  let branches = s.list_branches().await.unwrap();
  let rows = s
    .list_daily_performance(&PerformanceQuery::default())
    .await
    .unwrap();

  let perf = metrics::aggregate_branch_performance(
    &BranchScope::Branch("BR001".into()),
    &branches,
    &rows,
    &DateWindow::ALL_TIME,
  );
  assert_eq!(perf[0].collection_rate, 90.0);
  assert_eq!(perf[0].sum_disbursed, dec!(30001));

  let loans = s.list_loans(&LoanQuery::default()).await.unwrap();
  let customers = s.list_customers(&CustomerQuery::default()).await.unwrap();
  let features = s.list_ai_features().await.unwrap();
  let summary = metrics::dashboard_summary(&loans, &rows, &branches, &customers, &features);
  assert_eq!(summary.total_disbursed, dec!(10000));
  assert_eq!(summary.active_customers, 1);
  assert_eq!(summary.alerts.len(), 2);
  assert_eq!(summary.alerts[0].customer_id, "C0000003");
}
