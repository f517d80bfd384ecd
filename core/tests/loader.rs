//! Ledger loader: header-driven CSV parsing and fail-fast validation.

use chrono::NaiveDate;
use ledgerscope_core::{
    error::PipelineError,
    export::write_ledger,
    generator::{generate_ledger, GeneratorConfig},
    loader::{load_customers, load_ledger, load_transactions},
};

const TXN_HEADER: &str = "transaction_id,customer_id,transaction_date,amount,category,region\n";

fn load_txns(body: &str) -> Result<Vec<ledgerscope_core::ledger::Transaction>, PipelineError> {
    load_transactions(format!("{TXN_HEADER}{body}").as_bytes())
}

/// Columns are found by name, in any order, and extras are ignored.
#[test]
fn columns_are_located_by_name() {
    let csv = "region,amount,note,transaction_date,category,customer_id,transaction_id\n\
               West,12.50,hello,2024-01-02 10:15:00,Grocery,7,100\n";
    let txns = load_transactions(csv.as_bytes()).unwrap();

    assert_eq!(txns.len(), 1);
    let t = &txns[0];
    assert_eq!(t.transaction_id, 100);
    assert_eq!(t.customer_id, 7);
    assert_eq!(t.amount, 12.5);
    assert_eq!(t.category, "Grocery");
    assert_eq!(t.region, "West");
    assert_eq!(t.transaction_date.to_string(), "2024-01-02 10:15:00");
}

/// A missing required column names the table and the column.
#[test]
fn missing_column_is_reported() {
    let csv = "transaction_id,customer_id,transaction_date,category,region\n1,1,2024-01-01,Fuel,West\n";
    let err = load_transactions(csv.as_bytes()).unwrap_err();
    match &err {
        PipelineError::MissingColumn { table, column } => {
            assert_eq!(table, "transactions");
            assert_eq!(column, "amount");
        }
        other => panic!("expected MissingColumn, got {other:?}"),
    }
    assert!(err.to_string().contains("amount"), "message should name the column: {err}");
}

/// Non-numeric amounts fail with the row number.
#[test]
fn non_numeric_amount_is_reported() {
    let err = load_txns("1,1,2024-01-01,10.00,Fuel,West\n2,1,2024-01-02,abc,Fuel,West\n").unwrap_err();
    match err {
        PipelineError::InvalidNumber { column, row, value, .. } => {
            assert_eq!(column, "amount");
            assert_eq!(row, 2);
            assert_eq!(value, "abc");
        }
        other => panic!("expected InvalidNumber, got {other:?}"),
    }
}

/// Unparseable dates fail before any engine runs.
#[test]
fn bad_date_is_reported() {
    let err = load_txns("1,1,01/02/2024,10.00,Fuel,West\n").unwrap_err();
    assert!(
        matches!(err, PipelineError::InvalidDate { ref column, row: 1, .. } if column == "transaction_date"),
        "got {err:?}"
    );
}

#[test]
fn negative_amount_is_rejected() {
    let err = load_txns("1,1,2024-01-01,-5.00,Fuel,West\n").unwrap_err();
    assert!(matches!(err, PipelineError::NegativeAmount { row: 1, .. }), "got {err:?}");
}

#[test]
fn duplicate_transaction_id_is_rejected() {
    let err = load_txns("1,1,2024-01-01,5.00,Fuel,West\n1,2,2024-01-02,6.00,Fuel,West\n").unwrap_err();
    assert!(matches!(err, PipelineError::DuplicateKey { .. }), "got {err:?}");
}

/// Customers need only an id and a signup date.
#[test]
fn customers_with_minimal_columns() {
    let csv = "signup_date,customer_id\n2023-05-01,1\n2023-06-01,2\n";
    let customers = load_customers(csv.as_bytes()).unwrap();
    assert_eq!(customers.len(), 2);
    assert_eq!(customers[1].signup_date, NaiveDate::from_ymd_opt(2023, 6, 1).unwrap());
    assert!(customers[0].name.is_none() && customers[0].age.is_none());
}

#[test]
fn duplicate_customer_id_is_rejected() {
    let csv = "customer_id,signup_date\n3,2023-05-01\n3,2023-06-01\n";
    let err = load_customers(csv.as_bytes()).unwrap_err();
    assert!(matches!(err, PipelineError::DuplicateKey { ref key, .. } if key == "3"), "got {err:?}");
}

#[test]
fn non_numeric_age_is_rejected() {
    let csv = "customer_id,signup_date,age\n1,2023-05-01,thirty\n";
    let err = load_customers(csv.as_bytes()).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidNumber { ref column, .. } if column == "age"));
}

/// A generated ledger written to disk loads back unchanged.
#[test]
fn written_ledger_loads_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = GeneratorConfig::new(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
    config.customers = 40;
    let ledger = generate_ledger(&config);

    write_ledger(dir.path(), &ledger).expect("write ledger");
    let loaded = load_ledger(dir.path()).expect("load ledger");

    assert_eq!(loaded, ledger);
}

/// A missing file is an I/O error, not a panic.
#[test]
fn missing_directory_is_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = load_ledger(dir.path().join("nope")).unwrap_err();
    assert!(matches!(err, PipelineError::Io(_)), "got {err:?}");
}
