use ecommerce_pipeline::error::PipelineError;
use ecommerce_pipeline::loader::DatasetLoader;
use ecommerce_pipeline::models::{OrderStatus, SourceTable, StatusFilter};
use ecommerce_pipeline::pipeline::{TableSource, build_unified_table};
use ecommerce_pipeline::processor::{PreprocessOptions, Preprocessor};
use ecommerce_pipeline::storage::{OutputFormat, TableWriter};
use ecommerce_pipeline::views::{ViewsConfig, build_report};
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const ORDERS: &str = "\
order_id,customer_id,order_status,order_purchase_timestamp,order_approved_at,order_delivered_carrier_date,order_delivered_customer_date,order_estimated_delivery_date
1,C1,delivered,2017-01-01 00:00:00,2017-01-01 10:00:00,2017-01-03 00:00:00,2017-01-11 00:00:00,2017-01-20 00:00:00
2,C2,canceled,2017-02-01 00:00:00,,,,2017-02-20 00:00:00
3,C3,delivered,2017-04-02 09:00:00,2017-04-02 10:00:00,,2017-04-06 08:00:00,2017-04-20 00:00:00
";

const ORDER_ITEMS: &str = "\
order_id,order_item_id,product_id,seller_id,price
1,1,P1,S1,90.0
2,1,P2,S1,40.0
3,1,P2,S1,25.0
";

const ORDER_PAYMENTS: &str = "\
order_id,payment_sequential,payment_type,payment_value
1,1,credit_card,100.0
2,1,boleto,50.0
3,1,voucher,10.0
3,2,credit_card,20.0
";

const CUSTOMERS: &str = "\
customer_id,customer_unique_id,customer_city
C1,U1,sao paulo
C2,U2,rio de janeiro
C3,U3,curitiba
";

const PRODUCTS: &str = "\
product_id,product_category_name,product_weight_g
P1,,500
P2,beleza_saude,
";

const SELLERS: &str = "\
seller_id,seller_city
S1,campinas
";

const ORDER_REVIEWS: &str = "\
review_id,order_id,review_score
R1,3,5
R2,3,1
R3,2,1
";

const TRANSLATIONS: &str = "\
product_category_name,product_category_name_english
beleza_saude,health_beauty
";

struct Fixture {
    dir: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = std::env::temp_dir().join(format!("ecom-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let files = [
            (SourceTable::Orders, ORDERS),
            (SourceTable::OrderItems, ORDER_ITEMS),
            (SourceTable::OrderPayments, ORDER_PAYMENTS),
            (SourceTable::Customers, CUSTOMERS),
            (SourceTable::Products, PRODUCTS),
            (SourceTable::Sellers, SELLERS),
            (SourceTable::OrderReviews, ORDER_REVIEWS),
            (SourceTable::CategoryTranslation, TRANSLATIONS),
        ];
        for (table, content) in files {
            fs::write(dir.join(table.file_name()), content).unwrap();
        }
        Self { dir }
    }

    fn path(&self) -> &Path {
        &self.dir
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.dir);
    }
}

fn read_csv(path: &Path) -> DataFrame {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .unwrap()
        .finish()
        .unwrap()
}

fn column_strings(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    df.column(name)
        .unwrap()
        .cast(&DataType::String)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

#[test]
fn test_export_writes_delivered_orders_only() {
    let fixture = Fixture::new();
    let unified = build_unified_table(
        TableSource::Directory(fixture.path().to_path_buf()),
        StatusFilter::delivered(),
        PreprocessOptions::default(),
    )
    .unwrap();

    let output = fixture.path().join("out").join("merged_data.csv");
    TableWriter::new(OutputFormat::Csv)
        .write(&unified.frame, &output)
        .unwrap();

    let text = fs::read_to_string(&output).unwrap();
    let header = text.lines().next().unwrap();
    assert!(header.starts_with("order_id,"));
    assert!(header.contains("delivery_duration_days"));
    assert!(!header.contains("product_category_name_english"));
    assert!(text.contains("2017-01-11 00:00:00"));

    let written = read_csv(&output);
    // order 1 once, order 3 once per payment
    assert_eq!(written.height(), 3);

    let order_ids = column_strings(&written, "order_id");
    assert!(order_ids.iter().all(|id| id.as_deref() != Some("2")));

    let statuses = column_strings(&written, "order_status");
    assert!(statuses.iter().all(|s| s.as_deref() == Some("delivered")));
}

#[test]
fn test_single_order_scenario() {
    let fixture = Fixture::new();
    let unified = build_unified_table(
        TableSource::Directory(fixture.path().to_path_buf()),
        StatusFilter::delivered(),
        PreprocessOptions::default(),
    )
    .unwrap();
    let frame = &unified.frame;

    let order_ids = column_strings(frame, "order_id");
    let row = order_ids
        .iter()
        .position(|id| id.as_deref() == Some("1"))
        .unwrap();

    let categories = column_strings(frame, "product_category_name");
    assert_eq!(categories[row].as_deref(), Some("unknown_category"));

    let durations = frame
        .column("delivery_duration_days")
        .unwrap()
        .cast(&DataType::Int64)
        .unwrap();
    assert_eq!(durations.i64().unwrap().get(row), Some(10));

    let payments = frame
        .column("payment_value")
        .unwrap()
        .cast(&DataType::Float64)
        .unwrap();
    assert_eq!(payments.f64().unwrap().get(row), Some(100.0));

    let reviews = column_strings(frame, "review_id");
    assert_eq!(reviews[row], None);

    for (i, id) in order_ids.iter().enumerate() {
        if id.as_deref() == Some("3") {
            assert_eq!(categories[i].as_deref(), Some("health_beauty"));
            assert_eq!(reviews[i].as_deref(), Some("R1"));
        }
    }
}

#[test]
fn test_status_filter_selects_canceled_orders() {
    let fixture = Fixture::new();
    let unified = build_unified_table(
        TableSource::Directory(fixture.path().to_path_buf()),
        StatusFilter::Only(vec![OrderStatus::Canceled]),
        PreprocessOptions::default(),
    )
    .unwrap();

    let order_ids = column_strings(&unified.frame, "order_id");
    assert_eq!(order_ids, vec![Some("2".to_string())]);
    assert_eq!(unified.report.orders_total, 3);
    assert_eq!(unified.report.orders_after_filter, 1);
}

#[test]
fn test_missing_input_file_aborts_before_output() {
    let fixture = Fixture::new();
    fs::remove_file(fixture.path().join(SourceTable::Sellers.file_name())).unwrap();

    let result = build_unified_table(
        TableSource::Directory(fixture.path().to_path_buf()),
        StatusFilter::delivered(),
        PreprocessOptions::default(),
    );

    match result {
        Err(PipelineError::MissingInputFile { table, .. }) => assert_eq!(table, "sellers"),
        other => panic!("expected missing input error, got {:?}", other.map(|t| t.frame.shape())),
    }
    assert!(!fixture.path().join("out").exists());
}

#[test]
fn test_loaded_tables_source_matches_directory() {
    let fixture = Fixture::new();
    let raw = DatasetLoader::new(fixture.path()).load_all().unwrap();
    let shapes = raw.shapes();
    assert_eq!(shapes.len(), 8);

    let from_raw = build_unified_table(
        TableSource::Loaded(raw),
        StatusFilter::delivered(),
        PreprocessOptions::default(),
    )
    .unwrap();
    let from_dir = build_unified_table(
        TableSource::Directory(fixture.path().to_path_buf()),
        StatusFilter::delivered(),
        PreprocessOptions::default(),
    )
    .unwrap();
    assert_eq!(from_raw.frame.shape(), from_dir.frame.shape());
    assert_eq!(from_raw.report, from_dir.report);
}

#[test]
fn test_report_over_fixture() {
    let fixture = Fixture::new();
    let raw = DatasetLoader::new(fixture.path()).load_all().unwrap();
    let tables = Preprocessor::new(PreprocessOptions::default())
        .prepare(&raw)
        .unwrap();

    let mut config = ViewsConfig::default();
    config.problematic.year = 2017;
    let report = build_report(&tables, &config).unwrap();

    // order 1 (10 days) and order 3 (3 days, floored)
    assert_eq!(report.delivery.order_count, 2);
    assert_eq!(report.delivery.max_days, Some(10));
    assert_eq!(report.delivery.min_days, Some(3));

    assert_eq!(report.problematic.order_count, 1);
    assert_eq!(report.problematic.top_categories[0].key, "health_beauty");

    let labels: Vec<&str> = report
        .revenue
        .top_per_quarter
        .iter()
        .map(|q| q.label.as_str())
        .collect();
    assert_eq!(labels, vec!["2017-Q1", "2017-Q2"]);
    assert_eq!(report.revenue.consistent_categories, vec!["health_beauty"]);

    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"consistent_categories\""));
}
