use serde::{Deserialize, Serialize};
use std::fmt;

/// Column names shared across the source tables and the unified record.
pub mod columns {
    pub const ORDER_ID: &str = "order_id";
    pub const CUSTOMER_ID: &str = "customer_id";
    pub const PRODUCT_ID: &str = "product_id";
    pub const SELLER_ID: &str = "seller_id";
    pub const REVIEW_ID: &str = "review_id";

    pub const ORDER_STATUS: &str = "order_status";
    pub const PURCHASE_TIMESTAMP: &str = "order_purchase_timestamp";
    pub const APPROVED_AT: &str = "order_approved_at";
    pub const DELIVERED_CARRIER_DATE: &str = "order_delivered_carrier_date";
    pub const DELIVERED_CUSTOMER_DATE: &str = "order_delivered_customer_date";
    pub const ESTIMATED_DELIVERY_DATE: &str = "order_estimated_delivery_date";

    pub const ORDER_DATE_COLUMNS: [&str; 5] = [
        PURCHASE_TIMESTAMP,
        APPROVED_AT,
        DELIVERED_CARRIER_DATE,
        DELIVERED_CUSTOMER_DATE,
        ESTIMATED_DELIVERY_DATE,
    ];

    pub const PAYMENT_VALUE: &str = "payment_value";

    pub const PRODUCT_CATEGORY_NAME: &str = "product_category_name";
    pub const PRODUCT_CATEGORY_NAME_ENGLISH: &str = "product_category_name_english";

    // Spelling follows the source dataset headers.
    pub const PRODUCT_NUMERIC_COLUMNS: [&str; 7] = [
        "product_name_lenght",
        "product_description_lenght",
        "product_photos_qty",
        "product_weight_g",
        "product_length_cm",
        "product_height_cm",
        "product_width_cm",
    ];

    pub const DELIVERY_DURATION_DAYS: &str = "delivery_duration_days";
}

/// Placeholder category for products without a category name.
pub const UNKNOWN_CATEGORY: &str = "unknown_category";

/// The eight fixed source tables of the dataset directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTable {
    Customers,
    OrderItems,
    OrderPayments,
    OrderReviews,
    Orders,
    Products,
    Sellers,
    CategoryTranslation,
}

impl SourceTable {
    pub const ALL: [SourceTable; 8] = [
        SourceTable::Customers,
        SourceTable::OrderItems,
        SourceTable::OrderPayments,
        SourceTable::OrderReviews,
        SourceTable::Orders,
        SourceTable::Products,
        SourceTable::Sellers,
        SourceTable::CategoryTranslation,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SourceTable::Customers => "customers",
            SourceTable::OrderItems => "order_items",
            SourceTable::OrderPayments => "order_payments",
            SourceTable::OrderReviews => "order_reviews",
            SourceTable::Orders => "orders",
            SourceTable::Products => "products",
            SourceTable::Sellers => "sellers",
            SourceTable::CategoryTranslation => "product_category_name_translation",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            SourceTable::Customers => "customers_dataset.csv",
            SourceTable::OrderItems => "order_items_dataset.csv",
            SourceTable::OrderPayments => "order_payments_dataset.csv",
            SourceTable::OrderReviews => "order_reviews_dataset.csv",
            SourceTable::Orders => "orders_dataset.csv",
            SourceTable::Products => "products_dataset.csv",
            SourceTable::Sellers => "sellers_dataset.csv",
            SourceTable::CategoryTranslation => "product_category_name_translation.csv",
        }
    }

    /// Columns that identify rows or link tables; normalized to strings on load.
    pub fn key_columns(&self) -> &'static [&'static str] {
        use columns::*;
        match self {
            SourceTable::Customers => &[CUSTOMER_ID],
            SourceTable::OrderItems => &[ORDER_ID, PRODUCT_ID, SELLER_ID],
            SourceTable::OrderPayments => &[ORDER_ID],
            SourceTable::OrderReviews => &[ORDER_ID],
            SourceTable::Orders => &[ORDER_ID, CUSTOMER_ID],
            SourceTable::Products => &[PRODUCT_ID],
            SourceTable::Sellers => &[SELLER_ID],
            SourceTable::CategoryTranslation => &[PRODUCT_CATEGORY_NAME],
        }
    }

    /// Non-key columns the pipeline reads from this table.
    pub fn value_columns(&self) -> &'static [&'static str] {
        use columns::*;
        match self {
            SourceTable::Orders => &[
                ORDER_STATUS,
                PURCHASE_TIMESTAMP,
                APPROVED_AT,
                DELIVERED_CARRIER_DATE,
                DELIVERED_CUSTOMER_DATE,
                ESTIMATED_DELIVERY_DATE,
            ],
            SourceTable::OrderPayments => &[PAYMENT_VALUE],
            SourceTable::Products => &[PRODUCT_CATEGORY_NAME],
            SourceTable::CategoryTranslation => &[PRODUCT_CATEGORY_NAME_ENGLISH],
            _ => &[],
        }
    }

    pub fn required_columns(&self) -> impl Iterator<Item = &'static str> {
        self.key_columns()
            .iter()
            .chain(self.value_columns().iter())
            .copied()
    }
}

impl fmt::Display for SourceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Created,
    Approved,
    Processing,
    Shipped,
    Delivered,
    Unavailable,
    Canceled,
    Invoiced,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "created",
            OrderStatus::Approved => "approved",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Unavailable => "unavailable",
            OrderStatus::Canceled => "canceled",
            OrderStatus::Invoiced => "invoiced",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which orders enter a join plan.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    Any,
    Only(Vec<OrderStatus>),
}

impl StatusFilter {
    pub fn delivered() -> Self {
        StatusFilter::Only(vec![OrderStatus::Delivered])
    }
}

impl From<Vec<OrderStatus>> for StatusFilter {
    fn from(statuses: Vec<OrderStatus>) -> Self {
        if statuses.is_empty() {
            StatusFilter::Any
        } else {
            StatusFilter::Only(statuses)
        }
    }
}
