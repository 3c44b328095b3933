//! Reporting projections over the sale ledger.
//!
//! This module provides read-only aggregations: invoice and sale history with
//! product names resolved, dashboard counters, and per-month and per-day sale
//! totals. Nothing here mutates state; multi-query aggregations run inside one
//! read transaction so they never mix rows from two in-flight commits.

use crate::{
    entities::{Invoice, Product, Sale, invoice, product, sale},
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::{PaginatorTrait, QueryOrder, TransactionTrait, prelude::*};
use std::collections::{BTreeMap, HashMap};

/// One sale line of an invoice, with its product name resolved.
#[derive(Debug, Clone)]
pub struct InvoiceLine {
    /// Product sold on this line
    pub product_id: i64,
    /// Product name at read time; deleted products still resolve
    pub product_name: String,
    /// Units sold
    pub quantity: i64,
    /// Amount charged for this line
    pub total_price: Decimal,
}

/// An invoice together with its sale lines.
#[derive(Debug, Clone)]
pub struct InvoiceWithLines {
    /// The invoice record
    pub invoice: invoice::Model,
    /// Its sale lines, in insertion order
    pub lines: Vec<InvoiceLine>,
}

/// A sale line joined with its product name for history views.
#[derive(Debug, Clone)]
pub struct SaleRecord {
    /// The sale record
    pub sale: sale::Model,
    /// Product name at read time; deleted products still resolve
    pub product_name: String,
}

/// Counters shown on the admin dashboard.
#[derive(Debug, Clone)]
pub struct DashboardStats {
    /// Number of active (non-deleted) products
    pub total_products: u64,
    /// Sum of `total_price` over all sales
    pub total_sales: Decimal,
    /// Sum of `total_price` minus `purchase_price` over all sales
    pub total_profit: Decimal,
    /// Number of sale lines ever committed
    pub total_orders: u64,
}

/// Sale totals for one calendar month.
#[derive(Debug, Clone)]
pub struct MonthlySales {
    /// Month in `YYYY-MM` form
    pub month: String,
    /// Sum of `total_price` over the month's sales
    pub total_sales: Decimal,
    /// Number of sale lines in the month
    pub sale_count: u64,
}

/// Sale totals for one calendar day.
#[derive(Debug, Clone)]
pub struct DailySales {
    /// Day in `YYYY-MM-DD` form
    pub day: String,
    /// Sum of `total_price` over the day's sales
    pub total_sales: Decimal,
    /// Number of sale lines on the day
    pub sale_count: u64,
}

/// Resolves product names for the given ids, deleted rows included, so
/// historical records never lose their labels.
async fn product_names<C>(db: &C, product_ids: &[i64]) -> Result<HashMap<i64, String>>
where
    C: ConnectionTrait,
{
    Ok(Product::find()
        .filter(product::Column::Id.is_in(product_ids.iter().copied()))
        .all(db)
        .await?
        .into_iter()
        .map(|item| (item.id, item.name))
        .collect())
}

/// Groups sale lines into buckets keyed by a strftime rendering of their
/// creation time, returning (period, total, count) in ascending period order.
fn bucket_sales(sales: &[sale::Model], format: &str) -> Vec<(String, Decimal, u64)> {
    let mut buckets: BTreeMap<String, (Decimal, u64)> = BTreeMap::new();
    for line in sales {
        let entry = buckets
            .entry(line.created_at.format(format).to_string())
            .or_insert((Decimal::ZERO, 0));
        entry.0 += line.total_price;
        entry.1 += 1;
    }

    buckets
        .into_iter()
        .map(|(period, (total_sales, sale_count))| (period, total_sales, sale_count))
        .collect()
}

/// Builds an [`InvoiceLine`] from a sale row using a resolved name map.
fn to_invoice_line(line: sale::Model, names: &HashMap<i64, String>) -> InvoiceLine {
    let product_name = names
        .get(&line.product_id)
        .cloned()
        .unwrap_or_else(|| line.product_id.to_string());

    InvoiceLine {
        product_id: line.product_id,
        product_name,
        quantity: line.quantity,
        total_price: line.total_price,
    }
}

/// Retrieves all invoices with their sale lines, newest first.
///
/// # Errors
/// Returns an error if a database query fails.
pub async fn get_invoice_history(db: &DatabaseConnection) -> Result<Vec<InvoiceWithLines>> {
    let txn = db.begin().await?;

    let invoices = Invoice::find()
        .order_by_desc(invoice::Column::CreatedAt)
        // Id breaks commit-time ties deterministically
        .order_by_desc(invoice::Column::Id)
        .all(&txn)
        .await?;

    let sales = Sale::find()
        .filter(sale::Column::InvoiceId.is_in(invoices.iter().map(|inv| inv.id)))
        .order_by_asc(sale::Column::Id)
        .all(&txn)
        .await?;

    let product_ids: Vec<i64> = sales.iter().map(|line| line.product_id).collect();
    let names = product_names(&txn, &product_ids).await?;

    txn.commit().await?;

    let mut lines_by_invoice: HashMap<i64, Vec<InvoiceLine>> = HashMap::new();
    for line in sales {
        let invoice_id = line.invoice_id;
        lines_by_invoice
            .entry(invoice_id)
            .or_default()
            .push(to_invoice_line(line, &names));
    }

    Ok(invoices
        .into_iter()
        .map(|inv| {
            let lines = lines_by_invoice.remove(&inv.id).unwrap_or_default();
            InvoiceWithLines {
                invoice: inv,
                lines,
            }
        })
        .collect())
}

/// Retrieves one invoice with its sale lines, or `None` if it does not exist.
///
/// # Errors
/// Returns an error if a database query fails.
pub async fn get_invoice(
    db: &DatabaseConnection,
    invoice_id: i64,
) -> Result<Option<InvoiceWithLines>> {
    let txn = db.begin().await?;

    let invoice_row = match Invoice::find_by_id(invoice_id).one(&txn).await? {
        Some(row) => row,
        None => return Ok(None),
    };

    let sales = Sale::find()
        .filter(sale::Column::InvoiceId.eq(invoice_row.id))
        .order_by_asc(sale::Column::Id)
        .all(&txn)
        .await?;

    let product_ids: Vec<i64> = sales.iter().map(|line| line.product_id).collect();
    let names = product_names(&txn, &product_ids).await?;

    txn.commit().await?;

    let lines = sales
        .into_iter()
        .map(|line| to_invoice_line(line, &names))
        .collect();

    Ok(Some(InvoiceWithLines {
        invoice: invoice_row,
        lines,
    }))
}

/// Retrieves all sale lines with product names resolved, newest first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_sales_history(db: &DatabaseConnection) -> Result<Vec<SaleRecord>> {
    let rows = Sale::find()
        .find_also_related(Product)
        .order_by_desc(sale::Column::CreatedAt)
        .order_by_desc(sale::Column::Id)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(sale_row, item)| {
            let product_name =
                item.map_or_else(|| sale_row.product_id.to_string(), |found| found.name);
            SaleRecord {
                sale: sale_row,
                product_name,
            }
        })
        .collect())
}

/// Computes the dashboard counters in one consistent read.
///
/// # Errors
/// Returns an error if a database query fails.
pub async fn get_dashboard_stats(db: &DatabaseConnection) -> Result<DashboardStats> {
    let txn = db.begin().await?;

    let total_products = Product::find()
        .filter(product::Column::IsDeleted.eq(false))
        .count(&txn)
        .await?;
    let total_orders = Sale::find().count(&txn).await?;
    let sales = Sale::find().all(&txn).await?;

    txn.commit().await?;

    let mut total_sales = Decimal::ZERO;
    let mut total_purchases = Decimal::ZERO;
    for line in &sales {
        total_sales += line.total_price;
        total_purchases += line.purchase_price;
    }

    Ok(DashboardStats {
        total_products,
        total_sales,
        total_profit: total_sales - total_purchases,
        total_orders,
    })
}

/// Retrieves sale totals grouped by calendar month, ascending.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_monthly_sales(db: &DatabaseConnection) -> Result<Vec<MonthlySales>> {
    let sales = Sale::find().all(db).await?;

    Ok(bucket_sales(&sales, "%Y-%m")
        .into_iter()
        .map(|(month, total_sales, sale_count)| MonthlySales {
            month,
            total_sales,
            sale_count,
        })
        .collect())
}

/// Retrieves sale totals grouped by calendar day, ascending.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_daily_sales(db: &DatabaseConnection) -> Result<Vec<DailySales>> {
    let sales = Sale::find().all(db).await?;

    Ok(bucket_sales(&sales, "%Y-%m-%d")
        .into_iter()
        .map(|(day, total_sales, sale_count)| DailySales {
            day,
            total_sales,
            sale_count,
        })
        .collect())
}
