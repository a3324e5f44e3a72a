use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Date32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Days, NaiveDate};
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.below(items.len() as u64) as usize]
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

const REGIONS: [&str; 4] = ["Central", "East", "South", "West"];
const SEGMENTS: [&str; 3] = ["Consumer", "Corporate", "Home Office"];
const SHIP_MODES: [(&str, u64); 4] = [
    ("Same Day", 0),
    ("First Class", 2),
    ("Second Class", 3),
    ("Standard Class", 5),
];
const DISCOUNTS: [f64; 5] = [0.0, 0.0, 0.1, 0.2, 0.4];

/// (category, sub-categories, median unit price, base margin)
const CATALOGUE: [(&str, &[&str], f64, f64); 3] = [
    ("Furniture", &["Chairs", "Tables", "Bookcases", "Furnishings"], 180.0, 0.08),
    ("Office Supplies", &["Binders", "Paper", "Storage", "Art", "Labels"], 25.0, 0.22),
    ("Technology", &["Phones", "Accessories", "Machines", "Copiers"], 220.0, 0.17),
];

struct Row {
    row_id: i64,
    order_id: String,
    order_date: NaiveDate,
    ship_date: NaiveDate,
    ship_mode: &'static str,
    customer_id: String,
    segment: &'static str,
    region: &'static str,
    category: &'static str,
    sub_category: &'static str,
    sales: f64,
    quantity: i64,
    discount: f64,
    profit: f64,
}

fn generate_rows(rng: &mut SimpleRng, n_orders: usize) -> Result<Vec<Row>> {
    let start = NaiveDate::from_ymd_opt(2014, 1, 3).context("invalid start date")?;
    let span_days = 4 * 365;
    let mut rows = Vec::new();

    for order_no in 0..n_orders {
        let order_date = start
            .checked_add_days(Days::new(rng.below(span_days)))
            .context("order date overflow")?;
        let &(ship_mode, ship_days) = rng.pick(&SHIP_MODES);
        let ship_date = order_date
            .checked_add_days(Days::new(ship_days + rng.below(2)))
            .context("ship date overflow")?;
        let region = *rng.pick(&REGIONS);
        let segment = *rng.pick(&SEGMENTS);
        let customer_id = format!("CU-{:05}", rng.below(800));
        let order_id = format!("CA-{}-{:06}", order_date.format("%Y"), 100000 + order_no);

        let n_items = 1 + rng.below(4);
        for _ in 0..n_items {
            let &(category, subs, unit_price, margin) = rng.pick(&CATALOGUE);
            let sub_category = *rng.pick(subs);
            let quantity = 1 + rng.below(9) as i64;
            let discount = *rng.pick(&DISCOUNTS);
            let price = (unit_price * rng.gauss(1.0, 0.35).abs().max(0.05)).max(1.0);
            let sales = round2(price * quantity as f64 * (1.0 - discount));
            let profit = round4(sales * (margin - 1.2 * discount + rng.gauss(0.0, 0.05)));

            rows.push(Row {
                row_id: rows.len() as i64 + 1,
                order_id: order_id.clone(),
                order_date,
                ship_date,
                ship_mode,
                customer_id: customer_id.clone(),
                segment,
                region,
                category,
                sub_category,
                sales,
                quantity,
                discount,
                profit,
            });
        }
    }
    Ok(rows)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

/// Superstore export layout: US month/day/year dates.
fn write_csv(rows: &[Row], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record([
        "Row ID", "Order ID", "Order Date", "Ship Date", "Ship Mode", "Customer ID", "Segment",
        "Region", "Category", "Sub-Category", "Sales", "Quantity", "Discount", "Profit",
    ])?;
    for r in rows {
        writer.write_record([
            r.row_id.to_string(),
            r.order_id.clone(),
            r.order_date.format("%-m/%-d/%Y").to_string(),
            r.ship_date.format("%-m/%-d/%Y").to_string(),
            r.ship_mode.to_string(),
            r.customer_id.clone(),
            r.segment.to_string(),
            r.region.to_string(),
            r.category.to_string(),
            r.sub_category.to_string(),
            r.sales.to_string(),
            r.quantity.to_string(),
            r.discount.to_string(),
            r.profit.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn string_column(rows: &[Row], f: impl Fn(&Row) -> &str) -> StringArray {
    StringArray::from(rows.iter().map(f).collect::<Vec<_>>())
}

fn float_column(rows: &[Row], f: impl Fn(&Row) -> f64) -> Float64Array {
    Float64Array::from(rows.iter().map(f).collect::<Vec<_>>())
}

/// Same rows as Parquet, with native Date32 date columns.
fn write_parquet(rows: &[Row], path: &Path) -> Result<()> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).context("invalid epoch")?;
    let days = |d: NaiveDate| (d - epoch).num_days() as i32;

    let schema = Arc::new(Schema::new(vec![
        Field::new("Row ID", DataType::Int64, false),
        Field::new("Order ID", DataType::Utf8, false),
        Field::new("Order Date", DataType::Date32, false),
        Field::new("Ship Date", DataType::Date32, false),
        Field::new("Region", DataType::Utf8, false),
        Field::new("Category", DataType::Utf8, false),
        Field::new("Sales", DataType::Float64, false),
        Field::new("Quantity", DataType::Int64, false),
        Field::new("Discount", DataType::Float64, false),
        Field::new("Profit", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(rows.iter().map(|r| r.row_id).collect::<Vec<_>>())),
            Arc::new(string_column(rows, |r| r.order_id.as_str())),
            Arc::new(Date32Array::from(rows.iter().map(|r| days(r.order_date)).collect::<Vec<_>>())),
            Arc::new(Date32Array::from(rows.iter().map(|r| days(r.ship_date)).collect::<Vec<_>>())),
            Arc::new(string_column(rows, |r| r.region)),
            Arc::new(string_column(rows, |r| r.category)),
            Arc::new(float_column(rows, |r| r.sales)),
            Arc::new(Int64Array::from(rows.iter().map(|r| r.quantity).collect::<Vec<_>>())),
            Arc::new(float_column(rows, |r| r.discount)),
            Arc::new(float_column(rows, |r| r.profit)),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let rows = generate_rows(&mut rng, 1500)?;

    let out_dir = Path::new("data");
    std::fs::create_dir_all(out_dir).context("creating data/")?;

    let csv_path = out_dir.join("Superstore.csv");
    write_csv(&rows, &csv_path)?;
    let parquet_path = out_dir.join("Superstore.parquet");
    write_parquet(&rows, &parquet_path)?;

    println!(
        "Wrote {} line items to {} and {}",
        rows.len(),
        csv_path.display(),
        parquet_path.display()
    );
    Ok(())
}
