//! CSV rendering for module reports and daily sales books.

use super::aggregator::YearMonth;
use super::error::ExportError;
use crate::models::{AnnotatedRecord, DailySaleEntry, ModuleKind, RecordDetails, SalesLedger};
use chrono::NaiveDate;
use csv::{QuoteStyle, Terminator, WriterBuilder};

pub const CSV_CONTENT_TYPE: &str = "text/csv;charset=utf-8";

/// One output row: column names in order, with optional values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvRecord {
    fields: Vec<(String, Option<String>)>,
}

impl CsvRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.fields.push((key.into(), Some(value.to_string())));
        self
    }

    pub fn optional<V: ToString>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.fields.push((key.into(), value.map(|v| v.to_string())));
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }
}

pub trait ToCsvRecord {
    fn to_csv_record(&self) -> CsvRecord;
}

/// Render records as CSV.
///
/// The header comes from the first record's keys. Later rows are projected
/// onto that header; a key they lack becomes an empty field. Every field is
/// quoted, rows end in `\n` and the last newline is dropped. No records, no
/// output.
pub fn export_csv(records: &[CsvRecord]) -> Result<String, ExportError> {
    let Some(first) = records.first() else {
        return Ok(String::new());
    };
    let header: Vec<&str> = first.keys().collect();

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(&header)?;
    for record in records {
        writer.write_record(header.iter().map(|key| record.get(key).unwrap_or_default()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    let mut text = String::from_utf8(bytes)?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

pub fn export_rows<T: ToCsvRecord>(rows: &[T]) -> Result<String, ExportError> {
    let records: Vec<CsvRecord> = rows.iter().map(ToCsvRecord::to_csv_record).collect();
    export_csv(&records)
}

pub fn module_report_filename(module: ModuleKind, as_of: NaiveDate) -> String {
    format!("{}-report-{}.csv", module.slug(), as_of.format("%Y-%m-%d"))
}

pub fn daily_sales_filename(ledger: SalesLedger, period: YearMonth) -> String {
    format!("{}-daily-sales-{}.csv", ledger.as_str(), period)
}

impl ToCsvRecord for AnnotatedRecord {
    fn to_csv_record(&self) -> CsvRecord {
        let inputs = &self.record.inputs;
        let derived = &self.derived;
        let row = CsvRecord::new()
            .field("name", &inputs.name)
            .optional("description", inputs.description.as_ref());

        let row = match &inputs.details {
            RecordDetails::Stationery { selling_price } => row
                .field("quantity", inputs.quantity)
                .field("rate", inputs.rate)
                .optional("selling_price", *selling_price)
                .optional("profit_per_unit", derived.profit_per_unit)
                .field("units_sold", derived.units_sold)
                .optional("stock", derived.stock)
                .field("low_stock", derived.is_low_stock),
            RecordDetails::GiftStore {
                category,
                selling_price,
            } => row
                .field("category", category.label())
                .field("quantity", inputs.quantity)
                .field("rate", inputs.rate)
                .optional("selling_price", *selling_price)
                .optional("profit_per_unit", derived.profit_per_unit)
                .field("units_sold", derived.units_sold)
                .optional("stock", derived.stock)
                .field("low_stock", derived.is_low_stock),
            RecordDetails::Machines { machine_type } => row
                .field("machine_type", machine_type.as_str())
                .field("quantity", inputs.quantity)
                .field("rate", inputs.rate),
            RecordDetails::Embroidery { quotation, deposit }
            | RecordDetails::ArtServices { quotation, deposit } => row
                .field("quantity", inputs.quantity)
                .optional("quotation", *quotation)
                .field("deposit", deposit)
                .optional("balance", derived.balance),
        };

        row.field("sales", derived.sales)
            .field("expenditure", inputs.expenditure)
            .field("profit", derived.profit)
            .optional("done_by", inputs.done_by.as_ref())
            .field("date", inputs.record_date)
    }
}

impl ToCsvRecord for DailySaleEntry {
    fn to_csv_record(&self) -> CsvRecord {
        CsvRecord::new()
            .field("date", self.date)
            .field("item", &self.item)
            .optional("code", self.code.as_ref())
            .field("quantity", self.quantity)
            .field("unit", &self.unit)
            .field("bpx", self.bpx)
            .field("spx", self.spx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InventoryRecord, RecordInputs, SaleEvent};
    use crate::reporting::derive_metrics;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn parse(csv_text: &str) -> (Vec<String>, Vec<Vec<String>>) {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(csv_text.as_bytes());
        let headers = reader
            .headers()
            .unwrap()
            .iter()
            .map(str::to_string)
            .collect();
        let rows = reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect();
        (headers, rows)
    }

    #[test]
    fn empty_input_exports_nothing() {
        assert_eq!(export_csv(&[]).unwrap(), "");
        assert_eq!(export_rows::<DailySaleEntry>(&[]).unwrap(), "");
    }

    #[test]
    fn quotes_every_field_and_doubles_embedded_quotes() {
        let rows = [CsvRecord::new()
            .field("name", "12\" ruler, steel")
            .optional::<String>("code", None)];
        assert_eq!(
            export_csv(&rows).unwrap(),
            "\"name\",\"code\"\n\"12\"\" ruler, steel\",\"\""
        );
    }

    #[test]
    fn round_trips_through_a_quote_aware_parser() {
        let rows = vec![
            CsvRecord::new()
                .field("item", "Card \"Happy Birthday\"")
                .field("note", "line one\nline two")
                .field("spx", "1500.50"),
            CsvRecord::new()
                .field("item", "Wrapping, gold")
                .optional::<&str>("note", None)
                .field("spx", "0"),
        ];
        let text = export_csv(&rows).unwrap();
        assert!(!text.ends_with('\n'));

        let (headers, parsed) = parse(&text);
        assert_eq!(headers, vec!["item", "note", "spx"]);
        assert_eq!(parsed.len(), rows.len());
        for (record, row) in rows.iter().zip(&parsed) {
            for (i, key) in headers.iter().enumerate() {
                assert_eq!(record.get(key).unwrap_or_default(), row[i]);
            }
        }
    }

    #[test]
    fn later_rows_follow_the_first_header() {
        let rows = [
            CsvRecord::new().field("a", 1).field("b", 2),
            CsvRecord::new().field("b", 20).field("c", 30),
        ];
        assert_eq!(export_csv(&rows).unwrap(), "\"a\",\"b\"\n\"1\",\"2\"\n\"\",\"20\"");
    }

    #[test]
    fn input_order_is_preserved() {
        let rows: Vec<CsvRecord> = (0..5).rev().map(|i| CsvRecord::new().field("n", i)).collect();
        let text = export_csv(&rows).unwrap();
        let (_, parsed) = parse(&text);
        let values: Vec<_> = parsed.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(values, vec!["4", "3", "2", "1", "0"]);
    }

    #[test]
    fn daily_sales_columns_match_the_sales_book() {
        let entry = DailySaleEntry {
            entry_id: Uuid::new_v4(),
            ledger: "gifts".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            item: "Mug".to_string(),
            code: Some("MG-01".to_string()),
            quantity: 2,
            unit: "Pc".to_string(),
            bpx: Decimal::from(700),
            spx: Decimal::from(1000),
            created_utc: Utc::now(),
        };
        let text = export_rows(&[entry]).unwrap();
        assert_eq!(
            text,
            "\"date\",\"item\",\"code\",\"quantity\",\"unit\",\"bpx\",\"spx\"\n\
             \"2024-03-05\",\"Mug\",\"MG-01\",\"2\",\"Pc\",\"700\",\"1000\""
        );
    }

    #[test]
    fn embroidery_report_carries_negative_balance() {
        let inputs = RecordInputs::new(
            "Team jerseys",
            1,
            Decimal::ZERO,
            RecordDetails::Embroidery {
                quotation: Some(Decimal::from(50_000)),
                deposit: Decimal::from(55_000),
            },
        );
        let now = Utc::now();
        let no_sales: Vec<SaleEvent> = Vec::new();
        let derived = derive_metrics(&inputs, &no_sales);
        let annotated = AnnotatedRecord {
            record: InventoryRecord {
                id: Uuid::new_v4(),
                inputs,
                created_utc: now,
                updated_utc: now,
            },
            derived,
        };
        let record = annotated.to_csv_record();
        assert_eq!(record.get("balance"), Some("-5000"));
        assert_eq!(record.get("stock"), None);
    }

    #[test]
    fn filenames_use_dashboard_ids() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(
            module_report_filename(ModuleKind::GiftStore, day),
            "gift-store-report-2024-03-05.csv"
        );
        assert_eq!(
            module_report_filename(ModuleKind::ArtServices, day),
            "art-services-report-2024-03-05.csv"
        );
        let march = YearMonth::new(2024, 3).unwrap();
        assert_eq!(
            daily_sales_filename(SalesLedger::Gifts, march),
            "gifts-daily-sales-2024-03.csv"
        );
    }
}
