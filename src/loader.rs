//! Market and order batch loading
//!
//! Both inputs are tab-separated text without a header row:
//!
//! ```text
//! market:  <display name>\t<security id>\t<price>
//! orders:  <portfolio id>\t<security id>\t<signed quantity>\t<limit price>\t<YYYY-MM-DD>
//! ```
//!
//! Lines with the wrong number of fields, or fields that fail to parse, are
//! skipped. Only failing to open the file is an error.

use std::fs::File;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::Ledger;
use crate::market::MarketEntry;
use crate::{parse_date, Money, PortfolioId, SecurityId, Side};

/// Counters for one order batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderBatch {
    /// Executed the same day or queued
    pub accepted: usize,
    /// Well-formed but refused by scheduling
    pub refused: usize,
    /// Malformed lines
    pub skipped: usize,
}

fn tsv_records(path: &Path) -> LedgerResult<csv::StringRecordsIntoIter<File>> {
    let file = File::open(path).map_err(|source| LedgerError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(file);
    Ok(reader.into_records())
}

/// Replace the ledger's market table with the quotes in `path`.
///
/// Returns the number of quotes loaded.
pub fn load_market(ledger: &mut Ledger, path: impl AsRef<Path>) -> LedgerResult<usize> {
    let path = path.as_ref();
    let mut entries = Vec::new();

    for (line_idx, result) in tsv_records(path)?.enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("{}:{}: unreadable line: {}", path.display(), line_idx + 1, e);
                continue;
            }
        };
        // Repeated tabs are used for alignment; empty fields are not columns
        let fields: Vec<&str> = record
            .iter()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .collect();
        let [name, security, price] = fields[..] else {
            debug!("{}:{}: skipped ({} fields)", path.display(), line_idx + 1, fields.len());
            continue;
        };
        let Some(price) = Money::parse(price).filter(|p| !p.is_negative()) else {
            warn!("{}:{}: bad price '{}'", path.display(), line_idx + 1, price);
            continue;
        };
        entries.push(MarketEntry::new(security, name, price));
    }

    let count = entries.len();
    ledger.replace_market(entries);
    info!("Loaded {} quotes from {}", count, path.display());
    Ok(count)
}

/// Submit every order in `path` through [`Ledger::schedule_order`].
///
/// A positive quantity is a BUY, a negative one a SELL of its absolute
/// value. Zero-quantity lines are skipped.
pub fn load_orders(ledger: &mut Ledger, path: impl AsRef<Path>) -> LedgerResult<OrderBatch> {
    let path = path.as_ref();
    let mut batch = OrderBatch::default();

    for (line_idx, result) in tsv_records(path)?.enumerate() {
        let line = line_idx + 1;
        let parsed = result
            .ok()
            .and_then(|record| parse_order(&record));
        let Some(order) = parsed else {
            debug!("{}:{}: skipped malformed order", path.display(), line);
            batch.skipped += 1;
            continue;
        };

        let ParsedOrder {
            portfolio_id,
            side,
            security_id,
            quantity,
            limit_price,
            date,
        } = order;
        if ledger.schedule_order(portfolio_id, side, security_id, quantity, limit_price, Some(date)) {
            batch.accepted += 1;
        } else {
            batch.refused += 1;
        }
    }

    info!(
        "Order batch {}: {} accepted, {} refused, {} skipped",
        path.display(),
        batch.accepted,
        batch.refused,
        batch.skipped
    );
    Ok(batch)
}

struct ParsedOrder {
    portfolio_id: PortfolioId,
    side: Side,
    security_id: SecurityId,
    quantity: u64,
    limit_price: Money,
    date: chrono::NaiveDate,
}

fn parse_order(record: &csv::StringRecord) -> Option<ParsedOrder> {
    let fields: Vec<&str> = record.iter().map(str::trim).collect();
    let [portfolio, security, quantity, limit, date] = fields[..] else {
        return None;
    };

    let signed: i64 = quantity.parse().ok()?;
    let side = match signed {
        0 => return None,
        q if q > 0 => Side::Buy,
        _ => Side::Sell,
    };
    if security.is_empty() {
        return None;
    }

    Some(ParsedOrder {
        portfolio_id: PortfolioId(portfolio.parse().ok()?),
        side,
        security_id: SecurityId::new(security),
        quantity: signed.unsigned_abs(),
        limit_price: Money::parse(limit)?,
        date: parse_date(date)?,
    })
}
