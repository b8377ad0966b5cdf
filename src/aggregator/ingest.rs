use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use tracing::{error, info};

use crate::models::Transaction;

/// Reads categorized transactions from a CSV file with a
/// `date,amount,categoryId,mccCode,merchant` header.
pub fn read_transactions(path: &Path) -> Result<Vec<Transaction>> {
    let file = File::open(path)
        .with_context(|| format!("Error opening transactions CSV at path: {}", path.display()))?;

    read_transactions_from(BufReader::new(file))
}

/// Malformed rows are logged and skipped; they never abort the read.
pub fn read_transactions_from<R: Read>(reader: R) -> Result<Vec<Transaction>> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut transactions = Vec::new();
    let mut rejected = 0usize;

    for result in reader.deserialize::<Transaction>() {
        match result {
            Ok(transaction) => transactions.push(transaction),
            Err(error) => {
                rejected += 1;
                error!("CSV deserialization error: {error}");
            }
        }
    }

    info!("Read {} transactions ({} rows rejected)", transactions.len(), rejected);

    Ok(transactions)
}
