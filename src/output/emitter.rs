use std::collections::HashSet;
use std::io::Write;

use crate::models::{RiskScoreError, Result, ScoreRow, SkippedWallet, MAX_SCORE};

/// Sink for the final `(wallet_id, score)` table.
pub trait ResultEmitter {
    fn emit(&mut self, rows: &[ScoreRow]) -> Result<()>;
}

/// Rows handed to a sink must be unique per wallet and within score bounds.
pub fn check_rows(rows: &[ScoreRow]) -> Result<()> {
    let mut seen = HashSet::new();
    for row in rows {
        if !seen.insert(&row.wallet_id) {
            return Err(RiskScoreError::InvalidWallet(format!("duplicate output row for {}", row.wallet_id)));
        }
        if row.score > MAX_SCORE {
            return Err(RiskScoreError::InvalidRecord {
                wallet: row.wallet_id.to_string(),
                message: format!("score {} above {}", row.score, MAX_SCORE),
            });
        }
    }
    Ok(())
}

pub struct CsvEmitter<W: Write> {
    writer: W,
}

impl<W: Write> CsvEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResultEmitter for CsvEmitter<W> {
    fn emit(&mut self, rows: &[ScoreRow]) -> Result<()> {
        check_rows(rows)?;
        writeln!(self.writer, "wallet_id,score")?;
        for row in rows {
            writeln!(self.writer, "{},{}", row.wallet_id, row.score)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

pub struct JsonEmitter<W: Write> {
    writer: W,
}

impl<W: Write> JsonEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResultEmitter for JsonEmitter<W> {
    fn emit(&mut self, rows: &[ScoreRow]) -> Result<()> {
        check_rows(rows)?;
        serde_json::to_writer_pretty(&mut self.writer, rows)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// `wallet_id,reason` report of every wallet left out of the table.
pub fn write_skipped<W: Write>(mut writer: W, skipped: &[SkippedWallet]) -> Result<()> {
    writeln!(writer, "wallet_id,reason")?;
    for s in skipped {
        let reason = s.reason.to_string().replace('"', "'");
        writeln!(writer, "{},\"{}\"", s.wallet_id, reason)?;
    }
    writer.flush()?;
    Ok(())
}
