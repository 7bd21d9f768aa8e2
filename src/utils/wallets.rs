use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;
use tracing::{info, warn};

use crate::models::{RiskScoreError, Result, WalletId};

pub const DEFAULT_WALLET_COLUMN: &str = "wallet_id";

/// Read wallet ids from the named column of a CSV with a header row.
/// Blank cells are skipped, ids are lowercased, duplicates dropped.
pub fn read_wallet_list<R: BufRead>(reader: R, column: &str) -> Result<Vec<WalletId>> {
    let mut lines = reader.lines();

    let header = match lines.next() {
        Some(line) => line?,
        None => return Err(RiskScoreError::Configuration("wallet list is empty".to_string())),
    };

    let index = split_row(&header)
        .iter()
        .position(|h| h.eq_ignore_ascii_case(column))
        .ok_or_else(|| RiskScoreError::Configuration(
            format!("wallet list has no '{}' column", column)
        ))?;

    let mut wallets = Vec::new();
    for line in lines {
        let line = line?;
        let cells = split_row(&line);
        match cells.get(index).map(|c| WalletId::parse(c)) {
            Some(Ok(id)) => wallets.push(id),
            _ => continue,
        }
    }

    Ok(dedupe(wallets))
}

pub fn load_wallet_file<P: AsRef<Path>>(path: P, column: &str) -> Result<Vec<WalletId>> {
    let file = std::fs::File::open(path.as_ref())?;
    let wallets = read_wallet_list(std::io::BufReader::new(file), column)?;
    info!("Loaded {} wallets from {}", wallets.len(), path.as_ref().display());
    Ok(wallets)
}

/// Keep the first occurrence of every id.
pub fn dedupe(wallets: Vec<WalletId>) -> Vec<WalletId> {
    let mut seen = HashSet::new();
    wallets
        .into_iter()
        .filter(|w| {
            let fresh = seen.insert(w.clone());
            if !fresh {
                warn!("Duplicate wallet {} in input", w);
            }
            fresh
        })
        .collect()
}

/// Comma split with double-quoted cells; `""` inside quotes is a literal quote.
/// Quoted cells spanning lines are not supported.
fn split_row(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = line.trim_end_matches('\r').chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if quoted && chars.peek() == Some(&'"') => {
                chars.next();
                current.push('"');
            }
            '"' => quoted = !quoted,
            ',' if !quoted => cells.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    cells.push(current);

    cells.into_iter().map(|c| c.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn test_split_row_handles_escaped_quotes() {
        assert_eq!(
            split_row("1,\"say \"\"hi\"\", ok\",0xabc\r"),
            vec!["1", "say \"hi\", ok", "0xabc"]
        );
        assert_eq!(split_row("\"\",x"), vec!["", "x"]);
    }

    #[test]
    fn test_reads_named_column() {
        let csv = "index,wallet_id,label\n1,0xABC,a\n2,,b\n3,\"0xdef\",c\n4,0xabc,d\n";
        let wallets = read_wallet_list(Cursor::new(csv), DEFAULT_WALLET_COLUMN).unwrap();
        let ids: Vec<&str> = wallets.iter().map(|w| w.as_str()).collect();
        assert_eq!(ids, vec!["0xabc", "0xdef"]);
    }

    #[test]
    fn test_missing_column_is_configuration_error() {
        let csv = "address\n0x1\n";
        assert!(matches!(
            read_wallet_list(Cursor::new(csv), DEFAULT_WALLET_COLUMN),
            Err(RiskScoreError::Configuration(_))
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(read_wallet_list(Cursor::new(""), DEFAULT_WALLET_COLUMN).is_err());
    }

    #[test]
    fn test_load_wallet_file_with_crlf() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "wallet_id\r\n0x1\r\n0x2\r\n").unwrap();
        let wallets = load_wallet_file(file.path(), "wallet_id").unwrap();
        assert_eq!(wallets.len(), 2);
        assert_eq!(wallets[1].as_str(), "0x2");
    }
}
