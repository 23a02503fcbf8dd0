//! File adapters producing `ImportLine` records for the CLI.

use crate::error::{ReconcileError, Result};
use crate::models::ImportLine;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Raw CSV row; every field is text so a single bad cell or a short row
/// skips that row instead of failing the file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportRecord {
    name: String,
    #[serde(default)]
    expansion_name: Option<String>,
    quantity: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    card_number: Option<String>,
    #[serde(default)]
    foil: Option<String>,
}

impl ImportRecord {
    fn into_line(self) -> Option<ImportLine> {
        if self.name.is_empty() {
            return None;
        }
        let quantity = self.quantity.parse::<i64>().ok()?;
        Some(ImportLine {
            name: self.name,
            expansion_name: non_empty(self.expansion_name),
            quantity,
            language: non_empty(self.language),
            card_number: non_empty(self.card_number),
            foil: non_empty(self.foil).map(|f| f == "1" || f.eq_ignore_ascii_case("true")),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Reads an import CSV with the headers
/// `name,expansionName,quantity,language,cardNumber,foil`.
///
/// Only the `name` and `quantity` columns are required; a file without
/// them is rejected. Rows that are too short, have an empty name or a
/// non-numeric quantity are skipped.
pub fn read_import_csv<P: AsRef<Path>>(path: P) -> Result<Vec<ImportLine>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path.as_ref())?;

    let headers = rdr.headers()?;
    for required in ["name", "quantity"] {
        if !headers.iter().any(|h| h == required) {
            return Err(ReconcileError::InvalidInput(format!(
                "{}: missing column '{}'",
                path.as_ref().display(),
                required
            )));
        }
    }

    let mut lines = Vec::new();
    for (index, result) in rdr.deserialize().enumerate() {
        let record: ImportRecord = match result {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Skipping import row {}: {}", index + 1, e);
                continue;
            }
        };
        match record.into_line() {
            Some(line) => lines.push(line),
            None => log::warn!("Skipping import row {}: missing name or quantity", index + 1),
        }
    }

    log::debug!("Read {} import entries from {}", lines.len(), path.as_ref().display());
    Ok(lines)
}

fn parse_want_line(line: &str) -> Option<ImportLine> {
    let (quantity, name) = line.trim().split_once(' ')?;
    let quantity = quantity.parse().ok()?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some(ImportLine::new(name, quantity))
}

/// Reads a want-list of `"<quantity> <name>"` lines. Blank lines and the
/// `Deck` header are skipped, as are lines that do not parse.
pub fn read_want_list<P: AsRef<Path>>(path: P) -> Result<Vec<ImportLine>> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let mut wants = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed == "Deck" {
            continue;
        }
        match parse_want_line(trimmed) {
            Some(entry) => wants.push(entry),
            None => log::warn!("Skipping want-list line: {trimmed}"),
        }
    }

    Ok(wants)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_want_line_splits_quantity_and_name() {
        let line = parse_want_line("4 Lightning Bolt").unwrap();
        assert_eq!(line.quantity, 4);
        assert_eq!(line.name, "Lightning Bolt");
    }

    #[test]
    fn parse_want_line_keeps_split_names() {
        let line = parse_want_line("1 Fire // Ice").unwrap();
        assert_eq!(line.name, "Fire // Ice");
    }

    #[test]
    fn parse_want_line_rejects_malformed() {
        assert!(parse_want_line("Lightning Bolt").is_none());
        assert!(parse_want_line("four Lightning Bolt").is_none());
        assert!(parse_want_line("3 ").is_none());
    }

    #[test]
    fn record_without_quantity_is_skipped() {
        let record = ImportRecord {
            name: "Opt".to_string(),
            expansion_name: None,
            quantity: "".to_string(),
            language: None,
            card_number: None,
            foil: None,
        };
        assert!(record.into_line().is_none());
    }

    #[test]
    fn record_parses_foil_flags() {
        let record = ImportRecord {
            name: "Opt".to_string(),
            expansion_name: Some("".to_string()),
            quantity: "2".to_string(),
            language: Some("German".to_string()),
            card_number: Some("65".to_string()),
            foil: Some("TRUE".to_string()),
        };
        let line = record.into_line().unwrap();
        assert_eq!(line.expansion_name, None);
        assert_eq!(line.foil, Some(true));
        assert_eq!(line.language.as_deref(), Some("German"));
    }
}
