//! Field-alias normalization of contest payloads.
//!
//! Result providers disagree on field names (`concurso` vs `numero`,
//! `dezenas` vs `listaDezenas`, ...) and on date formats. Each logical field
//! is resolved by trying an ordered list of keys from an [`AliasTable`].

use crate::domain::model::{ContestRecord, SkipReason, SkippedRecord, TransformResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasTable {
    /// Object keys that may wrap the contest list.
    pub wrappers: Vec<String>,
    pub number: Vec<String>,
    pub date: Vec<String>,
    pub numbers: Vec<String>,
}

fn owned(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

impl Default for AliasTable {
    fn default() -> Self {
        Self {
            wrappers: owned(&["concursos", "data", "resultados", "items", "lista"]),
            number: owned(&["concurso", "numero", "numeroConcurso", "id"]),
            date: owned(&["data", "dataApuracao", "dtApuracao"]),
            numbers: owned(&["dezenas", "listaDezenas", "numeros", "bolas", "resultado"]),
        }
    }
}

/// The payload is neither a contest list nor a contest object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("payload is a JSON {kind}, expected a contest list or object")]
pub struct ShapeError {
    pub kind: &'static str,
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    aliases: AliasTable,
}

impl Normalizer {
    pub fn new(aliases: AliasTable) -> Self {
        Self { aliases }
    }

    /// Splits a payload into contest entries.
    ///
    /// Arrays are taken as-is, objects are unwrapped when one of the wrapper
    /// keys holds an array and are otherwise treated as a single contest.
    pub fn entries(&self, payload: Value) -> Result<Vec<Value>, ShapeError> {
        match payload {
            Value::Array(items) => Ok(items),
            Value::Object(mut map) => {
                let wrapper = self
                    .aliases
                    .wrappers
                    .iter()
                    .find(|key| matches!(map.get(key.as_str()), Some(Value::Array(_))))
                    .cloned();

                match wrapper.and_then(|key| map.remove(&key)) {
                    Some(Value::Array(items)) => Ok(items),
                    _ => Ok(vec![Value::Object(map)]),
                }
            }
            other => Err(ShapeError {
                kind: json_kind(&other),
            }),
        }
    }

    pub fn contest_number(&self, entry: &Map<String, Value>) -> Option<u32> {
        self.aliases
            .number
            .iter()
            .filter_map(|key| entry.get(key))
            .find_map(|value| {
                parse_int(value)
                    .filter(|n| *n > 0)
                    .and_then(|n| u32::try_from(n).ok())
            })
    }

    pub fn draw_date(&self, entry: &Map<String, Value>) -> Option<NaiveDate> {
        self.aliases
            .date
            .iter()
            .filter_map(|key| entry.get(key))
            .find_map(|value| value.as_str().and_then(parse_date))
    }

    /// Numbers from the first alias holding a non-empty list or string.
    pub fn drawn_numbers(&self, entry: &Map<String, Value>) -> Option<Vec<i64>> {
        let raw = self
            .aliases
            .numbers
            .iter()
            .filter_map(|key| entry.get(key))
            .find(|value| match value {
                Value::Array(items) => !items.is_empty(),
                Value::String(s) => !s.trim().is_empty(),
                _ => false,
            })?;

        match raw {
            Value::Array(items) => Some(items.iter().filter_map(parse_int).collect()),
            Value::String(s) => Some(split_numbers(s)),
            _ => None,
        }
    }

    pub fn normalize_entry(&self, entry: &Value) -> Result<ContestRecord, SkipReason> {
        let Value::Object(fields) = entry else {
            return Err(SkipReason::NotAnObject);
        };

        let number = self.contest_number(fields).ok_or(SkipReason::MissingNumber)?;
        let date = self.draw_date(fields).ok_or(SkipReason::MissingDate)?;
        let numbers = self.drawn_numbers(fields).ok_or(SkipReason::MissingNumbers)?;

        ContestRecord::new(number, date, &numbers).map_err(SkipReason::InvalidDraw)
    }

    /// Normalizes every payload, dropping malformed entries and repeated
    /// contest numbers. Output is ascending by contest number.
    pub fn normalize(&self, payloads: Vec<Value>) -> TransformResult {
        let mut accepted: BTreeMap<u32, ContestRecord> = BTreeMap::new();
        let mut skipped = Vec::new();
        let mut unusable_payloads = 0;
        let mut index = 0;

        for payload in payloads {
            let entries = match self.entries(payload) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("⚠️ Ignoring payload: {}", e);
                    unusable_payloads += 1;
                    continue;
                }
            };

            for entry in entries {
                let outcome = self.normalize_entry(&entry).and_then(|record| {
                    if accepted.contains_key(&record.number) {
                        Err(SkipReason::Duplicate)
                    } else {
                        Ok(record)
                    }
                });

                match outcome {
                    Ok(record) => {
                        accepted.insert(record.number, record);
                    }
                    Err(reason) => {
                        let number = entry.as_object().and_then(|o| self.contest_number(o));
                        tracing::warn!(
                            "⏭️ Skipping entry #{} (contest {}): {}",
                            index,
                            number.map_or_else(|| "?".to_string(), |n| n.to_string()),
                            reason
                        );
                        skipped.push(SkippedRecord {
                            index,
                            number,
                            reason,
                        });
                    }
                }
                index += 1;
            }
        }

        TransformResult {
            records: accepted.into_values().collect(),
            skipped,
            unusable_payloads,
        }
    }
}

/// Accepts `YYYY-MM-DD` (optionally with a `T` or space separated time
/// part) or `DD/MM/YYYY`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let day = raw
        .split_once(|c: char| c == 'T' || c == ' ')
        .map_or(raw, |(day, _)| day);

    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .ok()
}

fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// "01-02-03", "1,2,3", "1;2;3" and "01 02 03" all work.
fn split_numbers(raw: &str) -> Vec<i64> {
    raw.split(|c: char| c == ',' || c == ';' || c == '-' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .filter_map(|part| part.parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::DrawError;
    use serde_json::json;

    fn strings(range: std::ops::RangeInclusive<i64>) -> Vec<String> {
        range.map(|n| n.to_string()).collect()
    }

    #[test]
    fn normalizes_slash_dates_and_string_numbers() {
        let normalizer = Normalizer::default();
        let entry = json!({"concurso": 10, "data": "03/01/2024", "dezenas": strings(1..=15)});

        let record = normalizer.normalize_entry(&entry).unwrap();

        assert_eq!(record.number, 10);
        assert_eq!(record.iso_date(), "2024-01-03");
        assert_eq!(
            record.numbers.to_vec(),
            (1..=15).map(|n| n as u8).collect::<Vec<_>>()
        );
    }

    #[test]
    fn resolves_alternative_aliases() {
        let normalizer = Normalizer::default();
        let entry = json!({
            "numeroConcurso": "3001",
            "dataApuracao": "2024-02-10T20:00:00",
            "listaDezenas": ["25", "24", "23", "22", "21", "20", "19", "18",
                             "17", "16", "15", "14", "13", "12", "11"]
        });

        let record = normalizer.normalize_entry(&entry).unwrap();

        assert_eq!(record.number, 3001);
        assert_eq!(record.iso_date(), "2024-02-10");
        assert_eq!(record.numbers[0], 11);
        assert_eq!(record.numbers[14], 25);
    }

    #[test]
    fn zero_contest_number_falls_through_to_next_alias() {
        let normalizer = Normalizer::default();
        let balls: Vec<u8> = (1..=15).collect();
        let entry = json!({"concurso": 0, "numero": 42, "data": "2024-01-01", "bolas": balls});

        assert_eq!(normalizer.normalize_entry(&entry).unwrap().number, 42);
    }

    #[test]
    fn delimited_string_fallback() {
        let normalizer = Normalizer::default();
        let entry = json!({
            "concurso": 7,
            "data": "2024-01-01",
            "resultado": "01-02-03-04-05;06;07,08,09 10 11-12-13-14-15"
        });

        let record = normalizer.normalize_entry(&entry).unwrap();
        assert_eq!(record.numbers[14], 15);
    }

    #[test]
    fn fourteen_numbers_are_rejected() {
        let normalizer = Normalizer::default();
        let entry = json!({"concurso": 5, "data": "2024-01-01", "dezenas": strings(1..=14)});

        assert_eq!(
            normalizer.normalize_entry(&entry),
            Err(SkipReason::InvalidDraw(DrawError::WrongCount(14)))
        );
    }

    #[test]
    fn missing_fields_are_reported() {
        let normalizer = Normalizer::default();

        assert_eq!(
            normalizer.normalize_entry(&json!({"data": "2024-01-01", "dezenas": strings(1..=15)})),
            Err(SkipReason::MissingNumber)
        );
        assert_eq!(
            normalizer.normalize_entry(&json!({"concurso": 1, "data": "yesterday", "dezenas": strings(1..=15)})),
            Err(SkipReason::MissingDate)
        );
        assert_eq!(
            normalizer.normalize_entry(&json!({"concurso": 1, "data": "2024-01-01", "dezenas": []})),
            Err(SkipReason::MissingNumbers)
        );
        assert_eq!(
            normalizer.normalize_entry(&json!("not an object")),
            Err(SkipReason::NotAnObject)
        );
    }

    #[test]
    fn unwraps_wrapper_objects_but_not_single_contests() {
        let normalizer = Normalizer::default();

        let wrapped = json!({"concursos": [{"concurso": 1}, {"concurso": 2}]});
        assert_eq!(normalizer.entries(wrapped).unwrap().len(), 2);

        // "data" is a wrapper key only when it holds an array
        let single = json!({"concurso": 1, "data": "2024-01-01"});
        assert_eq!(normalizer.entries(single).unwrap().len(), 1);

        let err = normalizer.entries(json!("maintenance")).unwrap_err();
        assert_eq!(err.kind, "string");
    }

    #[test]
    fn normalize_skips_bad_entries_dedupes_and_sorts() {
        let normalizer = Normalizer::default();
        let payload = json!([
            {"concurso": 3, "data": "2024-01-05", "dezenas": strings(1..=15)},
            {"concurso": 1, "data": "2024-01-01", "dezenas": strings(1..=15)},
            {"concurso": 2, "data": "2024-01-03", "dezenas": strings(1..=14)},
            {"concurso": 3, "data": "2024-01-05", "dezenas": strings(11..=25)}
        ]);

        let result = normalizer.normalize(vec![payload, json!(42)]);

        let numbers: Vec<u32> = result.records.iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![1, 3]);
        // the first occurrence of contest 3 wins
        assert_eq!(result.records[1].numbers[0], 1);

        assert_eq!(result.skipped.len(), 2);
        assert_eq!(result.skipped[0].index, 2);
        assert_eq!(result.skipped[0].number, Some(2));
        assert_eq!(result.skipped[1].reason, SkipReason::Duplicate);
        assert_eq!(result.unusable_payloads, 1);
    }

    #[test]
    fn custom_aliases_replace_defaults() {
        let aliases = AliasTable {
            number: vec!["draw".to_string()],
            numbers: vec!["balls".to_string()],
            ..AliasTable::default()
        };
        let normalizer = Normalizer::new(aliases);
        let entry = json!({"draw": 9, "concurso": 1, "data": "2024-01-01", "balls": strings(1..=15)});

        assert_eq!(normalizer.normalize_entry(&entry).unwrap().number, 9);
    }

    #[test]
    fn parse_date_formats() {
        assert_eq!(
            parse_date("2024-12-31"),
            NaiveDate::from_ymd_opt(2024, 12, 31)
        );
        assert_eq!(
            parse_date(" 31/12/2024 "),
            NaiveDate::from_ymd_opt(2024, 12, 31)
        );
        assert_eq!(parse_date("12/31/2024"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn parse_date_drops_time_of_day() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 3);
        assert_eq!(parse_date("2024-01-03T20:00:00"), expected);
        assert_eq!(parse_date("2024-01-03 20:00:00"), expected);
        assert_eq!(parse_date("2024-01-03T20:00:00.000Z"), expected);

        let normalizer = Normalizer::default();
        let entry = json!({
            "concurso": 3,
            "dataApuracao": "2024-01-03 20:00:00",
            "dezenas": strings(1..=15)
        });
        assert_eq!(normalizer.normalize_entry(&entry).unwrap().date, expected.unwrap());
    }
}
