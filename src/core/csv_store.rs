//! Reading, rendering and merging the contest CSV.

use crate::domain::model::{ContestRecord, StoreState};
use crate::utils::error::{EtlError, Result};

pub const HEADER: [&str; 17] = [
    "concurso", "data", "d1", "d2", "d3", "d4", "d5", "d6", "d7", "d8", "d9", "d10", "d11", "d12",
    "d13", "d14", "d15",
];

/// Builds a [`StoreState`] from the current file content.
///
/// Only the header, the column count and the contest number column are
/// checked; drawn numbers may be zero-padded or plain.
pub fn parse_store(content: &str) -> Result<StoreState> {
    let mut state = StoreState {
        exists: true,
        content: content.to_string(),
        ..StoreState::default()
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut seen_header = false;
    let mut previous = 0u32;

    for row in reader.records() {
        let row = row?;
        let line = row.position().map_or(0, |p| p.line());

        if !seen_header {
            if !row.iter().eq(HEADER.iter().copied()) {
                return Err(EtlError::StoreError {
                    line,
                    message: format!("unexpected header, expected '{}'", HEADER.join(",")),
                });
            }
            seen_header = true;
            continue;
        }

        if row.len() != HEADER.len() {
            return Err(EtlError::StoreError {
                line,
                message: format!("expected {} columns, found {}", HEADER.len(), row.len()),
            });
        }

        let number = row
            .get(0)
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .filter(|n| *n > 0)
            .ok_or_else(|| EtlError::StoreError {
                line,
                message: format!("invalid contest number '{}'", row.get(0).unwrap_or("")),
            })?;

        if number <= previous {
            tracing::warn!(
                "⚠️ Store line {}: contest {} does not follow {}",
                line,
                number,
                previous
            );
        }
        previous = number;
        state.last_number = state.last_number.max(number);
        state.rows += 1;
    }

    Ok(state)
}

fn row(record: &ContestRecord) -> Vec<String> {
    let mut fields = Vec::with_capacity(HEADER.len());
    fields.push(record.number.to_string());
    fields.push(record.iso_date());
    fields.extend(record.numbers.iter().map(|n| format!("{:02}", n)));
    fields
}

/// Renders records as CSV text, `\n`-terminated, numbers zero-padded.
pub fn render(records: &[ContestRecord], with_header: bool) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    if with_header {
        writer.write_record(HEADER)?;
    }
    for record in records {
        writer.write_record(row(record))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| EtlError::ProcessingError {
        message: format!("rendered CSV is not UTF-8: {}", e),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Replace,
    Append,
}

/// A pending write against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    pub mode: WriteMode,
    pub data: String,
    pub rows: usize,
    pub last_number: u32,
}

impl StoreChange {
    pub fn apply_to(&self, store: &mut StoreState) {
        match self.mode {
            WriteMode::Replace => {
                store.content = self.data.clone();
                store.rows = self.rows;
            }
            WriteMode::Append => {
                store.content.push_str(&self.data);
                store.rows += self.rows;
            }
        }
        store.exists = true;
        store.last_number = self.last_number;
    }
}

/// Whole-file rewrite. `None` when nothing normalized or the rendered
/// content is byte-identical to the store.
pub fn full_refresh(store: &StoreState, records: &[ContestRecord]) -> Result<Option<StoreChange>> {
    let Some(last) = records.last() else {
        return Ok(None);
    };

    let data = render(records, true)?;
    if data == store.content {
        return Ok(None);
    }

    Ok(Some(StoreChange {
        mode: WriteMode::Replace,
        data,
        rows: records.len(),
        last_number: last.number,
    }))
}

/// Appends records newer than the stored maximum. `records` must be
/// ascending and unique, as produced by the normalizer.
pub fn incremental(store: &StoreState, records: &[ContestRecord]) -> Result<Option<StoreChange>> {
    let fresh: Vec<ContestRecord> = records
        .iter()
        .filter(|r| r.number > store.last_number)
        .cloned()
        .collect();

    let stale = records.len() - fresh.len();
    if stale > 0 {
        tracing::debug!(
            "Ignoring {} contest(s) at or below stored contest {}",
            stale,
            store.last_number
        );
    }

    let Some(last) = fresh.last() else {
        return Ok(None);
    };
    let last_number = last.number;

    if store.is_empty() {
        return Ok(Some(StoreChange {
            mode: WriteMode::Replace,
            data: render(&fresh, true)?,
            rows: fresh.len(),
            last_number,
        }));
    }

    let mut data = String::new();
    if !store.content.ends_with('\n') {
        data.push('\n');
    }
    data.push_str(&render(&fresh, false)?);

    Ok(Some(StoreChange {
        mode: WriteMode::Append,
        data,
        rows: fresh.len(),
        last_number,
    }))
}
