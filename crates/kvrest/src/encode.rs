use crate::error::Error;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use kvrest_core::multiget::{CellModel, ResultSet, RowModel};
use serde::Serialize;
use std::fmt::Write as _;

pub const MIME_JSON: &str = "application/json";
pub const MIME_CANDID: &str = "application/candid";
pub const MIME_TEXT: &str = "text/plain";

///
/// Encoder
///
/// Turns a format-neutral result set into a response body.
///

pub trait Encoder: Sync {
    fn content_type(&self) -> &'static str;

    fn encode(&self, rows: &ResultSet) -> Result<Vec<u8>, Error>;
}

///
/// JsonEncoder
///
/// REST cell set shape: binary keys, columns and values travel as standard
/// base64; `$` holds the cell value.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct JsonEncoder;

#[derive(Serialize)]
struct JsonCellSet {
    #[serde(rename = "Row")]
    rows: Vec<JsonRow>,
}

#[derive(Serialize)]
struct JsonRow {
    key: String,
    #[serde(rename = "Cell")]
    cells: Vec<JsonCell>,
}

#[derive(Serialize)]
struct JsonCell {
    column: String,
    timestamp: u64,
    #[serde(rename = "$")]
    value: String,
}

impl From<&CellModel> for JsonCell {
    fn from(cell: &CellModel) -> Self {
        Self {
            column: STANDARD.encode(&cell.column),
            timestamp: cell.timestamp,
            value: STANDARD.encode(&cell.value),
        }
    }
}

impl From<&RowModel> for JsonRow {
    fn from(row: &RowModel) -> Self {
        Self {
            key: STANDARD.encode(&row.key),
            cells: row.cells.iter().map(JsonCell::from).collect(),
        }
    }
}

impl Encoder for JsonEncoder {
    fn content_type(&self) -> &'static str {
        MIME_JSON
    }

    fn encode(&self, rows: &ResultSet) -> Result<Vec<u8>, Error> {
        let body = JsonCellSet {
            rows: rows.iter().map(JsonRow::from).collect(),
        };

        serde_json::to_vec(&body).map_err(|err| Error::encode(err.to_string()))
    }
}

///
/// CandidEncoder
///

#[derive(Clone, Copy, Debug, Default)]
pub struct CandidEncoder;

impl Encoder for CandidEncoder {
    fn content_type(&self) -> &'static str {
        MIME_CANDID
    }

    fn encode(&self, rows: &ResultSet) -> Result<Vec<u8>, Error> {
        candid::encode_one(rows).map_err(|err| Error::encode(err.to_string()))
    }
}

///
/// TextEncoder
///
/// One line per cell: `key column timestamp value`, bytes rendered lossily
/// as UTF-8.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct TextEncoder;

impl Encoder for TextEncoder {
    fn content_type(&self) -> &'static str {
        MIME_TEXT
    }

    fn encode(&self, rows: &ResultSet) -> Result<Vec<u8>, Error> {
        let mut out = String::new();
        for row in rows {
            let key = String::from_utf8_lossy(&row.key);
            for cell in &row.cells {
                let _ = write!(
                    out,
                    "{key} {} {} {}\r\n",
                    String::from_utf8_lossy(&cell.column),
                    cell.timestamp,
                    String::from_utf8_lossy(&cell.value),
                );
            }
        }

        Ok(out.into_bytes())
    }
}

static JSON: JsonEncoder = JsonEncoder;
static CANDID: CandidEncoder = CandidEncoder;
static TEXT: TextEncoder = TextEncoder;

/// Pick the encoder for an `Accept` header value.
///
/// Media ranges are tried in listed order; parameters (`;q=...`) are ignored.
/// A missing or empty value and `*/*` select JSON.
pub fn encoder_for_accept(accept: Option<&str>) -> Result<&'static dyn Encoder, Error> {
    let Some(accept) = accept.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(&JSON);
    };

    for range in accept.split(',') {
        let media = range
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match media.as_str() {
            MIME_JSON | "application/*" | "*/*" => return Ok(&JSON),
            MIME_CANDID => return Ok(&CANDID),
            MIME_TEXT | "text/*" => return Ok(&TEXT),
            _ => {}
        }
    }

    Err(Error::not_acceptable(accept))
}

///
/// TESTS
///
