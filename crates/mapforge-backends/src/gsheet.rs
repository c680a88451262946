//! Google Sheets spreadsheet source
//!
//! Fetches, per dimension, the name range, the coordinate range, and the
//! optional check range in one grid request, converts the typed cells
//! into row-aligned columns, and hands them to the core synthesizer.
//!
//! ```yaml
//! spreadsheet:
//!   type: gsheet
//!   id: 1BxiMVs0XRA5nFMdKvBdBZjgmUUqptlbs74OgvE2upms
//!   dimensions:
//!     overworld:
//!       id: 0
//!       name: Players!A2:A
//!       position: Players!B2:D
//!       check: Players!E2:E
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Deserialize;

use mapforge_core::definition::DefinitionDoc;
use mapforge_core::document::Document;
use mapforge_core::extensions::{OwnerRef, SpreadsheetSource};
use mapforge_core::grid::{ChannelColor, CheckCell, CoordRow, DimensionRows, synthesize};
use mapforge_core::{Error, PlayerMarker, Result};

/// Environment variable consulted when the block carries no `key`
pub const API_KEY_ENV: &str = "GOOGLEAPIKEY";

const SHEETS_ENDPOINT: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Name placed on rows whose name cell is empty
const UNNAMED: &str = "???";

fn extension_error(message: impl Into<String>) -> Error {
    Error::Extension {
        name: "gsheet",
        message: message.into(),
    }
}

/// Typed fields of a `type: gsheet` block
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleSheetConfig {
    /// Spreadsheet identifier from the sheet's URL
    pub id: String,

    /// API key; falls back to the `GOOGLEAPIKEY` environment variable
    #[serde(default)]
    pub key: Option<String>,

    /// Dimensions to fetch, in output order
    pub dimensions: IndexMap<String, DimensionSpec>,
}

/// Ranges fetched for one dimension
#[derive(Debug, Clone, Deserialize)]
pub struct DimensionSpec {
    /// Dimension identifier stamped onto markers
    #[serde(default)]
    pub id: i64,

    /// A1 range of the name column
    pub name: String,

    /// A1 range of the coordinate columns (x, y, z)
    pub position: String,

    /// A1 range of the visibility/color column
    #[serde(default)]
    pub check: Option<String>,
}

/// Marker source backed by the Google Sheets API
pub struct GoogleSheet {
    config: GoogleSheetConfig,
    key: String,
    client: reqwest::Client,
    owner: OwnerRef,
}

/// Construct a [`GoogleSheet`] from a tagged block.
///
/// The API key is required here, at resolution time, so a missing key
/// surfaces before any renderer task runs.
pub fn factory(block: &Document, owner: OwnerRef) -> Result<Arc<dyn SpreadsheetSource>> {
    let config: GoogleSheetConfig = block.typed()?;
    let key = choose_key(config.key.clone(), std::env::var(API_KEY_ENV).ok())?;
    Ok(Arc::new(GoogleSheet {
        config,
        key,
        client: reqwest::Client::new(),
        owner,
    }))
}

fn choose_key(configured: Option<String>, from_env: Option<String>) -> Result<String> {
    configured.or(from_env).ok_or_else(|| Error::Invalid {
        message: format!(
            "no Google Sheets key found; set `key` or the `{}` environment variable",
            API_KEY_ENV
        ),
    })
}

// Subset of the Sheets API grid response the source reads.

#[derive(Debug, Deserialize)]
struct SheetResponse {
    #[serde(default)]
    sheets: Vec<Sheet>,
}

#[derive(Debug, Deserialize)]
struct Sheet {
    #[serde(default)]
    data: Vec<GridData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridData {
    #[serde(default)]
    row_data: Vec<RowData>,
}

#[derive(Debug, Default, Deserialize)]
struct RowData {
    #[serde(default)]
    values: Vec<CellData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CellData {
    formatted_value: Option<String>,
    effective_value: Option<ExtendedValue>,
    user_entered_format: Option<CellFormat>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtendedValue {
    number_value: Option<f64>,
    bool_value: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CellFormat {
    text_format: Option<TextFormat>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextFormat {
    foreground_color: Option<ChannelColor>,
}

impl GoogleSheet {
    async fn fetch_ranges(&self, ranges: &[&str]) -> Result<SheetResponse> {
        let mut query: Vec<(&str, String)> = ranges
            .iter()
            .map(|range| ("ranges", (*range).to_string()))
            .collect();
        query.push(("includeGridData", "true".to_string()));
        query.push(("key", self.key.clone()));

        let url = format!("{}/{}", SHEETS_ENDPOINT, self.config.id);
        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| extension_error(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(extension_error(format!("API returned {}", status)));
        }

        response
            .json::<SheetResponse>()
            .await
            .map_err(|e| extension_error(format!("malformed grid response: {}", e)))
    }
}

/// Convert one dimension's grid response into row-aligned columns.
///
/// All requested ranges must land on a single sheet; the grids come back
/// in request order (name, position, then check when requested).
fn dimension_rows(spec: &DimensionSpec, response: SheetResponse) -> Result<DimensionRows> {
    let mut sheets = response.sheets;
    let sheet = match sheets.pop() {
        Some(sheet) if sheets.is_empty() => sheet,
        _ => return Err(extension_error("expected all ranges on a single sheet")),
    };

    let mut grids = sheet.data.into_iter();
    let name_grid = grids
        .next()
        .ok_or_else(|| extension_error("name range missing from response"))?;
    let position_grid = grids
        .next()
        .ok_or_else(|| extension_error("position range missing from response"))?;
    let check_grid = if spec.check.is_some() {
        Some(grids.next().ok_or_else(|| {
            extension_error("check range missing from response")
        })?)
    } else {
        None
    };

    let names = name_grid
        .row_data
        .iter()
        .map(|row| {
            row.values
                .first()
                .and_then(|cell| cell.formatted_value.clone())
                .unwrap_or_else(|| UNNAMED.to_string())
        })
        .collect();

    let coords = position_grid
        .row_data
        .iter()
        .map(|row| {
            if row.values.is_empty() {
                None
            } else {
                Some(CoordRow {
                    x: number_at(row, 0),
                    y: number_at(row, 1),
                    z: number_at(row, 2),
                })
            }
        })
        .collect();

    let checks = check_grid.map(|grid| {
        grid.row_data
            .iter()
            .map(|row| row.values.first().map(check_cell))
            .collect()
    });

    Ok(DimensionRows {
        dimension_id: spec.id,
        names,
        coords,
        checks,
    })
}

fn number_at(row: &RowData, index: usize) -> Option<f64> {
    row.values
        .get(index)
        .and_then(|cell| cell.effective_value.as_ref())
        .and_then(|value| value.number_value)
}

fn check_cell(cell: &CellData) -> CheckCell {
    CheckCell {
        flag: cell
            .effective_value
            .as_ref()
            .and_then(|value| value.bool_value),
        text: cell.formatted_value.clone(),
        color: cell
            .user_entered_format
            .as_ref()
            .and_then(|format| format.text_format.as_ref())
            .and_then(|text| text.foreground_color),
    }
}

#[async_trait]
impl SpreadsheetSource for GoogleSheet {
    fn owner(&self) -> &OwnerRef {
        &self.owner
    }

    async fn fetch_markers(
        &self,
        _context: Option<&Arc<DefinitionDoc>>,
    ) -> Result<Vec<PlayerMarker>> {
        let mut dimensions = Vec::with_capacity(self.config.dimensions.len());

        for (dimension_name, spec) in &self.config.dimensions {
            let mut ranges = vec![spec.name.as_str(), spec.position.as_str()];
            if let Some(check) = &spec.check {
                ranges.push(check.as_str());
            }

            tracing::debug!("Fetching '{}' ranges: {:?}", dimension_name, ranges);
            let response = self.fetch_ranges(&ranges).await?;
            dimensions.push(dimension_rows(spec, response)?);
        }

        let markers = synthesize(&dimensions);
        tracing::info!("Found {} markers", markers.len());
        Ok(markers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(check: bool) -> DimensionSpec {
        DimensionSpec {
            id: 7,
            name: "Players!A2:A".to_string(),
            position: "Players!B2:D".to_string(),
            check: check.then(|| "Players!E2:E".to_string()),
        }
    }

    // One dimension, three ranges: names, positions, checks.
    const GRID_RESPONSE: &str = r#"{
      "sheets": [
        {
          "data": [
            {
              "rowData": [
                {"values": [{"formattedValue": "Alice"}]},
                {"values": [{}]},
                {"values": [{"formattedValue": "Carol"}]}
              ]
            },
            {
              "rowData": [
                {"values": [
                  {"effectiveValue": {"numberValue": 10}},
                  {"effectiveValue": {"numberValue": 64}},
                  {"effectiveValue": {"numberValue": 20}}
                ]},
                {"values": [
                  {"formattedValue": "not a number"},
                  {"effectiveValue": {"numberValue": 1}},
                  {"effectiveValue": {"numberValue": 2}}
                ]},
                {"values": [
                  {"effectiveValue": {"numberValue": -3.25}},
                  {"effectiveValue": {"numberValue": 70}},
                  {"effectiveValue": {"numberValue": 4.5}}
                ]}
              ]
            },
            {
              "rowData": [
                {"values": [{
                  "effectiveValue": {"boolValue": true},
                  "userEnteredFormat": {"textFormat": {"foregroundColor": {"red": 1, "green": 0.5}}}
                }]},
                {},
                {"values": [{"formattedValue": "  "}]}
              ]
            }
          ]
        }
      ]
    }"#;

    #[test]
    fn test_parse_gsheet_block() {
        let block = Document::from_yaml(
            r#"
type: gsheet
id: sheet-id
key: secret
dimensions:
  overworld:
    id: 0
    name: Players!A2:A
    position: Players!B2:D
    check: Players!E2:E
  nether:
    id: 1
    name: Nether!A2:A
    position: Nether!B2:D
"#,
        )
        .unwrap();
        let config: GoogleSheetConfig = block.typed().unwrap();
        assert_eq!(config.id, "sheet-id");
        let names: Vec<&String> = config.dimensions.keys().collect();
        assert_eq!(names, vec!["overworld", "nether"]);
        assert!(config.dimensions["nether"].check.is_none());
    }

    #[test]
    fn test_missing_id_is_a_config_error() {
        let block = Document::from_yaml("type: gsheet\nkey: secret\ndimensions: {}\n").unwrap();
        assert!(block.typed::<GoogleSheetConfig>().is_err());
    }

    #[test]
    fn test_choose_key_prefers_configuration() {
        let key = choose_key(Some("from-config".into()), Some("from-env".into())).unwrap();
        assert_eq!(key, "from-config");
        let key = choose_key(None, Some("from-env".into())).unwrap();
        assert_eq!(key, "from-env");
    }

    #[test]
    fn test_choose_key_neither_is_an_error() {
        assert!(matches!(choose_key(None, None), Err(Error::Invalid { .. })));
    }

    #[test]
    fn test_dimension_rows_from_grid_response() {
        let response: SheetResponse = serde_json::from_str(GRID_RESPONSE).unwrap();
        let rows = dimension_rows(&spec(true), response).unwrap();

        assert_eq!(rows.dimension_id, 7);
        assert_eq!(rows.names, vec!["Alice", "???", "Carol"]);

        // row 1's x cell holds text, not a number
        assert_eq!(rows.coords[0].unwrap().x, Some(10.0));
        assert_eq!(rows.coords[1].unwrap().x, None);
        assert_eq!(rows.coords[2].unwrap().z, Some(4.5));

        let checks = rows.checks.as_ref().unwrap();
        let first = checks[0].as_ref().unwrap();
        assert_eq!(first.flag, Some(true));
        assert_eq!(first.color.unwrap().to_hex(), "#ff7f00");
        assert!(checks[1].is_none());
        let third = checks[2].as_ref().unwrap();
        assert_eq!(third.flag, None);
        assert!(!third.visible());
    }

    #[test]
    fn test_grid_response_synthesizes_markers() {
        let response: SheetResponse = serde_json::from_str(GRID_RESPONSE).unwrap();
        let rows = dimension_rows(&spec(true), response).unwrap();
        let markers = synthesize(&[rows]);

        // the text-coordinate row is skipped
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].name.as_deref(), Some("Alice"));
        assert_eq!(markers[0].position, [10.5, 64.0, 20.5]);
        assert_eq!(markers[0].color.as_deref(), Some("#ff7f00"));
        assert!(markers[0].visible);
        assert_eq!(markers[1].name.as_deref(), Some("Carol"));
        assert_eq!(markers[1].position, [-3.25, 70.0, 4.5]);
        assert!(!markers[1].visible);
    }

    #[test]
    fn test_check_column_not_requested_is_not_expected() {
        let response: SheetResponse = serde_json::from_str(GRID_RESPONSE).unwrap();
        // drop the third grid to mimic a two-range request
        let trimmed = SheetResponse {
            sheets: response
                .sheets
                .into_iter()
                .map(|mut sheet| {
                    sheet.data.truncate(2);
                    sheet
                })
                .collect(),
        };
        let rows = dimension_rows(&spec(false), trimmed).unwrap();
        assert!(rows.checks.is_none());
    }

    #[test]
    fn test_multiple_sheets_rejected() {
        let response = SheetResponse {
            sheets: vec![Sheet { data: vec![] }, Sheet { data: vec![] }],
        };
        assert!(dimension_rows(&spec(false), response).is_err());
    }

    #[test]
    fn test_missing_position_range_rejected() {
        let response = SheetResponse {
            sheets: vec![Sheet {
                data: vec![GridData { row_data: vec![] }],
            }],
        };
        let err = dimension_rows(&spec(false), response).unwrap_err();
        assert!(matches!(err, Error::Extension { name: "gsheet", .. }));
    }
}
