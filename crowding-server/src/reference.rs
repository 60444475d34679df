//! Static station and line reference data.
//!
//! Maps each station to the lines serving it (in display order) and each
//! line to its display name and colour. Loaded once at startup and shared
//! read-only afterwards.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{LineCode, StationCode};

/// Reference table compiled into the binary.
const BUILTIN_REFERENCE: &str = include_str!("../data/reference.json");

/// Colour used for lines missing from the reference table.
pub const DEFAULT_LINE_COLOR: &str = "#666666";

/// Errors loading reference data.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid reference data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Display information for a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineInfo {
    pub name: String,
    pub color: String,
}

/// A station and the lines serving it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationInfo {
    pub code: StationCode,
    pub name: String,
    pub lines: Vec<LineCode>,
}

#[derive(Debug, Deserialize)]
struct LineEntry {
    code: LineCode,
    name: String,
    color: String,
}

#[derive(Debug, Deserialize)]
struct ReferenceFile {
    lines: Vec<LineEntry>,
    stations: Vec<StationInfo>,
}

/// Immutable reference tables.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    stations: HashMap<StationCode, StationInfo>,
    lines: HashMap<LineCode, LineInfo>,
}

impl ReferenceData {
    /// The built-in network table.
    pub fn builtin() -> Result<Self, ReferenceError> {
        Self::from_json(BUILTIN_REFERENCE)
    }

    /// Load a table from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReferenceError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ReferenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, ReferenceError> {
        let file: ReferenceFile = serde_json::from_str(json)?;

        let lines = file
            .lines
            .into_iter()
            .map(|l| {
                (
                    l.code,
                    LineInfo {
                        name: l.name,
                        color: l.color,
                    },
                )
            })
            .collect();

        let stations = file.stations.into_iter().map(|s| (s.code, s)).collect();

        Ok(Self { stations, lines })
    }

    /// Lines serving `station`, in display order. Unknown stations have none.
    pub fn lines_for(&self, station: StationCode) -> &[LineCode] {
        self.stations
            .get(&station)
            .map(|s| s.lines.as_slice())
            .unwrap_or(&[])
    }

    pub fn station(&self, station: StationCode) -> Option<&StationInfo> {
        self.stations.get(&station)
    }

    /// Display name of `station`, falling back to its code.
    pub fn station_name(&self, station: StationCode) -> String {
        self.stations
            .get(&station)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| station.to_string())
    }

    /// Display info of `line`, with a neutral fallback for unknown lines.
    pub fn line_info(&self, line: LineCode) -> LineInfo {
        self.lines.get(&line).cloned().unwrap_or_else(|| LineInfo {
            name: line.to_string(),
            color: DEFAULT_LINE_COLOR.to_string(),
        })
    }

    /// All stations, ordered by code.
    pub fn stations(&self) -> Vec<&StationInfo> {
        let mut all: Vec<_> = self.stations.values().collect();
        all.sort_by_key(|s| s.code);
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn code(s: &str) -> StationCode {
        StationCode::parse(s).unwrap()
    }

    fn line(s: &str) -> LineCode {
        LineCode::parse(s).unwrap()
    }

    #[test]
    fn builtin_table_loads() {
        let reference = ReferenceData::builtin().unwrap();
        assert_eq!(reference.stations().len(), 97);
        assert_eq!(
            reference.lines_for(code("ADM")),
            &[line("TWL"), line("ISL"), line("EAL"), line("SIL")]
        );
        assert_eq!(reference.lines_for(code("CEN")), &[line("ISL"), line("TWL")]);
        assert_eq!(reference.station_name(code("HOK")), "Hong Kong");
        assert_eq!(reference.lines_for(code("MEF")).len(), 2);
        assert_eq!(reference.lines_for(code("KET")), &[line("ISL")]);
    }

    #[test]
    fn unknown_station_has_no_lines() {
        let reference = ReferenceData::builtin().unwrap();
        assert!(reference.lines_for(code("XYZ")).is_empty());
        assert_eq!(reference.station_name(code("XYZ")), "XYZ");
        assert!(reference.station(code("XYZ")).is_none());
    }

    #[test]
    fn line_info_fallback() {
        let reference = ReferenceData::builtin().unwrap();
        assert_eq!(
            reference.line_info(line("ISL")),
            LineInfo {
                name: "Island Line".into(),
                color: "#007DC5".into()
            }
        );
        let unknown = reference.line_info(line("NOL"));
        assert_eq!(unknown.name, "NOL");
        assert_eq!(unknown.color, DEFAULT_LINE_COLOR);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r##"{{
                "lines": [{{"code": "AAA", "name": "Alpha Line", "color": "#111111"}}],
                "stations": [{{"code": "XAA", "name": "Alpha", "lines": ["AAA"]}}]
            }}"##
        )
        .unwrap();

        let reference = ReferenceData::load(file.path()).unwrap();
        assert_eq!(reference.lines_for(code("XAA")), &[line("AAA")]);
        assert_eq!(reference.line_info(line("AAA")).name, "Alpha Line");
    }

    #[test]
    fn load_missing_file() {
        let err = ReferenceData::load("/nonexistent/reference.json").unwrap_err();
        assert!(matches!(err, ReferenceError::Io { .. }));
    }

    #[test]
    fn reject_invalid_codes() {
        let json = r#"{"lines": [], "stations": [{"code": "central", "name": "Central", "lines": []}]}"#;
        assert!(matches!(
            ReferenceData::from_json(json),
            Err(ReferenceError::Json(_))
        ));
    }
}
