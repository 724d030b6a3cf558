//! Spreadsheet cell values and the single text coercion rule shared by the
//! sheet reader and the translation builder.

use calamine::Data;

/// A decoded spreadsheet cell, independent of the workbook decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Blank,
    /// Anything else the decoder produced (dates, durations, error cells), already rendered.
    Other(String),
}

impl CellValue {
    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Blank)
    }

    /// Blank becomes `""`, integral numbers lose their decimals, everything else
    /// keeps its textual form.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Blank => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    format!("{:.0}", n)
                } else {
                    n.to_string()
                }
            }
            CellValue::Bool(b) => b.to_string(),
            CellValue::Other(s) => s.clone(),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => CellValue::Blank,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => CellValue::Other(dt.to_string()),
            Data::DateTimeIso(s) => CellValue::Other(s.clone()),
            Data::DurationIso(s) => CellValue::Other(s.clone()),
            Data::Error(e) => CellValue::Other(format!("#ERROR: {:?}", e)),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}
