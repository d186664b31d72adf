// src/chart/mod.rs

//! Declarative line-chart specs (Vega-Lite v5) built from long series.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::reshape::LongSeries;

pub const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

pub const SECTOR_FIELD: &str = "sector";
pub const YEAR_FIELD: &str = "year";
pub const SERIES_FIELD: &str = "type";

/// d3-format strings used for axes and tooltips.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumberFormat {
    /// Thousands-separated integer, for currency.
    Thousands,
    /// One decimal place, for percentages.
    OneDecimal,
}

impl NumberFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            NumberFormat::Thousands => ",.0f",
            NumberFormat::OneDecimal => ".1f",
        }
    }
}

/// Which record fields drive which visual channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Encoding {
    pub x: String,
    pub y: String,
    pub color: String,
    pub stroke_dash: Option<String>,
    pub tooltip: Vec<String>,
    pub format: NumberFormat,
}

impl Encoding {
    /// Year on x, `value_field` on y, one colored line per sector.
    pub fn lines(value_field: &str, format: NumberFormat) -> Self {
        Self {
            x: YEAR_FIELD.into(),
            y: value_field.into(),
            color: SECTOR_FIELD.into(),
            stroke_dash: None,
            tooltip: vec![SECTOR_FIELD.into(), YEAR_FIELD.into(), value_field.into()],
            format,
        }
    }

    /// Distinguish series by dash pattern; the field joins the tooltip after the sector.
    pub fn dashed_by(mut self, field: &str) -> Self {
        self.stroke_dash = Some(field.into());
        if !self.tooltip.iter().any(|f| f == field) {
            let at = self.tooltip.len().min(1);
            self.tooltip.insert(at, field.into());
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    #[serde(rename = "$schema")]
    pub schema: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    pub width: String,
    pub data: InlineData,
    pub mark: Mark,
    pub encoding: Channels,
    pub params: Vec<Param>,
}

impl ChartSpec {
    pub fn with_title(mut self, text: impl Into<String>, subtitle: Option<String>) -> Self {
        self.title = Some(Title {
            text: text.into(),
            subtitle,
        });
        self
    }

    pub fn row_count(&self) -> usize {
        self.data.values.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineData {
    pub values: Vec<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub kind: String,
    pub point: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Ordinal,
    Quantitative,
    Nominal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDef {
    pub field: String,
    #[serde(rename = "type")]
    pub kind: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl FieldDef {
    fn new(field: &str, kind: FieldType) -> Self {
        Self {
            field: field.to_string(),
            kind,
            axis: None,
            format: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Channels {
    pub x: FieldDef,
    pub y: FieldDef,
    pub color: FieldDef,
    #[serde(rename = "strokeDash", skip_serializing_if = "Option::is_none")]
    pub stroke_dash: Option<FieldDef>,
    pub tooltip: Vec<FieldDef>,
}

/// Interval selection bound to the scales: drag to pan, wheel to zoom.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub select: String,
    pub bind: String,
}

impl Param {
    fn pan_zoom() -> Self {
        Self {
            name: "grid".into(),
            select: "interval".into(),
            bind: "scales".into(),
        }
    }
}

/// Map a long series onto a line chart spec. No validation happens here;
/// missing (sector, year) combinations simply render as gaps.
pub fn to_chart_spec(series: &LongSeries, encoding: &Encoding) -> ChartSpec {
    let values = series
        .records
        .iter()
        .map(|r| {
            let mut row = Map::new();
            row.insert(SECTOR_FIELD.into(), Value::from(r.sector.as_str()));
            row.insert(YEAR_FIELD.into(), Value::from(r.year));
            // non-finite values serialize as null
            row.insert(series.value_field.clone(), Value::from(r.value));
            if let Some(t) = r.series_type {
                row.insert(SERIES_FIELD.into(), Value::from(t.as_str()));
            }
            row
        })
        .collect();

    let format = encoding.format.as_str();
    let field_type = |field: &str| {
        if field == encoding.y {
            FieldType::Quantitative
        } else if field == encoding.x {
            FieldType::Ordinal
        } else {
            FieldType::Nominal
        }
    };

    let mut y = FieldDef::new(&encoding.y, FieldType::Quantitative);
    y.axis = Some(Axis {
        format: format.to_string(),
    });

    let tooltip = encoding
        .tooltip
        .iter()
        .map(|field| {
            let mut def = FieldDef::new(field, field_type(field.as_str()));
            if *field == encoding.y {
                def.format = Some(format.to_string());
            }
            def
        })
        .collect();

    ChartSpec {
        schema: VEGA_LITE_SCHEMA.into(),
        title: None,
        width: "container".into(),
        data: InlineData { values },
        mark: Mark {
            kind: "line".into(),
            point: true,
        },
        encoding: Channels {
            x: FieldDef::new(&encoding.x, FieldType::Ordinal),
            y,
            color: FieldDef::new(&encoding.color, FieldType::Nominal),
            stroke_dash: encoding
                .stroke_dash
                .as_deref()
                .map(|f| FieldDef::new(f, FieldType::Nominal)),
            tooltip,
        },
        params: vec![Param::pan_zoom()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reshape::{LongRecord, SeriesType};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn salary_chart_json() {
        let series = LongSeries {
            value_field: "salary".into(),
            records: vec![LongRecord::new("Mining", 2001, 6.0)],
        };
        let spec = to_chart_spec(&series, &Encoding::lines("salary", NumberFormat::Thousands))
            .with_title("Nominal salary", None);

        assert_eq!(
            serde_json::to_value(&spec).unwrap(),
            json!({
                "$schema": VEGA_LITE_SCHEMA,
                "title": {"text": "Nominal salary"},
                "width": "container",
                "data": {"values": [{"sector": "Mining", "year": 2001, "salary": 6.0}]},
                "mark": {"type": "line", "point": true},
                "encoding": {
                    "x": {"field": "year", "type": "ordinal"},
                    "y": {"field": "salary", "type": "quantitative", "axis": {"format": ",.0f"}},
                    "color": {"field": "sector", "type": "nominal"},
                    "tooltip": [
                        {"field": "sector", "type": "nominal"},
                        {"field": "year", "type": "ordinal"},
                        {"field": "salary", "type": "quantitative", "format": ",.0f"}
                    ]
                },
                "params": [{"name": "grid", "select": "interval", "bind": "scales"}]
            })
        );
    }

    #[test]
    fn growth_chart_is_dashed_by_series_type() {
        let series = LongSeries {
            value_field: "growth".into(),
            records: vec![LongRecord {
                sector: "A".into(),
                year: 2001,
                value: 2.0,
                series_type: Some(SeriesType::Real),
            }],
        };
        let enc = Encoding::lines("growth", NumberFormat::OneDecimal).dashed_by(SERIES_FIELD);
        assert_eq!(enc.tooltip, vec!["sector", "type", "year", "growth"]);

        let json = serde_json::to_value(to_chart_spec(&series, &enc)).unwrap();
        assert_eq!(json["encoding"]["strokeDash"], json!({"field": "type", "type": "nominal"}));
        assert_eq!(json["encoding"]["tooltip"][3]["format"], json!(".1f"));
        assert_eq!(json["data"]["values"][0]["type"], json!("real"));
    }

    #[test]
    fn nan_values_become_null() {
        let series = LongSeries {
            value_field: "growth".into(),
            records: vec![LongRecord::new("A", 2000, f64::NAN)],
        };
        let spec = to_chart_spec(&series, &Encoding::lines("growth", NumberFormat::OneDecimal));
        assert_eq!(spec.data.values[0]["growth"], Value::Null);
        assert_eq!(spec.row_count(), 1);
    }
}
