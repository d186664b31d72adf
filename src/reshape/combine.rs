use serde::{Deserialize, Serialize};

use super::LongSeries;

/// Which of two parallel series a record came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesType {
    Nominal,
    Real,
}

impl SeriesType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesType::Nominal => "nominal",
            SeriesType::Real => "real",
        }
    }
}

/// Concatenate two series, tagging every record with the tag of its side.
///
/// No alignment between the two domains is attempted; combinations one side
/// lacks show up as gaps downstream. The value field name is taken from `a`.
pub fn combine(
    a: LongSeries,
    a_tag: SeriesType,
    b: LongSeries,
    b_tag: SeriesType,
) -> LongSeries {
    let mut records = Vec::with_capacity(a.records.len() + b.records.len());
    records.extend(a.records.into_iter().map(|mut r| {
        r.series_type = Some(a_tag);
        r
    }));
    records.extend(b.records.into_iter().map(|mut r| {
        r.series_type = Some(b_tag);
        r
    }));

    LongSeries {
        value_field: a.value_field,
        records,
    }
}
