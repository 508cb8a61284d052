use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::geometry::Rect;

/// A page-local coordinate held at two decimal places.
///
/// Serialised as text (`"10.00"`) so a saved template does not drift through
/// float formatting; numbers are accepted on input.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Coord(f64);

impl Coord {
    pub fn new(value: f64) -> Self {
        if !value.is_finite() {
            return Coord(0.0);
        }
        let rounded = (value * 100.0).round() / 100.0;
        // -0.00 formats badly
        Coord(if rounded == 0.0 { 0.0 } else { rounded })
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<f64> for Coord {
    fn from(v: f64) -> Self {
        Coord::new(v)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Serialize for Coord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Coord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Coord::new(n)),
            Raw::Text(s) if s.trim().is_empty() => Ok(Coord::default()),
            Raw::Text(s) => s
                .trim()
                .parse::<f64>()
                .map(Coord::new)
                .map_err(|_| serde::de::Error::custom(format!("invalid coordinate {s:?}"))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    #[default]
    String,
    Date,
    Number,
    Currency,
}

impl ParamType {
    pub const ALL: [ParamType; 4] = [ParamType::String, ParamType::Date, ParamType::Number, ParamType::Currency];

    pub fn as_str(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Date => "date",
            ParamType::Number => "number",
            ParamType::Currency => "currency",
        }
    }
}

impl FromStr for ParamType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParamType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown parameter type {s:?}"))
    }
}

/// Where a parameter lives: on one page of a multi-page document, or on the
/// single image of a standalone section.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Anchor {
    #[default]
    Standalone,
    Page(u32),
}

impl Anchor {
    pub fn page(self) -> Option<u32> {
        match self {
            Anchor::Standalone => None,
            Anchor::Page(p) => Some(p),
        }
    }
}

/// A named, typed rectangular extraction field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "ParameterRecord", into = "ParameterRecord")]
pub struct Parameter {
    pub id: String,
    pub param_type: ParamType,
    pub is_multiline: bool,
    pub x1: Coord,
    pub y1: Coord,
    pub x2: Coord,
    pub y2: Coord,
    pub anchor: Anchor,
}

impl Parameter {
    /// Build a parameter from any two opposite corners; the stored corners are
    /// always top-left / bottom-right.
    pub fn from_corners(id: impl Into<String>, a: (f64, f64), b: (f64, f64), anchor: Anchor) -> Self {
        Self {
            id: id.into(),
            param_type: ParamType::default(),
            is_multiline: false,
            x1: Coord::new(a.0.min(b.0)),
            y1: Coord::new(a.1.min(b.1)),
            x2: Coord::new(a.0.max(b.0)),
            y2: Coord::new(a.1.max(b.1)),
            anchor,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_corners(
            (self.x1.value(), self.y1.value()),
            (self.x2.value(), self.y2.value()),
        )
    }

    pub fn page(&self) -> Option<u32> {
        self.anchor.page()
    }

    pub fn apply(&mut self, field: ParamField) {
        match field {
            ParamField::Id(id) => self.id = id,
            ParamField::Type(t) => self.param_type = t,
            ParamField::Multiline(m) => self.is_multiline = m,
        }
    }
}

/// The user-editable columns of a parameter row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamField {
    Id(String),
    Type(ParamType),
    Multiline(bool),
}

/// Wire shape of a parameter. `page` is only written for document-backed
/// parameters.
#[derive(Serialize, Deserialize)]
struct ParameterRecord {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default)]
    param_type: ParamType,
    #[serde(default)]
    x1: Coord,
    #[serde(default)]
    y1: Coord,
    #[serde(default)]
    x2: Coord,
    #[serde(default)]
    y2: Coord,
    #[serde(rename = "isMultiline", default)]
    is_multiline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
}

impl From<ParameterRecord> for Parameter {
    fn from(r: ParameterRecord) -> Self {
        Self {
            id: r.id,
            param_type: r.param_type,
            is_multiline: r.is_multiline,
            x1: r.x1,
            y1: r.y1,
            x2: r.x2,
            y2: r.y2,
            anchor: r.page.map_or(Anchor::Standalone, Anchor::Page),
        }
    }
}

impl From<Parameter> for ParameterRecord {
    fn from(p: Parameter) -> Self {
        Self {
            id: p.id,
            param_type: p.param_type,
            x1: p.x1,
            y1: p.y1,
            x2: p.x2,
            y2: p.y2,
            is_multiline: p.is_multiline,
            page: p.anchor.page(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coord_rounds_to_two_places() {
        assert_eq!(Coord::new(10.004).to_string(), "10.00");
        assert_eq!(Coord::new(10.006).value(), 10.01);
        assert_eq!(Coord::new(-0.001).to_string(), "0.00");
        assert_eq!(Coord::new(f64::NAN), Coord::default());
    }

    #[test]
    fn corners_are_normalised() {
        let p = Parameter::from_corners("a", (110.0, 70.0), (10.0, 20.0), Anchor::Standalone);
        assert_eq!((p.x1.value(), p.y1.value(), p.x2.value(), p.y2.value()), (10.0, 20.0, 110.0, 70.0));
        assert_eq!(p.rect().width, 100.0);
    }

    #[test]
    fn standalone_parameter_has_no_page_on_the_wire() {
        let p = Parameter::from_corners("Param 1", (10.0, 20.0), (110.0, 70.0), Anchor::Standalone);
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(
            v,
            json!({"id": "Param 1", "type": "string", "x1": "10.00", "y1": "20.00",
                   "x2": "110.00", "y2": "70.00", "isMultiline": false})
        );
    }

    #[test]
    fn page_anchor_round_trips() {
        let mut p = Parameter::from_corners("total", (1.0, 2.0), (30.5, 40.25), Anchor::Page(3));
        p.apply(ParamField::Type(ParamType::Currency));
        let text = serde_json::to_string(&p).unwrap();
        assert!(text.contains("\"page\":3"));
        let back: Parameter = serde_json::from_str(&text).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn numeric_and_missing_fields_are_accepted() {
        let p: Parameter = serde_json::from_value(json!({"id": "x", "x1": 3.14159, "y2": "7"})).unwrap();
        assert_eq!(p.x1.to_string(), "3.14");
        assert_eq!(p.y1, Coord::default());
        assert_eq!(p.y2.value(), 7.0);
        assert_eq!(p.param_type, ParamType::String);
        assert!(!p.is_multiline);
    }

    #[test]
    fn bad_coordinate_text_is_an_error() {
        let r: Result<Parameter, _> = serde_json::from_value(json!({"id": "x", "x1": "wide"}));
        assert!(r.is_err());
    }

    #[test]
    fn param_type_parses() {
        assert_eq!("date".parse::<ParamType>(), Ok(ParamType::Date));
        assert!("money".parse::<ParamType>().is_err());
    }
}
