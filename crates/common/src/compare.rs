//! Side-by-side vehicle comparison
//!
//! Two vehicles rarely list the same parameters, in the same order, under the
//! same spelling. Rows are joined on the normalized (trimmed, lower-cased)
//! parameter name, section by section:
//!
//! - a section is dropped only when both vehicles have no parameters in it
//! - names are collected in the first vehicle's order, then any new names
//!   from the second vehicle
//! - within one list the first occurrence of a name wins
//! - a row is dropped when neither side has a value; a missing side renders
//!   as [`MISSING_VALUE`]

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::vehicle::{Parameter, SpecSection, Specifications, Vehicle};

/// Placeholder rendered for a side that has no value.
pub const MISSING_VALUE: &str = "-";

/// Normalized join key for a parameter name.
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// One aligned parameter row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignedRow {
    pub name: String,
    pub first: Option<String>,
    pub second: Option<String>,
}

impl AlignedRow {
    pub fn first_display(&self) -> &str {
        self.first.as_deref().unwrap_or(MISSING_VALUE)
    }

    pub fn second_display(&self) -> &str {
        self.second.as_deref().unwrap_or(MISSING_VALUE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignedSection {
    pub section: SpecSection,
    pub rows: Vec<AlignedRow>,
}

/// Align two vehicles' specifications. Sections come back in the fixed
/// [`SpecSection::ALL`] order.
pub fn align(first: &Specifications, second: &Specifications) -> Vec<AlignedSection> {
    SpecSection::ALL
        .iter()
        .filter_map(|&section| {
            align_section(section, first.section(section), second.section(section))
        })
        .collect()
}

fn align_section(
    section: SpecSection,
    first: &[Parameter],
    second: &[Parameter],
) -> Option<AlignedSection> {
    if first.is_empty() && second.is_empty() {
        return None;
    }

    let mut seen = HashSet::new();
    let keys: Vec<String> = first
        .iter()
        .chain(second)
        .map(|param| normalize(&param.name))
        .filter(|key| !key.is_empty() && seen.insert(key.clone()))
        .collect();

    let rows = keys
        .iter()
        .filter_map(|key| {
            let first_match = find(first, key);
            let second_match = find(second, key);
            let first_value = first_match.and_then(present_value);
            let second_value = second_match.and_then(present_value);
            if first_value.is_none() && second_value.is_none() {
                return None;
            }
            let name = first_match
                .or(second_match)
                .map(|param| param.name.trim().to_string())
                .unwrap_or_else(|| key.clone());
            Some(AlignedRow {
                name,
                first: first_value,
                second: second_value,
            })
        })
        .collect();

    Some(AlignedSection { section, rows })
}

fn find<'a>(params: &'a [Parameter], key: &str) -> Option<&'a Parameter> {
    params.iter().find(|param| normalize(&param.name) == key)
}

/// The trimmed value, or `None` when blank. Whitespace-only values count as
/// missing, so they render as `-` and a row blank on both sides is dropped.
fn present_value(param: &Parameter) -> Option<String> {
    let value = param.value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// A flattened row of the comparison table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TableRow {
    Header {
        title: String,
        first: String,
        second: String,
    },
    Parameter {
        name: String,
        first: String,
        second: String,
    },
}

/// Comparison of two named vehicles, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonTable {
    pub first_label: String,
    pub second_label: String,
    pub sections: Vec<AlignedSection>,
}

impl ComparisonTable {
    pub fn new(first: &Vehicle, second: &Vehicle) -> Self {
        Self {
            first_label: first.display_name(),
            second_label: second.display_name(),
            sections: align(&first.specifications, &second.specifications),
        }
    }

    /// Header row per section followed by its parameter rows.
    pub fn rows(&self) -> Vec<TableRow> {
        let mut rows = Vec::new();
        for section in &self.sections {
            rows.push(TableRow::Header {
                title: section.section.title().to_string(),
                first: self.first_label.clone(),
                second: self.second_label.clone(),
            });
            rows.extend(section.rows.iter().map(|row| TableRow::Parameter {
                name: row.name.clone(),
                first: row.first_display().to_string(),
                second: row.second_display().to_string(),
            }));
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs(section: SpecSection, params: &[(&str, &str)]) -> Specifications {
        let mut specs = Specifications::default();
        *specs.section_mut(section) = params
            .iter()
            .map(|(name, value)| Parameter::new(*name, *value))
            .collect();
        specs
    }

    fn row(name: &str, first: Option<&str>, second: Option<&str>) -> AlignedRow {
        AlignedRow {
            name: name.into(),
            first: first.map(Into::into),
            second: second.map(Into::into),
        }
    }

    #[test]
    fn test_section_omitted_when_both_empty() {
        let a = specs(SpecSection::KeyParameters, &[("Range", "427 Km")]);
        let b = specs(SpecSection::KeyParameters, &[("Range", "570 Km")]);

        let sections = align(&a, &b);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].section, SpecSection::KeyParameters);
    }

    #[test]
    fn test_one_sided_section_shows_dash() {
        let a = Specifications::default();
        let b = specs(SpecSection::EngineParameters, &[("Displacement", "1.5 L")]);

        let sections = align(&a, &b);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].section, SpecSection::EngineParameters);
        let only = &sections[0].rows[0];
        assert_eq!(only, &row("Displacement", None, Some("1.5 L")));
        assert_eq!(only.first_display(), "-");
    }

    #[test]
    fn test_names_align_ignoring_case_and_whitespace() {
        let a = specs(SpecSection::KeyParameters, &[(" Range", "427 Km"), ("Power", "440 kw")]);
        let b = specs(SpecSection::KeyParameters, &[("POWER ", "331 kw"), ("range", "321 Km")]);

        let rows = &align(&a, &b)[0].rows;
        assert_eq!(
            rows,
            &vec![
                row("Range", Some("427 Km"), Some("321 Km")),
                row("Power", Some("440 kw"), Some("331 kw")),
            ]
        );
    }

    #[test]
    fn test_second_vehicle_extra_names_appended() {
        let a = specs(SpecSection::BodyParameters, &[("Length", "4750 mm")]);
        let b = specs(SpecSection::BodyParameters, &[("Width", "1920 mm"), ("Length", "4800 mm")]);

        let rows = &align(&a, &b)[0].rows;
        assert_eq!(
            rows,
            &vec![
                row("Length", Some("4750 mm"), Some("4800 mm")),
                row("Width", None, Some("1920 mm")),
            ]
        );
    }

    #[test]
    fn test_duplicate_names_first_occurrence_wins() {
        let a = specs(
            SpecSection::MotorParameters,
            &[("Peak Power", "200 kW"), ("peak power", "999 kW")],
        );
        let b = Specifications::default();

        let rows = &align(&a, &b)[0].rows;
        assert_eq!(rows, &vec![row("Peak Power", Some("200 kW"), None)]);
    }

    #[test]
    fn test_row_dropped_when_no_values() {
        let a = specs(SpecSection::KeyConfigurations, &[("Sunroof", ""), ("ABS", "Yes")]);
        let b = specs(SpecSection::KeyConfigurations, &[("sunroof", "  ")]);

        let rows = &align(&a, &b)[0].rows;
        assert_eq!(rows, &vec![row("ABS", Some("Yes"), None)]);
    }

    #[test]
    fn test_whitespace_value_renders_as_dash() {
        let a = specs(SpecSection::KeyParameters, &[("Range", "   ")]);
        let b = specs(SpecSection::KeyParameters, &[("Range", " 321 Km ")]);

        let only = &align(&a, &b)[0].rows[0];
        assert_eq!(only, &row("Range", None, Some("321 Km")));
        assert_eq!(only.first_display(), "-");
    }

    #[test]
    fn test_swapping_vehicles_swaps_columns() {
        let a = specs(
            SpecSection::KeyParameters,
            &[("Range", "427 Km"), ("Seats", "5"), ("Top speed", "200 km/h")],
        );
        let b = specs(
            SpecSection::KeyParameters,
            &[("Battery", "80 kWh"), ("range ", "321 Km")],
        );

        let keyed = |sections: Vec<AlignedSection>| {
            let mut out: Vec<(String, Option<String>, Option<String>)> = sections
                .into_iter()
                .flat_map(|s| s.rows)
                .map(|r| (normalize(&r.name), r.first, r.second))
                .collect();
            out.sort();
            out
        };

        let forward = keyed(align(&a, &b));
        let mut backward: Vec<_> = keyed(align(&b, &a))
            .into_iter()
            .map(|(name, first, second)| (name, second, first))
            .collect();
        backward.sort();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_table_rows_header_then_params() {
        let mut first = crate::vehicle::Vehicle::from_document(&serde_json::json!({
            "_id": "a", "brand": "Xpeng", "name": "G6"
        }))
        .unwrap();
        let mut second = first.clone();
        second.brand = "Tesla".into();
        second.name = "Model Y".into();
        first.specifications = specs(SpecSection::KeyParameters, &[("Range", "427 Km")]);
        second.specifications = specs(SpecSection::BodyParameters, &[("Seats", "5")]);

        let rows = ComparisonTable::new(&first, &second).rows();
        assert_eq!(rows.len(), 4);
        assert_eq!(
            rows[0],
            TableRow::Header {
                title: "Key Parameters".into(),
                first: "Xpeng G6".into(),
                second: "Tesla Model Y".into(),
            }
        );
        assert_eq!(
            rows[1],
            TableRow::Parameter {
                name: "Range".into(),
                first: "427 Km".into(),
                second: "-".into(),
            }
        );
        assert!(matches!(&rows[2], TableRow::Header { title, .. } if title == "Body Parameters"));
    }
}
