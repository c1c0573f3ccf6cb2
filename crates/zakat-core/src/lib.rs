#![deny(warnings)]

//! Core domain model for the Zakat worksheet.
//!
//! This crate defines the field catalog, the user's worksheet entries and the
//! scalar calculation context, plus the numeric coercion and display helpers
//! shared by every front end. Everything here is pure and serializable.

mod catalog;

use once_cell::sync::Lazy;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use thiserror::Error;

/// One worksheet group of the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldGroup {
    /// Zakatable assets (worksheet 1).
    Assets,
    /// Impermissible (haram) earnings to purify (worksheet 2).
    ImpermissibleEarnings,
    /// Immediately-due expenses and liabilities (worksheet 3).
    Expenses,
}

impl FieldGroup {
    /// All groups in worksheet order.
    pub const ALL: [FieldGroup; 3] = [
        FieldGroup::Assets,
        FieldGroup::ImpermissibleEarnings,
        FieldGroup::Expenses,
    ];

    /// Worksheet heading.
    pub fn title(self) -> &'static str {
        match self {
            FieldGroup::Assets => "Total Earnings & Income",
            FieldGroup::ImpermissibleEarnings => "Haram Earnings",
            FieldGroup::Expenses => "Expenses & Liabilities",
        }
    }

    /// Label of the subtotal line printed under the group.
    pub fn total_label(self) -> &'static str {
        match self {
            FieldGroup::Assets => "Total Assets (A)",
            FieldGroup::ImpermissibleEarnings => "Total Haram Earnings (B)",
            FieldGroup::Expenses => "Total Expenses (D)",
        }
    }
}

/// A single input line of the worksheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FieldDef {
    /// Stable identifier, also the key in persisted snapshots.
    pub id: &'static str,
    /// Display label.
    pub label: &'static str,
    /// Short hint shown under the label.
    pub hint: Option<&'static str>,
    /// Longer explanation.
    pub help_text: Option<&'static str>,
}

/// Errors raised while assembling a catalog.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    /// Field ids must be non-blank.
    #[error("field id must not be blank")]
    BlankId,
    /// Field ids must be unique across all groups.
    #[error("duplicate field id: {0}")]
    DuplicateId(String),
    /// A group was listed twice.
    #[error("group listed more than once: {0:?}")]
    DuplicateGroup(FieldGroup),
}

/// Validation errors for worksheet mutations.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// The field id is not part of the catalog.
    #[error("unknown field: {0}")]
    UnknownField(String),
    /// Amounts must be non-negative.
    #[error("negative amount for field {0}")]
    NegativeAmount(String),
}

/// Ordered, immutable set of worksheet fields partitioned into groups.
#[derive(Clone, Debug)]
pub struct Catalog {
    groups: Vec<(FieldGroup, Vec<FieldDef>)>,
}

static STANDARD_CATALOG: Lazy<Catalog> = Lazy::new(|| {
    Catalog::new(catalog::standard_groups()).expect("standard catalog is well-formed")
});

impl Catalog {
    /// Build a catalog, checking that ids are unique and non-blank.
    pub fn new(groups: Vec<(FieldGroup, Vec<FieldDef>)>) -> Result<Self, CatalogError> {
        let mut seen_groups = BTreeSet::new();
        let mut seen_ids = BTreeSet::new();
        for (group, fields) in &groups {
            if !seen_groups.insert(*group) {
                return Err(CatalogError::DuplicateGroup(*group));
            }
            for f in fields {
                if f.id.trim().is_empty() {
                    return Err(CatalogError::BlankId);
                }
                if !seen_ids.insert(f.id) {
                    return Err(CatalogError::DuplicateId(f.id.to_string()));
                }
            }
        }
        Ok(Self { groups })
    }

    /// The built-in catalog used by the worksheet.
    pub fn standard() -> &'static Catalog {
        &STANDARD_CATALOG
    }

    /// Fields of one group in display order. Empty if the group is absent.
    pub fn group(&self, group: FieldGroup) -> &[FieldDef] {
        self.groups
            .iter()
            .find(|(g, _)| *g == group)
            .map(|(_, fields)| fields.as_slice())
            .unwrap_or(&[])
    }

    /// Field ids of one group in display order.
    pub fn group_ids(&self, group: FieldGroup) -> impl Iterator<Item = &'static str> + '_ {
        self.group(group).iter().map(|f| f.id)
    }

    /// Looks up a field and the group it belongs to.
    pub fn find(&self, id: &str) -> Option<(FieldGroup, &FieldDef)> {
        self.groups
            .iter()
            .find_map(|(g, fields)| fields.iter().find(|f| f.id == id).map(|f| (*g, f)))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Total number of fields.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|(_, f)| f.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Amounts entered by the user, keyed by field id. Absent keys read as zero.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorksheetEntries(BTreeMap<String, Decimal>);

impl WorksheetEntries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an amount for a catalog field, replacing any previous value.
    pub fn set(
        &mut self,
        catalog: &Catalog,
        id: &str,
        amount: Decimal,
    ) -> Result<(), ValidationError> {
        if !catalog.contains(id) {
            return Err(ValidationError::UnknownField(id.to_string()));
        }
        if amount < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount(id.to_string()));
        }
        self.0.insert(id.to_string(), amount);
        Ok(())
    }

    /// Amount for a field, zero when nothing was entered.
    pub fn get(&self, id: &str) -> Decimal {
        self.0.get(id).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// Non-worksheet inputs to the decision engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculationContext {
    /// Silver price per gram in the user's currency (>= 0).
    pub reference_price_per_gram: Decimal,
    /// Wealth stayed above the threshold for a full lunar year.
    pub held_full_period: bool,
    /// The user explicitly acknowledged the reference price.
    pub price_confirmed: bool,
    /// Scale the result for a solar-calendar year.
    pub use_calendar_adjustment: bool,
}

/// Coerce free-form user text into an amount.
///
/// Everything except ASCII digits and `.` is discarded, then the longest
/// numeric prefix is parsed. Anything unparseable is zero.
///
/// Example:
/// assert_eq!(parse_amount("$1,250.50"), Decimal::new(125050, 2));
/// assert_eq!(parse_amount("abc"), Decimal::ZERO);
pub fn parse_amount(raw: &str) -> Decimal {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in cleaned.char_indices() {
        if c == '.' {
            if seen_dot {
                break;
            }
            seen_dot = true;
        }
        end = i + 1;
    }
    let prefix = cleaned[..end].trim_end_matches('.');
    if prefix.is_empty() {
        return Decimal::ZERO;
    }
    let normalized = if prefix.starts_with('.') {
        format!("0{prefix}")
    } else {
        prefix.to_string()
    };
    Decimal::from_str(&normalized).unwrap_or(Decimal::ZERO)
}

/// Format an amount with two decimals and comma thousands separators.
///
/// Example:
/// assert_eq!(format_currency(Decimal::new(1234567, 1)), "123,456.70");
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded < Decimal::ZERO;
    let digits = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if negative { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}
