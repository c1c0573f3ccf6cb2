#![deny(warnings)]

//! Worksheet arithmetic: group subtotals and the Zakat decision.
//!
//! This module provides pure helpers for:
//! - Summing a group of worksheet fields (`sum_group`, `Totals`)
//! - Deriving the threshold (Nisab), gates and amount due (`evaluate`)
//!
//! All amounts are exact decimals. Nothing here fails: missing inputs read as
//! zero, negative intermediates simply fail the threshold gate and results
//! beyond the decimal range saturate.

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use zakat_core::{CalculationContext, Catalog, FieldGroup, WorksheetEntries};

/// Grams of silver that make up the Nisab.
pub const NISAB_SILVER_GRAMS: Decimal = Decimal::from_parts(595, 0, 0, false, 0);

/// Share of liable wealth due (2.5%).
pub const ZAKAT_RATE: Decimal = Decimal::from_parts(25, 0, 0, false, 3);

/// Multiplier for a 365-day solar year against a 354-day lunar year.
pub const GREGORIAN_ADJUSTMENT: Decimal = Decimal::from_parts(102_578, 0, 0, false, 5);

/// Sum of the entered amounts over `group`, treating missing ids as zero.
///
/// Example:
/// let total = sum_group(&entries, ["savings", "checking"]);
pub fn sum_group<'a, I>(entries: &WorksheetEntries, group: I) -> Decimal
where
    I: IntoIterator<Item = &'a str>,
{
    group
        .into_iter()
        .fold(Decimal::ZERO, |acc, id| acc.saturating_add(entries.get(id)))
}

/// Per-group subtotals of a worksheet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Totals {
    /// Sum of the assets group (A).
    pub assets: Decimal,
    /// Sum of the impermissible earnings group (B).
    pub impermissible: Decimal,
    /// Sum of the expenses group (D).
    pub expenses: Decimal,
}

impl Totals {
    pub fn from_entries(entries: &WorksheetEntries, catalog: &Catalog) -> Self {
        Self {
            assets: sum_group(entries, catalog.group_ids(FieldGroup::Assets)),
            impermissible: sum_group(
                entries,
                catalog.group_ids(FieldGroup::ImpermissibleEarnings),
            ),
            expenses: sum_group(entries, catalog.group_ids(FieldGroup::Expenses)),
        }
    }

    /// Subtotal for one group.
    pub fn of(&self, group: FieldGroup) -> Decimal {
        match group {
            FieldGroup::Assets => self.assets,
            FieldGroup::ImpermissibleEarnings => self.impermissible,
            FieldGroup::Expenses => self.expenses,
        }
    }
}

/// Why an amount is or is not due. The first failing gate wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
    /// All gates hold.
    Due,
    /// The reference price is zero, so there is no threshold.
    MissingPrice,
    /// The price has not been acknowledged by the user.
    PriceUnconfirmed,
    /// Liable wealth does not exceed the threshold.
    BelowThreshold,
    /// The one-year holding period was not affirmed.
    HoldingPeriodNotMet,
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Eligibility::Due => "Zakat is due on your liable wealth.",
            Eligibility::MissingPrice => "Enter the silver price to calculate your Nisab.",
            Eligibility::PriceUnconfirmed => "Please confirm the silver price to proceed.",
            Eligibility::BelowThreshold => "Your liable wealth is below the Nisab threshold.",
            Eligibility::HoldingPeriodNotMet => {
                "Confirm that your wealth has been above Nisab for a full year."
            }
        };
        f.write_str(msg)
    }
}

/// Everything derived from the subtotals and the calculation context.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DerivedResult {
    pub totals: Totals,
    /// Assets minus impermissible earnings (C).
    pub permissible_wealth: Decimal,
    /// Permissible wealth minus expenses (E).
    pub liable_wealth: Decimal,
    /// Reference price times 595 g (F).
    pub threshold_value: Decimal,
    pub above_threshold: bool,
    pub amount_due: Decimal,
    /// `amount_due`, scaled when the solar-calendar adjustment is on.
    pub adjusted_amount_due: Decimal,
    pub eligibility: Eligibility,
}

/// Run the decision pipeline: subtract, compare to the Nisab, apply the rate.
pub fn evaluate(totals: Totals, ctx: &CalculationContext) -> DerivedResult {
    let permissible_wealth = totals.assets.saturating_sub(totals.impermissible);
    let liable_wealth = permissible_wealth.saturating_sub(totals.expenses);
    let threshold_value = ctx.reference_price_per_gram.saturating_mul(NISAB_SILVER_GRAMS);
    let has_threshold = threshold_value > Decimal::ZERO;
    let above_threshold = has_threshold && liable_wealth > threshold_value;

    let eligibility = if !has_threshold {
        Eligibility::MissingPrice
    } else if !ctx.price_confirmed {
        Eligibility::PriceUnconfirmed
    } else if !above_threshold {
        Eligibility::BelowThreshold
    } else if !ctx.held_full_period {
        Eligibility::HoldingPeriodNotMet
    } else {
        Eligibility::Due
    };

    let amount_due = if eligibility == Eligibility::Due {
        liable_wealth.saturating_mul(ZAKAT_RATE)
    } else {
        Decimal::ZERO
    };
    let adjusted_amount_due = if ctx.use_calendar_adjustment {
        amount_due.saturating_mul(GREGORIAN_ADJUSTMENT)
    } else {
        amount_due
    };

    DerivedResult {
        totals,
        permissible_wealth,
        liable_wealth,
        threshold_value,
        above_threshold,
        amount_due,
        adjusted_amount_due,
        eligibility,
    }
}

/// Convenience: subtotals plus evaluation in one call.
pub fn evaluate_worksheet(
    entries: &WorksheetEntries,
    catalog: &Catalog,
    ctx: &CalculationContext,
) -> DerivedResult {
    evaluate(Totals::from_entries(entries, catalog), ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn ctx(price: Decimal, held: bool, confirmed: bool, calendar: bool) -> CalculationContext {
        CalculationContext {
            reference_price_per_gram: price,
            held_full_period: held,
            price_confirmed: confirmed,
            use_calendar_adjustment: calendar,
        }
    }

    fn assets_only(amount: i64) -> Totals {
        Totals {
            assets: Decimal::new(amount, 0),
            ..Totals::default()
        }
    }

    #[test]
    fn constants_have_expected_values() {
        assert_eq!(NISAB_SILVER_GRAMS, Decimal::new(595, 0));
        assert_eq!(ZAKAT_RATE, Decimal::from_str("0.025").unwrap());
        assert_eq!(GREGORIAN_ADJUSTMENT, Decimal::from_str("1.02578").unwrap());
    }

    #[test]
    fn sum_group_ignores_other_fields() {
        let c = Catalog::standard();
        let mut e = WorksheetEntries::new();
        e.set(c, "savings", Decimal::new(100, 0)).unwrap();
        e.set(c, "checking", Decimal::new(50, 0)).unwrap();
        e.set(c, "medical", Decimal::new(999, 0)).unwrap();
        assert_eq!(sum_group(&e, ["savings", "checking", "gold"]), Decimal::new(150, 0));
        let t = Totals::from_entries(&e, c);
        assert_eq!(t.assets, Decimal::new(150, 0));
        assert_eq!(t.expenses, Decimal::new(999, 0));
        assert_eq!(t.impermissible, Decimal::ZERO);
    }

    #[test]
    fn ten_thousand_in_assets_owes_two_fifty() {
        let r = evaluate(assets_only(10_000), &ctx(Decimal::ONE, true, true, false));
        assert_eq!(r.threshold_value, Decimal::new(595, 0));
        assert!(r.above_threshold);
        assert_eq!(r.eligibility, Eligibility::Due);
        assert_eq!(r.amount_due, Decimal::from_str("250").unwrap());
        assert_eq!(r.adjusted_amount_due, r.amount_due);
    }

    #[test]
    fn liable_wealth_of_9405_owes_235_125() {
        // Liable wealth 9405 (assets 10000 less 595 of expenses) gives 235.125.
        let totals = Totals {
            assets: Decimal::new(10_000, 0),
            impermissible: Decimal::ZERO,
            expenses: Decimal::new(595, 0),
        };
        let r = evaluate(totals, &ctx(Decimal::ONE, true, true, false));
        assert_eq!(r.amount_due, Decimal::from_str("235.125").unwrap());

        let d = evaluate(totals, &ctx(Decimal::ONE, true, true, true));
        assert_eq!(d.amount_due, Decimal::from_str("235.125").unwrap());
        assert_eq!(
            d.adjusted_amount_due,
            Decimal::from_str("241.1865225").unwrap()
        );
    }

    #[test]
    fn not_held_a_full_year_owes_nothing() {
        let r = evaluate(assets_only(10_000), &ctx(Decimal::ONE, false, true, false));
        assert_eq!(r.amount_due, Decimal::ZERO);
        assert_eq!(r.eligibility, Eligibility::HoldingPeriodNotMet);
    }

    #[test]
    fn below_threshold_owes_nothing() {
        let r = evaluate(assets_only(500), &ctx(Decimal::ONE, true, true, false));
        assert!(!r.above_threshold);
        assert_eq!(r.amount_due, Decimal::ZERO);
        assert_eq!(r.eligibility, Eligibility::BelowThreshold);
    }

    #[test]
    fn zero_price_is_never_above_threshold() {
        let r = evaluate(assets_only(1_000_000), &ctx(Decimal::ZERO, true, true, false));
        assert!(!r.above_threshold);
        assert_eq!(r.amount_due, Decimal::ZERO);
        assert_eq!(r.eligibility, Eligibility::MissingPrice);
    }

    #[test]
    fn unconfirmed_price_explained_before_threshold() {
        let r = evaluate(assets_only(100), &ctx(Decimal::ONE, false, false, false));
        assert_eq!(r.eligibility, Eligibility::PriceUnconfirmed);
    }

    #[test]
    fn negative_intermediates_propagate() {
        let totals = Totals {
            assets: Decimal::new(100, 0),
            impermissible: Decimal::new(300, 0),
            expenses: Decimal::new(50, 0),
        };
        let r = evaluate(totals, &ctx(Decimal::ONE, true, true, false));
        assert_eq!(r.permissible_wealth, Decimal::new(-200, 0));
        assert_eq!(r.liable_wealth, Decimal::new(-250, 0));
        assert_eq!(r.amount_due, Decimal::ZERO);
    }

    #[test]
    fn extreme_amounts_saturate() {
        let c = Catalog::standard();
        let mut e = WorksheetEntries::new();
        e.set(c, "savings", Decimal::MAX).unwrap();
        e.set(c, "checking", Decimal::MAX).unwrap();
        e.set(c, "bond_interest", Decimal::MAX).unwrap();
        let r = evaluate_worksheet(&e, c, &ctx(Decimal::MAX, true, true, true));
        assert_eq!(r.totals.assets, Decimal::MAX);
        assert_eq!(r.threshold_value, Decimal::MAX);
        assert_eq!(r.permissible_wealth, Decimal::ZERO);
        assert!(!r.above_threshold);
        assert_eq!(r.amount_due, Decimal::ZERO);

        let big = Totals {
            assets: Decimal::MAX,
            impermissible: Decimal::ZERO,
            expenses: Decimal::MAX,
        };
        let neg = evaluate(big, &ctx(Decimal::ONE, true, true, true));
        assert_eq!(neg.liable_wealth, Decimal::ZERO);

        let all_assets = Totals {
            assets: Decimal::MAX,
            ..Totals::default()
        };
        let rich = evaluate(all_assets, &ctx(Decimal::ONE, true, true, true));
        assert_eq!(rich.eligibility, Eligibility::Due);
        assert!(rich.adjusted_amount_due > rich.amount_due);
    }

    #[test]
    fn eligibility_messages_are_distinct() {
        let all = [
            Eligibility::Due,
            Eligibility::MissingPrice,
            Eligibility::PriceUnconfirmed,
            Eligibility::BelowThreshold,
            Eligibility::HoldingPeriodNotMet,
        ];
        let msgs: std::collections::BTreeSet<String> = all.iter().map(|e| e.to_string()).collect();
        assert_eq!(msgs.len(), all.len());
    }

    proptest! {
        #[test]
        fn sum_group_is_order_independent(values in proptest::collection::vec(0u32..1_000_000, 21)) {
            let c = Catalog::standard();
            let ids: Vec<&str> = c.group_ids(FieldGroup::Assets).collect();
            let mut forward = WorksheetEntries::new();
            let mut backward = WorksheetEntries::new();
            for (id, v) in ids.iter().zip(&values) {
                forward.set(c, id, Decimal::from(*v)).unwrap();
            }
            for (id, v) in ids.iter().zip(&values).rev() {
                backward.set(c, id, Decimal::from(*v)).unwrap();
            }
            backward.set(c, "groceries", Decimal::from(12_345u32)).unwrap();
            let expected: u64 = values.iter().map(|v| *v as u64).sum();
            prop_assert_eq!(sum_group(&forward, ids.iter().copied()), Decimal::from(expected));
            prop_assert_eq!(sum_group(&backward, ids.iter().rev().copied()), Decimal::from(expected));
        }

        #[test]
        fn amount_due_requires_every_gate(assets in 0i64..100_000,
                                          price_cents in 0i64..500,
                                          held in any::<bool>(),
                                          confirmed in any::<bool>(),
                                          calendar in any::<bool>()) {
            let r = evaluate(assets_only(assets), &ctx(Decimal::new(price_cents, 2), held, confirmed, calendar));
            if !(r.above_threshold && held && confirmed) {
                prop_assert_eq!(r.amount_due, Decimal::ZERO);
                prop_assert_eq!(r.adjusted_amount_due, Decimal::ZERO);
            } else {
                prop_assert_eq!(r.amount_due, r.liable_wealth * ZAKAT_RATE);
            }
        }

        #[test]
        fn calendar_adjustment_scales_exactly(assets in 1_000i64..10_000_000, held in any::<bool>()) {
            let plain = evaluate(assets_only(assets), &ctx(Decimal::ONE, held, true, false));
            let adjusted = evaluate(assets_only(assets), &ctx(Decimal::ONE, held, true, true));
            prop_assert_eq!(plain.adjusted_amount_due, plain.amount_due);
            prop_assert_eq!(adjusted.amount_due, plain.amount_due);
            prop_assert_eq!(adjusted.adjusted_amount_due, plain.amount_due * GREGORIAN_ADJUSTMENT);
        }
    }
}
