//! Plain-text views of the catalog and the current session.

use rust_decimal::Decimal;
use zakat_core::{format_currency, Catalog, FieldGroup};
use zakat_econ::{DerivedResult, Eligibility};
use zakat_runtime::{FetchStatus, Session, Step};

fn yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}

/// Every field id with its label and hint, grouped.
pub fn fields(catalog: &Catalog) -> String {
    let mut lines = Vec::new();
    for group in FieldGroup::ALL {
        lines.push(format!("{}:", group.title()));
        for def in catalog.group(group) {
            let mut line = format!("  {:<22} {}", def.id, def.label);
            if let Some(hint) = def.hint {
                line.push_str(&format!(" ({hint})"));
            }
            lines.push(line);
        }
        lines.push(String::new());
    }
    lines.join("\n")
}

fn price_line(session: &Session) -> String {
    let price = session.context.reference_price_per_gram;
    if price <= Decimal::ZERO {
        return match session.price.status {
            FetchStatus::Unavailable => {
                "Silver price per gram: unavailable, enter it manually with `zakat price <amount>`"
                    .to_string()
            }
            FetchStatus::Loading => "Silver price per gram: loading".to_string(),
            _ => "Silver price per gram: not set".to_string(),
        };
    }
    // Only a price that actually arrived from the source is labelled live.
    let source = match session.price.status {
        FetchStatus::Fetched if !session.price.user_edited => "live",
        FetchStatus::Unavailable => "entered, live price unavailable",
        _ => "entered",
    };
    let confirmed = if session.context.price_confirmed {
        "confirmed"
    } else {
        "not confirmed"
    };
    format!("Silver price per gram: {price} ({source}, {confirmed})")
}

fn result_lines(result: &DerivedResult, lines: &mut Vec<String>) {
    lines.push(format!(
        "Permissible wealth (C): {}",
        format_currency(result.permissible_wealth)
    ));
    lines.push(format!(
        "Liable wealth (E):      {}",
        format_currency(result.liable_wealth)
    ));
    lines.push(format!(
        "Nisab (F):              {}",
        format_currency(result.threshold_value)
    ));
    if result.eligibility == Eligibility::Due {
        lines.push(format!(
            "Zakat due:              ${}",
            format_currency(result.adjusted_amount_due)
        ));
    }
    lines.push(result.eligibility.to_string());
}

/// Full worksheet: non-zero entries per group, totals, price and result.
pub fn worksheet(session: &Session, catalog: &Catalog) -> String {
    let result = session.result(catalog);
    let mut lines = vec![format!(
        "Step {} of {}: {}",
        session.step.index() + 1,
        Step::ALL.len(),
        session.step.label()
    )];

    for group in FieldGroup::ALL {
        lines.push(String::new());
        lines.push(format!("{}:", group.title()));
        let mut any = false;
        for def in catalog.group(group) {
            let amount = session.entries.get(def.id);
            if amount != Decimal::ZERO {
                any = true;
                lines.push(format!("  {:<40} {:>14}", def.label, format_currency(amount)));
            }
        }
        if !any {
            lines.push("  (nothing entered)".to_string());
        }
        lines.push(format!(
            "  {}: {}",
            group.total_label(),
            format_currency(result.totals.of(group))
        ));
    }

    lines.push(String::new());
    lines.push(price_line(session));
    lines.push(format!(
        "Held for a full lunar year: {}",
        yes_no(session.context.held_full_period)
    ));
    lines.push(format!(
        "Gregorian calendar adjustment: {}",
        yes_no(session.context.use_calendar_adjustment)
    ));
    lines.push(String::new());
    result_lines(&result, &mut lines);
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use price_feed::Acquisition;
    use zakat_runtime::{Action, Effect, FetchTicket};

    fn reduce(session: &mut Session, action: Action) {
        session.reduce(Catalog::standard(), action).unwrap();
    }

    fn request_live(session: &mut Session) -> FetchTicket {
        match session
            .reduce(Catalog::standard(), Action::RequestLivePrice)
            .unwrap()
            .pop()
        {
            Some(Effect::StartFetch(t)) => t,
            other => panic!("expected fetch, got {other:?}"),
        }
    }

    #[test]
    fn lists_every_field_id() {
        let text = fields(Catalog::standard());
        assert!(text.contains("savings"));
        assert!(text.contains("bond_interest"));
        assert!(text.contains("other_expenses"));
    }

    #[test]
    fn due_worksheet_shows_amount() {
        let mut s = Session::new();
        reduce(
            &mut s,
            Action::SetAmount {
                field: "savings".into(),
                raw: "10000".into(),
            },
        );
        reduce(&mut s, Action::EditPrice { raw: "1".into() });
        reduce(&mut s, Action::ConfirmPrice);
        reduce(&mut s, Action::SetHeldFullPeriod(true));
        let text = worksheet(&s, Catalog::standard());
        assert!(text.contains("Total Assets (A): 10,000.00"));
        assert!(text.contains("Nisab (F):              595.00"));
        assert!(text.contains("$250.00"));
        assert!(text.contains("entered, confirmed"));
    }

    #[test]
    fn failed_refresh_keeps_entered_label() {
        let mut s = Session::new();
        reduce(&mut s, Action::EditPrice { raw: "0.95".into() });
        let ticket = request_live(&mut s);
        reduce(
            &mut s,
            Action::PriceResolved {
                ticket,
                acquisition: Acquisition::Unavailable("down".into()),
            },
        );
        let text = worksheet(&s, Catalog::standard());
        assert!(text.contains("0.95 (entered, live price unavailable"));
        assert!(!text.contains("(live"));

        let ticket = request_live(&mut s);
        reduce(
            &mut s,
            Action::PriceResolved {
                ticket,
                acquisition: Acquisition::Fetched(Decimal::new(9632, 4)),
            },
        );
        assert!(worksheet(&s, Catalog::standard()).contains("0.9632 (live, not confirmed)"));
    }

    #[test]
    fn huge_price_renders() {
        let mut s = Session::new();
        reduce(
            &mut s,
            Action::EditPrice {
                raw: "79228162514264337593543950335".into(),
            },
        );
        let text = worksheet(&s, Catalog::standard());
        assert!(text.contains("Nisab (F):              79,228,162,514,264,337,593,543,950,335.00"));
    }

    #[test]
    fn unavailable_price_asks_for_manual_entry() {
        let mut s = Session::new();
        s.price.status = FetchStatus::Unavailable;
        let text = worksheet(&s, Catalog::standard());
        assert!(text.contains("enter it manually"));
        assert!(text.contains(&Eligibility::MissingPrice.to_string()));
        assert!(!text.contains("Zakat due"));
    }
}
