#![deny(warnings)]

//! Worksheet session: an explicit, serializable state record advanced by a
//! reducer.
//!
//! Front ends feed [`Action`]s into [`Session::reduce`] and carry out the
//! returned [`Effect`]s (saving, starting a price lookup, clearing storage).
//! The reducer itself performs no I/O.

use persistence::Snapshot;
use price_feed::Acquisition;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use zakat_core::{
    parse_amount, CalculationContext, Catalog, FieldGroup, ValidationError, WorksheetEntries,
};
use zakat_econ::{evaluate_worksheet, DerivedResult};

/// Worksheet page the user is on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    Assets,
    ImpermissibleEarnings,
    Expenses,
    Calculate,
}

impl Step {
    pub const ALL: [Step; 4] = [
        Step::Assets,
        Step::ImpermissibleEarnings,
        Step::Expenses,
        Step::Calculate,
    ];

    pub fn index(self) -> usize {
        match self {
            Step::Assets => 0,
            Step::ImpermissibleEarnings => 1,
            Step::Expenses => 2,
            Step::Calculate => 3,
        }
    }

    pub fn next(self) -> Step {
        Step::ALL[(self.index() + 1).min(Step::ALL.len() - 1)]
    }

    pub fn previous(self) -> Step {
        Step::ALL[self.index().saturating_sub(1)]
    }

    /// Worksheet group edited on this step; `None` on the result page.
    pub fn group(self) -> Option<FieldGroup> {
        match self {
            Step::Assets => Some(FieldGroup::Assets),
            Step::ImpermissibleEarnings => Some(FieldGroup::ImpermissibleEarnings),
            Step::Expenses => Some(FieldGroup::Expenses),
            Step::Calculate => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::Assets => "Assets",
            Step::ImpermissibleEarnings => "Haram Earnings",
            Step::Expenses => "Expenses",
            Step::Calculate => "Calculate",
        }
    }

    /// Stable name used in snapshots and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Step::Assets => "assets",
            Step::ImpermissibleEarnings => "impermissible",
            Step::Expenses => "expenses",
            Step::Calculate => "calculate",
        }
    }

    pub fn parse(s: &str) -> Option<Step> {
        Step::ALL.into_iter().find(|step| step.as_str() == s)
    }
}

/// State of the reference price lookup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Fetched,
    /// Lookup failed; the user has to enter the price manually.
    Unavailable,
}

/// Bookkeeping around the reference price field.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceState {
    pub status: FetchStatus,
    /// The current price was typed (or restored) rather than fetched.
    pub user_edited: bool,
    /// Bumped on every manual edit; tickets from older revisions are stale.
    pub revision: u64,
}

/// Handle for an outstanding price lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchTicket {
    pub revision: u64,
    /// `true` for an explicit "reset to live price", which skips the cache.
    pub force_refresh: bool,
}

/// User actions and completion events.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Session start: kick off the price lookup unless a price is saved.
    Startup,
    SetAmount { field: String, raw: String },
    EditPrice { raw: String },
    ConfirmPrice,
    RevokeConfirmation,
    SetHeldFullPeriod(bool),
    SetCalendarAdjustment(bool),
    /// Discard the typed price and look it up again.
    RequestLivePrice,
    PriceResolved {
        ticket: FetchTicket,
        acquisition: Acquisition,
    },
    GoTo(Step),
    Next,
    Back,
    ClearAll,
}

/// Side effects the caller must perform after a reduction.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Overwrite the saved snapshot with [`Session::snapshot`].
    Persist,
    StartFetch(FetchTicket),
    /// Abandon the outstanding lookup; its result would be dropped anyway.
    CancelFetch,
    /// Remove the saved snapshot and cancel any outstanding lookup.
    ClearStorage,
}

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Complete worksheet session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub step: Step,
    pub entries: WorksheetEntries,
    pub context: CalculationContext,
    pub price: PriceState,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate from a saved snapshot. Ids missing from the catalog are
    /// dropped; a saved price counts as user-entered.
    pub fn from_snapshot(snapshot: &Snapshot, catalog: &Catalog) -> Self {
        let mut entries = WorksheetEntries::new();
        for (id, amount) in &snapshot.data {
            if let Err(e) = entries.set(catalog, id, *amount) {
                warn!(field = %id, error = %e, "dropping saved entry");
            }
        }
        let price = snapshot.nisab_price.max(Decimal::ZERO);
        Self {
            step: snapshot
                .step
                .as_deref()
                .and_then(Step::parse)
                .unwrap_or_default(),
            entries,
            context: CalculationContext {
                reference_price_per_gram: price,
                held_full_period: snapshot.held_one_year,
                price_confirmed: snapshot.price_confirmed && price > Decimal::ZERO,
                use_calendar_adjustment: snapshot.use_gregorian,
            },
            price: PriceState {
                status: FetchStatus::Idle,
                user_edited: price > Decimal::ZERO,
                revision: 0,
            },
        }
    }

    /// Persistable projection of the session.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            data: self
                .entries
                .iter()
                .map(|(id, amount)| (id.to_string(), amount))
                .collect(),
            nisab_price: self.context.reference_price_per_gram,
            held_one_year: self.context.held_full_period,
            use_gregorian: self.context.use_calendar_adjustment,
            price_confirmed: self.context.price_confirmed,
            step: Some(self.step.as_str().to_string()),
        }
    }

    /// Derived figures, recomputed on every call.
    pub fn result(&self, catalog: &Catalog) -> DerivedResult {
        evaluate_worksheet(&self.entries, catalog, &self.context)
    }

    fn ticket(&self, force_refresh: bool) -> FetchTicket {
        FetchTicket {
            revision: self.price.revision,
            force_refresh,
        }
    }

    /// Apply one action and report the effects to carry out.
    pub fn reduce(&mut self, catalog: &Catalog, action: Action) -> Result<Vec<Effect>, SessionError> {
        debug!(?action, "reduce");
        let effects = match action {
            Action::Startup => {
                if self.context.reference_price_per_gram > Decimal::ZERO {
                    vec![]
                } else {
                    self.price.status = FetchStatus::Loading;
                    vec![Effect::StartFetch(self.ticket(false))]
                }
            }
            Action::SetAmount { field, raw } => {
                self.entries.set(catalog, &field, parse_amount(&raw))?;
                vec![Effect::Persist]
            }
            Action::EditPrice { raw } => {
                self.context.reference_price_per_gram = parse_amount(&raw);
                self.context.price_confirmed = false;
                self.price.user_edited = true;
                self.price.revision += 1;
                if self.price.status == FetchStatus::Loading {
                    self.price.status = FetchStatus::Idle;
                    vec![Effect::Persist, Effect::CancelFetch]
                } else {
                    vec![Effect::Persist]
                }
            }
            Action::ConfirmPrice => {
                if self.context.reference_price_per_gram > Decimal::ZERO {
                    self.context.price_confirmed = true;
                    vec![Effect::Persist]
                } else {
                    vec![]
                }
            }
            Action::RevokeConfirmation => {
                self.context.price_confirmed = false;
                vec![Effect::Persist]
            }
            Action::SetHeldFullPeriod(held) => {
                self.context.held_full_period = held;
                vec![Effect::Persist]
            }
            Action::SetCalendarAdjustment(on) => {
                self.context.use_calendar_adjustment = on;
                vec![Effect::Persist]
            }
            Action::RequestLivePrice => {
                self.price.user_edited = false;
                self.price.status = FetchStatus::Loading;
                self.context.price_confirmed = false;
                vec![Effect::Persist, Effect::StartFetch(self.ticket(true))]
            }
            Action::PriceResolved {
                ticket,
                acquisition,
            } => self.resolve_price(ticket, acquisition),
            Action::GoTo(step) => {
                self.step = step;
                vec![Effect::Persist]
            }
            Action::Next => {
                self.step = self.step.next();
                vec![Effect::Persist]
            }
            Action::Back => {
                self.step = self.step.previous();
                vec![Effect::Persist]
            }
            Action::ClearAll => {
                let revision = self.price.revision + 1;
                *self = Session::default();
                self.price.revision = revision;
                info!("worksheet cleared");
                vec![Effect::ClearStorage]
            }
        };
        Ok(effects)
    }

    /// Guarded completion: the result only lands if nobody typed a price
    /// since the ticket was issued.
    fn resolve_price(&mut self, ticket: FetchTicket, acquisition: Acquisition) -> Vec<Effect> {
        if ticket.revision != self.price.revision || self.price.user_edited {
            debug!(
                ticket = ticket.revision,
                current = self.price.revision,
                "dropping stale price result"
            );
            return vec![];
        }
        match acquisition.price() {
            Some(per_gram) => {
                self.context.reference_price_per_gram = per_gram;
                self.context.price_confirmed = false;
                self.price.user_edited = false;
                self.price.status = FetchStatus::Fetched;
                vec![Effect::Persist]
            }
            None => {
                self.price.status = FetchStatus::Unavailable;
                vec![]
            }
        }
    }
}
