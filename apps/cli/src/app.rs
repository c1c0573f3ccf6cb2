//! Drives a [`Session`]: carries out reducer effects against storage and the
//! price source.

use persistence::{clear_snapshot, load_snapshot, save_snapshot, KeyValueStore};
use price_feed::{acquire, refresh, Acquisition, SpotSource};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use zakat_core::Catalog;
use zakat_runtime::{Action, Effect, FetchTicket, Session, SessionError};

type PendingFetch = JoinHandle<(FetchTicket, Acquisition)>;

pub struct App<K> {
    session: Session,
    catalog: &'static Catalog,
    store: K,
    source: Option<Arc<dyn SpotSource>>,
    now_ms: fn() -> i64,
    pending: Option<PendingFetch>,
}

pub fn wall_clock_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl<K> App<K>
where
    K: KeyValueStore + Clone + 'static,
{
    /// Restore the saved session. Storage faults fall back to an empty one.
    pub fn open(store: K, source: Option<Arc<dyn SpotSource>>, now_ms: fn() -> i64) -> Self {
        let catalog = Catalog::standard();
        let session = match load_snapshot(&store) {
            Ok(Some(snap)) => Session::from_snapshot(&snap, catalog),
            Ok(None) => Session::new(),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable snapshot");
                Session::new()
            }
        };
        Self {
            session,
            catalog,
            store,
            source,
            now_ms,
            pending: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn catalog(&self) -> &'static Catalog {
        self.catalog
    }

    /// Reduce `action` and every follow-up it triggers.
    pub fn dispatch(&mut self, action: Action) -> Result<(), SessionError> {
        let mut queue = VecDeque::from([action]);
        while let Some(next) = queue.pop_front() {
            for effect in self.session.reduce(self.catalog, next)? {
                if let Some(follow_up) = self.run_effect(effect) {
                    queue.push_back(follow_up);
                }
            }
        }
        Ok(())
    }

    fn run_effect(&mut self, effect: Effect) -> Option<Action> {
        match effect {
            Effect::Persist => {
                if let Err(e) = save_snapshot(&self.store, &self.session.snapshot()) {
                    warn!(error = %e, "could not save worksheet");
                }
                None
            }
            Effect::CancelFetch => {
                debug!("abandoning price lookup");
                self.cancel_pending();
                None
            }
            Effect::ClearStorage => {
                self.cancel_pending();
                if let Err(e) = clear_snapshot(&self.store) {
                    warn!(error = %e, "could not clear saved worksheet");
                }
                None
            }
            Effect::StartFetch(ticket) => {
                let Some(source) = self.source.clone() else {
                    return Some(Action::PriceResolved {
                        ticket,
                        acquisition: Acquisition::Unavailable("offline".into()),
                    });
                };
                self.cancel_pending();
                let store = self.store.clone();
                let now = (self.now_ms)();
                debug!(revision = ticket.revision, force = ticket.force_refresh, "starting price lookup");
                self.pending = Some(tokio::spawn(async move {
                    let acquisition = if ticket.force_refresh {
                        refresh(source.as_ref(), &store, now).await
                    } else {
                        acquire(source.as_ref(), &store, now).await
                    };
                    (ticket, acquisition)
                }));
                None
            }
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }

    /// Wait for the outstanding price lookup, if any, and apply it.
    pub async fn settle(&mut self) -> Result<(), SessionError> {
        let Some(task) = self.pending.take() else {
            return Ok(());
        };
        match task.await {
            Ok((ticket, acquisition)) => self.dispatch(Action::PriceResolved {
                ticket,
                acquisition,
            }),
            Err(e) => {
                debug!(error = %e, "price lookup did not complete");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use persistence::{load_price_cache, MemoryStore, Snapshot};
    use price_feed::FeedError;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use zakat_runtime::FetchStatus;

    struct FixedSource {
        quote: Option<Decimal>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SpotSource for FixedSource {
        async fn silver_per_ounce(&self) -> Result<Decimal, FeedError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.quote
                .ok_or_else(|| FeedError::MalformedPayload("down".into()))
        }
    }

    fn source(quote: Option<Decimal>) -> (Arc<dyn SpotSource>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let src = FixedSource {
            quote,
            calls: calls.clone(),
        };
        (Arc::new(src), calls)
    }

    fn epoch() -> i64 {
        1_700_000_000_000
    }

    #[tokio::test]
    async fn startup_fetch_populates_price_and_cache() {
        let store = MemoryStore::new();
        let (src, calls) = source(Some(Decimal::new(2996, 2)));
        let mut app = App::open(store.clone(), Some(src), epoch);
        app.dispatch(Action::Startup).unwrap();
        app.settle().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let s = app.session();
        assert_eq!(s.context.reference_price_per_gram, Decimal::new(9632, 4));
        assert_eq!(s.price.status, FetchStatus::Fetched);
        assert_eq!(
            load_snapshot(&store).unwrap().unwrap().nisab_price,
            Decimal::new(9632, 4)
        );
        assert_eq!(load_price_cache(&store).unwrap().unwrap().fetched_at, epoch());
    }

    #[tokio::test]
    async fn saved_price_skips_lookup() {
        let store = MemoryStore::new();
        let snap = Snapshot {
            nisab_price: Decimal::new(88, 2),
            ..Snapshot::default()
        };
        save_snapshot(&store, &snap).unwrap();
        let (src, calls) = source(Some(Decimal::new(2996, 2)));
        let mut app = App::open(store, Some(src), epoch);
        app.dispatch(Action::Startup).unwrap();
        app.settle().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            app.session().context.reference_price_per_gram,
            Decimal::new(88, 2)
        );
    }

    #[tokio::test]
    async fn typed_price_wins_over_late_lookup() {
        let store = MemoryStore::new();
        let (src, _) = source(Some(Decimal::new(2996, 2)));
        let mut app = App::open(store.clone(), Some(src), epoch);
        app.dispatch(Action::Startup).unwrap();
        app.dispatch(Action::EditPrice { raw: "1.25".into() }).unwrap();
        app.settle().await.unwrap();
        assert_eq!(
            app.session().context.reference_price_per_gram,
            Decimal::new(125, 2)
        );
        assert_eq!(
            load_snapshot(&store).unwrap().unwrap().nisab_price,
            Decimal::new(125, 2)
        );
    }

    struct HangingSource;

    #[async_trait]
    impl SpotSource for HangingSource {
        async fn silver_per_ounce(&self) -> Result<Decimal, FeedError> {
            std::future::pending::<Result<Decimal, FeedError>>().await
        }
    }

    #[tokio::test]
    async fn typed_price_does_not_wait_for_lookup() {
        let src: Arc<dyn SpotSource> = Arc::new(HangingSource);
        let mut app = App::open(MemoryStore::new(), Some(src), epoch);
        app.dispatch(Action::Startup).unwrap();
        app.dispatch(Action::EditPrice { raw: "1.25".into() }).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(5), app.settle())
            .await
            .expect("settle returned without waiting on the lookup")
            .unwrap();
        assert_eq!(
            app.session().context.reference_price_per_gram,
            Decimal::new(125, 2)
        );
        assert_eq!(app.session().price.status, FetchStatus::Idle);
    }

    #[tokio::test]
    async fn offline_marks_price_unavailable() {
        let mut app = App::open(MemoryStore::new(), None, epoch);
        app.dispatch(Action::Startup).unwrap();
        app.settle().await.unwrap();
        assert_eq!(app.session().price.status, FetchStatus::Unavailable);
        assert_eq!(app.session().context.reference_price_per_gram, Decimal::ZERO);
    }

    #[tokio::test]
    async fn failing_source_marks_price_unavailable() {
        let (src, calls) = source(None);
        let mut app = App::open(MemoryStore::new(), Some(src), epoch);
        app.dispatch(Action::Startup).unwrap();
        app.settle().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(app.session().price.status, FetchStatus::Unavailable);
    }

    #[tokio::test]
    async fn clear_removes_snapshot() {
        let store = MemoryStore::new();
        let mut app = App::open(store.clone(), None, epoch);
        app.dispatch(Action::SetAmount {
            field: "savings".into(),
            raw: "100".into(),
        })
        .unwrap();
        assert!(load_snapshot(&store).unwrap().is_some());
        app.dispatch(Action::ClearAll).unwrap();
        assert!(load_snapshot(&store).unwrap().is_none());
        assert!(app.session().entries.is_empty());
    }

    #[tokio::test]
    async fn corrupt_snapshot_starts_empty() {
        let store = MemoryStore::new();
        store.set(persistence::SNAPSHOT_KEY, "not json").unwrap();
        let app = App::open(store, None, epoch);
        assert_eq!(app.session(), &Session::new());
    }
}
