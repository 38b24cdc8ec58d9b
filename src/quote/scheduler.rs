//! Debounced quote scheduling
//!
//! Every request gets a sequence number. A request only starts fetching after
//! the quiet period if no newer request arrived meanwhile, and its result is
//! only published if it is still the newest one. Nothing is cancelled:
//! superseded fetches run to completion and are dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::{Quote, QuoteFetcher, QuoteRequest};
use crate::error::DexError;

/// Quiet period after the last input change
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Quote slot as seen by the front end
#[derive(Debug, Clone, PartialEq)]
pub enum QuoteState {
    /// Nothing to quote (missing token or amount)
    Idle,
    Quoting { seq: u64 },
    Quoted { seq: u64, quote: Quote },
    NoRoute { seq: u64 },
    Failed { seq: u64, error: DexError },
}

impl QuoteState {
    pub fn seq(&self) -> Option<u64> {
        match self {
            QuoteState::Idle => None,
            QuoteState::Quoting { seq }
            | QuoteState::Quoted { seq, .. }
            | QuoteState::NoRoute { seq }
            | QuoteState::Failed { seq, .. } => Some(*seq),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, QuoteState::Quoting { .. })
    }

    pub fn quote(&self) -> Option<&Quote> {
        match self {
            QuoteState::Quoted { quote, .. } => Some(quote),
            _ => None,
        }
    }
}

pub struct QuoteScheduler {
    fetcher: Arc<QuoteFetcher>,
    debounce: Duration,
    latest: Arc<AtomicU64>,
    state: Arc<watch::Sender<QuoteState>>,
}

impl QuoteScheduler {
    pub fn new(fetcher: Arc<QuoteFetcher>, debounce: Duration) -> Self {
        let (state, _) = watch::channel(QuoteState::Idle);
        Self {
            fetcher,
            debounce,
            latest: Arc::new(AtomicU64::new(0)),
            state: Arc::new(state),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<QuoteState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> QuoteState {
        self.state.borrow().clone()
    }

    /// Newest sequence number issued
    pub fn latest_seq(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Schedule a quote for the current inputs. `None` (or a zero amount)
    /// clears the slot after the quiet period.
    pub fn request(&self, request: Option<QuoteRequest>) -> (u64, JoinHandle<()>) {
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        trace!("Quote request #{} scheduled", seq);

        let fetcher = self.fetcher.clone();
        let latest = self.latest.clone();
        let state = self.state.clone();
        let debounce = self.debounce;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;

            let is_latest = || latest.load(Ordering::SeqCst) == seq;
            if !is_latest() {
                trace!("Quote request #{} superseded before start", seq);
                return;
            }

            let request = match request {
                Some(r) if !r.amount_in.is_zero() => r,
                _ => {
                    state.send_replace(QuoteState::Idle);
                    return;
                }
            };

            state.send_replace(QuoteState::Quoting { seq });
            let result = fetcher.quote(&request).await;

            if !is_latest() {
                debug!("Dropping result of superseded quote request #{}", seq);
                return;
            }

            let next = match result {
                Ok(quote) => QuoteState::Quoted { seq, quote },
                Err(DexError::NoRoute { .. }) => QuoteState::NoRoute { seq },
                Err(error) => QuoteState::Failed { seq, error },
            };
            state.send_replace(next);
        });

        (seq, handle)
    }
}
