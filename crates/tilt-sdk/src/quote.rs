//! Price quotes
//!
//! The contract's own read methods are authoritative. The curve estimator is
//! used only when no contract is configured or the read fails, and the quote
//! records which path produced it.

use crate::chain::ChainReader;
use crate::errors::{SdkError, SdkResult};
use crate::sync::SyncState;
use std::sync::Arc;
use tilt_core::{estimate, format_ether, CurveQuote, TiltCoreError, TradeKind, U256};
use tracing::warn;

/// Where a quote's value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteSource {
    /// Returned by the contract's view method
    Chain,
    /// Computed locally by the curve estimator
    Estimate,
}

/// Price of a trade as shown before signing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuote {
    pub kind: TradeKind,
    pub amount: U256,
    /// Payable (mint) or receivable (burn) amount in wei
    pub value_wei: U256,
    /// `value_wei` as an 18-decimal ether string
    pub value: String,
    pub valid_against_supply: U256,
    pub source: QuoteSource,
}

impl PriceQuote {
    fn from_chain(kind: TradeKind, amount: U256, supply: U256, value_wei: U256) -> Self {
        Self {
            kind,
            amount,
            value_wei,
            value: format_ether(value_wei),
            valid_against_supply: supply,
            source: QuoteSource::Chain,
        }
    }

    fn from_estimate(quote: CurveQuote) -> Self {
        Self {
            kind: quote.kind,
            amount: quote.amount,
            value_wei: quote.net,
            value: quote.display_value(),
            valid_against_supply: quote.valid_against_supply,
            source: QuoteSource::Estimate,
        }
    }

    /// Whether the value is only an estimate
    pub fn is_estimate(&self) -> bool {
        self.source == QuoteSource::Estimate
    }
}

/// Produces quotes, preferring the contract when one is reachable
#[derive(Clone, Default)]
pub struct Quoter {
    chain: Option<Arc<dyn ChainReader>>,
}

impl Quoter {
    pub fn new(chain: Option<Arc<dyn ChainReader>>) -> Self {
        Self { chain }
    }

    /// Quoter that never reads the chain
    pub fn estimate_only() -> Self {
        Self { chain: None }
    }

    pub async fn mint_quote(&self, amount: U256, supply: U256) -> SdkResult<PriceQuote> {
        self.quote(TradeKind::Mint, amount, supply).await
    }

    pub async fn burn_quote(&self, amount: U256, supply: U256) -> SdkResult<PriceQuote> {
        self.quote(TradeKind::Burn, amount, supply).await
    }

    /// Quote against the supply snapshot a sync client last received
    pub async fn quote_from_state(
        &self,
        kind: TradeKind,
        amount: U256,
        state: &SyncState,
    ) -> SdkResult<PriceQuote> {
        let supply = state.supply_snapshot().ok_or(SdkError::NoSupplySnapshot)?;
        self.quote(kind, amount, supply).await
    }

    pub async fn quote(&self, kind: TradeKind, amount: U256, supply: U256) -> SdkResult<PriceQuote> {
        if amount == U256::ZERO {
            return Err(TiltCoreError::InvalidAmount.into());
        }

        if let Some(chain) = &self.chain {
            let read = match kind {
                TradeKind::Mint => chain.mint_fees_with_fee(amount).await,
                TradeKind::Burn => chain.burn_refunds_after_fee(amount).await,
            };
            match read {
                Ok(value) => return Ok(PriceQuote::from_chain(kind, amount, supply, value)),
                Err(e) => warn!("Contract quote failed, using curve estimate: {}", e),
            }
        }

        Ok(PriceQuote::from_estimate(estimate(kind, amount, supply)?))
    }
}

/// Holds the most recent quote and drops it once supply moves on
#[derive(Debug, Default)]
pub struct QuoteTracker {
    latest: Option<PriceQuote>,
}

impl QuoteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, quote: PriceQuote) {
        self.latest = Some(quote);
    }

    /// The recorded quote, if it was computed against `supply`.
    /// A quote for any other supply is discarded.
    pub fn current(&mut self, supply: U256) -> Option<&PriceQuote> {
        if self
            .latest
            .as_ref()
            .is_some_and(|q| q.valid_against_supply != supply)
        {
            self.latest = None;
        }
        self.latest.as_ref()
    }

    pub fn clear(&mut self) {
        self.latest = None;
    }
}
