//! Fee engine
//!
//! Static per-venue tables; `fee` is a pure function of the schedule and the request.
//! Results are always finite and non-negative.

use crate::types::{FeeCategory, FeeRequest};
use multivenue_core::Fixed;
use std::collections::HashMap;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct FeeSchedule {
    venue: String,
    taker_rate: Fixed,
    maker_rate: Fixed,
    withdrawal: HashMap<String, Fixed>,
    deposit: HashMap<String, Fixed>,
    bank_deposit: Fixed,
    bank_withdrawal: Fixed,
}

impl FeeSchedule {
    /// Rates are fractions of notional (0.002 = 0.2 %). Maker is capped at taker.
    pub fn new(venue: impl Into<String>, taker_rate: Fixed, maker_rate: Fixed) -> Self {
        let taker_rate = taker_rate.non_negative();
        Self {
            venue: venue.into(),
            taker_rate,
            maker_rate: maker_rate.non_negative().min(taker_rate),
            withdrawal: HashMap::new(),
            deposit: HashMap::new(),
            bank_deposit: Fixed::ZERO,
            bank_withdrawal: Fixed::ZERO,
        }
    }

    pub fn with_withdrawal_fee(mut self, currency: &str, fee: Fixed) -> Self {
        self.withdrawal.insert(currency.to_uppercase(), fee.non_negative());
        self
    }

    pub fn with_withdrawal_fees(self, fees: &[(&str, Fixed)]) -> Self {
        fees.iter().fold(self, |schedule, (currency, fee)| schedule.with_withdrawal_fee(currency, *fee))
    }

    pub fn with_deposit_fee(mut self, currency: &str, fee: Fixed) -> Self {
        self.deposit.insert(currency.to_uppercase(), fee.non_negative());
        self
    }

    pub fn with_bank_fees(mut self, deposit: Fixed, withdrawal: Fixed) -> Self {
        self.bank_deposit = deposit.non_negative();
        self.bank_withdrawal = withdrawal.non_negative();
        self
    }

    pub fn taker_rate(&self) -> Fixed {
        self.taker_rate
    }

    pub fn maker_rate(&self) -> Fixed {
        self.maker_rate
    }

    pub fn fee(&self, request: &FeeRequest) -> Fixed {
        let fee = match request.category {
            FeeCategory::TradeFee => self.trade_fee(request),
            FeeCategory::WithdrawalFee => self.withdrawal_fee(&request.first_currency),
            FeeCategory::DepositFee => self
                .deposit
                .get(&request.first_currency.to_uppercase())
                .copied()
                .unwrap_or(Fixed::ZERO),
            FeeCategory::BankDepositFee => self.bank_deposit,
            FeeCategory::BankWithdrawalFee => self.bank_withdrawal,
        };
        fee.non_negative()
    }

    /// Rate times notional. Without a positive price the notional is undefined: 0.
    /// A notional beyond the decimal range saturates at `Fixed::MAX`.
    fn trade_fee(&self, request: &FeeRequest) -> Fixed {
        if !request.price.is_positive() || !request.amount.is_positive() {
            return Fixed::ZERO;
        }
        let rate = if request.is_maker { self.maker_rate } else { self.taker_rate };
        match rate.checked_mul(request.amount).and_then(|scaled| scaled.checked_mul(request.price)) {
            Ok(fee) => fee,
            Err(_) => {
                warn!(
                    "💸 {} trade fee overflowed for {} x {}, saturating",
                    self.venue, request.amount, request.price
                );
                rate.saturating_mul(request.amount).saturating_mul(request.price)
            }
        }
    }

    /// Flat fee per currency. An unknown currency yields 0, logged so the under-quote is visible.
    pub fn withdrawal_fee(&self, currency: &str) -> Fixed {
        match self.withdrawal_fee_known(currency) {
            Some(fee) => fee,
            None => {
                warn!("💸 {} has no withdrawal fee for {}, quoting 0", self.venue, currency);
                Fixed::ZERO
            }
        }
    }

    /// Withdrawal fee, or `None` if the table does not list the currency
    pub fn withdrawal_fee_known(&self, currency: &str) -> Option<Fixed> {
        self.withdrawal.get(&currency.to_uppercase()).copied()
    }
}
