//! Reconciliation Engine
//!
//! Recomputes account balances from their cash flow history. Cash flows are
//! the ground truth and are never modified here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use core_kernel::{AccountId, Money};

use crate::account::Account;
use crate::cash_flow::FlowTotals;
use crate::error::LedgerError;
use crate::ports::{CashFlowFilter, LedgerStore};

/// Stored versus recomputed balance for one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountReconciliation {
    pub account_id: AccountId,
    pub code: String,
    pub name: String,
    pub opening_balance: Money,
    pub stored_balance: Money,
    pub recomputed_balance: Money,
    /// `stored - recomputed`
    pub drift: Money,
    pub inflow: Money,
    pub outflow: Money,
    pub flow_count: u64,
}

impl AccountReconciliation {
    fn new(account: &Account, totals: &FlowTotals) -> Self {
        let recomputed = account.opening_balance + totals.net();
        Self {
            account_id: account.id,
            code: account.code.clone(),
            name: account.name.clone(),
            opening_balance: account.opening_balance,
            stored_balance: account.current_balance,
            recomputed_balance: recomputed,
            drift: account.current_balance - recomputed,
            inflow: totals.inflow,
            outflow: totals.outflow,
            flow_count: totals.count,
        }
    }

    pub fn has_drift(&self) -> bool {
        !self.drift.is_zero()
    }
}

/// Outcome of a reconciliation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub checked_at: DateTime<Utc>,
    pub accounts: Vec<AccountReconciliation>,
    /// True when stored balances were overwritten
    pub corrected: bool,
}

impl ReconciliationReport {
    pub fn has_drift(&self) -> bool {
        self.accounts.iter().any(AccountReconciliation::has_drift)
    }

    pub fn drifted(&self) -> impl Iterator<Item = &AccountReconciliation> {
        self.accounts.iter().filter(|account| account.has_drift())
    }
}

/// Balance repair and verification
///
/// # Example
///
/// ```rust,ignore
/// use domain_ledger::ReconciliationEngine;
///
/// let engine = ReconciliationEngine::new(store);
/// if engine.verify_balances().await?.has_drift() {
///     engine.recalculate_balances().await?;
/// }
/// ```
#[derive(Clone)]
pub struct ReconciliationEngine {
    store: Arc<dyn LedgerStore>,
}

impl ReconciliationEngine {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Overwrites every auto-updated balance with `opening + inflows - outflows`
    ///
    /// Safe to run repeatedly; a second run finds no drift.
    ///
    /// # Returns
    ///
    /// One line per reconciled account, with `corrected` set. Accounts
    /// without automatic balance updates are left out.
    #[instrument(skip(self))]
    pub async fn recalculate_balances(&self) -> Result<ReconciliationReport, LedgerError> {
        let mut uow = self.store.begin().await?;
        let accounts = uow.lock_reconcilable_accounts().await?;

        let mut lines = Vec::with_capacity(accounts.len());
        for mut account in accounts {
            let totals = uow.flow_totals(account.id).await?;
            let line = AccountReconciliation::new(&account, &totals);
            if line.has_drift() {
                warn!(
                    account = %account.code,
                    stored = %line.stored_balance,
                    recomputed = %line.recomputed_balance,
                    drift = %line.drift,
                    "Balance drift corrected"
                );
                account.current_balance = line.recomputed_balance;
                account.updated_at = Utc::now();
                uow.save_account(&account).await?;
            }
            lines.push(line);
        }
        uow.commit().await?;

        let report = ReconciliationReport {
            checked_at: Utc::now(),
            accounts: lines,
            corrected: true,
        };
        info!(
            accounts = report.accounts.len(),
            drifted = report.drifted().count(),
            "Balances recalculated"
        );
        Ok(report)
    }

    /// Reports drift without changing anything
    #[instrument(skip(self))]
    pub async fn verify_balances(&self) -> Result<ReconciliationReport, LedgerError> {
        let accounts = self.store.list_accounts().await?;

        let mut lines = Vec::new();
        for account in accounts.iter().filter(|account| account.auto_update_balance) {
            let flows = self.store.cash_flows(&CashFlowFilter::for_account(account.id)).await?;
            let totals = FlowTotals::from_flows(&flows);
            let line = AccountReconciliation::new(account, &totals);
            if line.has_drift() {
                warn!(account = %account.code, drift = %line.drift, "Balance drift detected");
            }
            lines.push(line);
        }

        Ok(ReconciliationReport {
            checked_at: Utc::now(),
            accounts: lines,
            corrected: false,
        })
    }
}
