//! Balance posting shared by every booking path

use chrono::Utc;
use tracing::{debug, warn};

use core_kernel::{AccountId, CashFlowId, Money, Timezone};

use crate::account::{Account, BalanceChange};
use crate::cash_flow::{CashFlow, FlowDirection};
use crate::error::LedgerError;
use crate::events::EventOutcome;
use crate::ports::LedgerUnitOfWork;
use crate::transaction::{AppliedLeg, AuditEvent, FinancialTransaction};

/// Locks an account that must exist and be active
pub(crate) async fn lock_active_account(
    uow: &mut dyn LedgerUnitOfWork,
    id: AccountId,
) -> Result<Account, LedgerError> {
    match uow.lock_account(id).await {
        Ok(account) if account.is_active => Ok(account),
        Ok(account) => Err(LedgerError::AccountInactive(account.code)),
        Err(err) if err.is_not_found() => Err(LedgerError::AccountNotFound(id.to_string())),
        Err(err) => Err(err.into()),
    }
}

/// Mutates every account the completed transaction touches
///
/// Appends one cash flow per leg that moved money, records the applied
/// amounts in the audit trail and sets `balance_applied`. Calling it again
/// for the same transaction is a no-op.
pub(crate) async fn apply_transaction(
    uow: &mut dyn LedgerUnitOfWork,
    txn: &mut FinancialTransaction,
    timezone: &Timezone,
) -> Result<EventOutcome, LedgerError> {
    let mut outcome = EventOutcome::default();
    if txn.audit.balance_applied {
        debug!(code = %txn.code, "Balance already applied");
        return Ok(outcome);
    }
    if !txn.is_completed() {
        return Err(LedgerError::InvalidTransactionState {
            code: txn.code.clone(),
            from: txn.status.to_string(),
            to: "posted".to_string(),
        });
    }

    let mut legs = Vec::new();
    for (index, (account_id, direction)) in txn.legs().into_iter().enumerate() {
        let mut account = lock_active_account(uow, account_id).await?;
        let change = account.adjust_balance(txn.amount, direction)?;
        uow.save_account(&account).await?;

        if change.was_clamped() {
            txn.audit.note(
                AuditEvent::Clamped,
                format!("{} clamped to zero, shortfall {}", account.code, change.shortfall),
            );
        }
        if index == 0 {
            txn.audit.applied_amount = change.applied;
        }
        txn.audit.clamped_shortfall += change.shortfall;

        if change.applied.is_positive() {
            let flow = cash_flow_for(txn, &account, direction, &change, timezone, None);
            uow.append_cash_flow(&flow).await?;
            outcome.cash_flows.push(flow);
        }

        legs.push(AppliedLeg {
            account_id,
            direction,
            requested: change.requested,
            applied: change.applied,
        });
        outcome.accounts.push(account);
    }

    txn.audit.legs = legs;
    txn.audit.balance_applied = true;
    Ok(outcome)
}

/// Undoes the applied balance effect of a transaction
///
/// Each applied leg gets an opposite-direction cash flow; nothing already
/// recorded is touched.
pub(crate) async fn reverse_transaction(
    uow: &mut dyn LedgerUnitOfWork,
    txn: &mut FinancialTransaction,
    timezone: &Timezone,
    reason: &str,
) -> Result<EventOutcome, LedgerError> {
    let mut outcome = EventOutcome::default();
    if !txn.audit.balance_applied {
        return Ok(outcome);
    }

    let mut reversed = Money::ZERO;
    for leg in txn.audit.legs.clone() {
        if !leg.applied.is_positive() {
            continue;
        }
        let direction = leg.direction.opposite();
        let mut account = lock_active_account(uow, leg.account_id).await?;
        let change = account.adjust_balance(leg.applied, direction)?;
        uow.save_account(&account).await?;

        if change.applied.is_positive() {
            let description = format!("Reversal of {}: {}", txn.code, reason);
            let flow = cash_flow_for(txn, &account, direction, &change, timezone, Some(description));
            uow.append_cash_flow(&flow).await?;
            outcome.cash_flows.push(flow);
        }
        if change.was_clamped() {
            warn!(
                code = %txn.code,
                account = %account.code,
                shortfall = %change.shortfall,
                "Reversal clamped"
            );
        }
        reversed += change.applied;
        outcome.accounts.push(account);
    }

    txn.audit.balance_applied = false;
    txn.audit.note(AuditEvent::Reversed, format!("reversed {} ({})", reversed, reason));
    Ok(outcome)
}

fn cash_flow_for(
    txn: &FinancialTransaction,
    account: &Account,
    direction: FlowDirection,
    change: &BalanceChange,
    timezone: &Timezone,
    description: Option<String>,
) -> CashFlow {
    let now = Utc::now();
    CashFlow {
        id: CashFlowId::new_v7(),
        flow_date: timezone.business_date(now),
        flow_type: txn.category.flow_type(),
        direction,
        category: txn.category,
        amount: change.applied,
        account_id: account.id,
        transaction_id: Some(txn.id),
        description: description.unwrap_or_else(|| txn.description.clone()),
        running_balance: change.new_balance,
        created_at: now,
    }
}
