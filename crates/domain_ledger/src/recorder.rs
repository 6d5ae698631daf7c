//! Transaction Recorder
//!
//! Turns business events into balance mutations, cash flows, stock movements
//! and immutable transaction records. Each event runs as one unit of work:
//!
//! 1. claim the event's idempotency key (a duplicate means "already recorded")
//! 2. resolve the account through [`AccountMapping`] and lock it
//! 3. create the transaction with its resolved status
//! 4. when completed, mutate balances and append cash flows
//! 5. book cost of goods for sales with a cost basis
//! 6. move stock whose idempotency key is still unclaimed
//! 7. commit; any failure drops the unit of work and nothing is kept
//!
//! Event payloads are validated before a unit of work is opened.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use core_kernel::{AccountId, PayrollId, Timezone, UserId};
use domain_inventory::{
    plan_intake, plan_line_edit, plan_reduce, plan_restore, validate_lines, LineQuantity, MovementContext,
    StockMovement,
};

use crate::error::LedgerError;
use crate::events::{EventOutcome, LedgerEvent};
use crate::payment::{resolve_status, AccountMapping};
use crate::payroll::book_payroll_payment;
use crate::ports::{IdempotencyKey, LedgerStore, LedgerUnitOfWork};
use crate::posting::{apply_transaction, lock_active_account, reverse_transaction};
use crate::source::{Purchase, Sale, SaleStatus};
use crate::stock::apply_plan;
use crate::transaction::{
    transaction_code, AuditKind, CodePrefix, FinancialTransaction, TransactionCategory,
    TransactionKind, TransactionStatus,
};

/// Records inbound business events against the ledger
///
/// # Example
///
/// ```rust,ignore
/// use domain_ledger::{AccountMapping, AccountCodes, TransactionRecorder};
///
/// let mapping = AccountMapping::resolve(store.as_ref(), &AccountCodes::default()).await?;
/// let recorder = TransactionRecorder::new(store, mapping).with_timezone(Timezone::default());
/// recorder.record_sale_created(&sale).await?;
/// recorder.record_sale(&sale).await?;
/// ```
#[derive(Clone)]
pub struct TransactionRecorder {
    store: Arc<dyn LedgerStore>,
    mapping: AccountMapping,
    timezone: Timezone,
}

impl TransactionRecorder {
    /// Creates a recorder over `store`
    ///
    /// # Arguments
    ///
    /// * `store` - Ledger persistence port; every event opens one unit of work on it
    /// * `mapping` - Account ids resolved from the configured chart codes
    pub fn new(store: Arc<dyn LedgerStore>, mapping: AccountMapping) -> Self {
        Self {
            store,
            mapping,
            timezone: Timezone::default(),
        }
    }

    pub fn with_timezone(mut self, timezone: Timezone) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn mapping(&self) -> &AccountMapping {
        &self.mapping
    }

    /// Records any inbound event
    ///
    /// # Returns
    ///
    /// The transactions, cash flows and stock movements the event produced.
    /// A replayed event returns an empty outcome flagged `already_recorded`.
    ///
    /// # Errors
    ///
    /// Fails with the first [`LedgerError`] raised while booking; nothing the
    /// event touched is kept in that case.
    #[instrument(skip(self, event), fields(event = event.name()))]
    pub async fn record_event(&self, event: LedgerEvent) -> Result<EventOutcome, LedgerError> {
        match event {
            LedgerEvent::SaleCreated { sale } => self.record_sale_created(&sale).await,
            LedgerEvent::SaleCompleted { sale } => self.record_sale(&sale).await,
            LedgerEvent::SaleEdited { sale, old_lines, new_lines } => {
                self.edit_sale(&sale, &old_lines, &new_lines).await
            }
            LedgerEvent::SaleDeleted { sale } => self.delete_sale(&sale).await,
            LedgerEvent::PurchaseCompleted { purchase } => self.record_purchase(&purchase).await,
            LedgerEvent::PayrollPaymentRequested { payroll_id, account_id, approver } => {
                self.record_payroll_payment(payroll_id, account_id, approver).await
            }
            LedgerEvent::PaymentConfirmed { sale } => self.confirm_payment(&sale).await,
            LedgerEvent::PaymentRejected { sale, reason } => self.reject_payment(&sale, &reason).await,
        }
    }

    /// Books `out` movements for every line of a new sale
    ///
    /// # Errors
    ///
    /// * `InvalidTransaction` - a line quantity is not positive or the total is off
    /// * `Inventory(InsufficientStock)` - any line would drive stock below zero
    #[instrument(skip(self, sale), fields(sale = %sale.id))]
    pub async fn record_sale_created(&self, sale: &Sale) -> Result<EventOutcome, LedgerError> {
        sale.validate()?;
        let reference = sale.reference();
        let mut uow = self.store.begin().await?;
        if !uow.claim_idempotency_key(&IdempotencyKey::stock_reduced(&reference)).await? {
            debug!("Sale stock already reduced");
            uow.rollback().await?;
            return Ok(EventOutcome::already_recorded());
        }

        let movements = self.reduce_sale_stock(uow.as_mut(), sale).await?;
        uow.commit().await?;

        info!(invoice = %sale.invoice_number, lines = movements.len(), "Sale stock reduced");
        Ok(EventOutcome {
            movements,
            ..EventOutcome::default()
        })
    }

    /// Books a sale's income and, when completed, its cost of goods
    ///
    /// Stock is reduced here too when no creation event has reduced it yet,
    /// so a sale that arrives only as completed still leaves the shelf.
    #[instrument(skip(self, sale), fields(sale = %sale.id))]
    pub async fn record_sale(&self, sale: &Sale) -> Result<EventOutcome, LedgerError> {
        sale.validate()?;
        let reference = sale.reference();
        let mut uow = self.store.begin().await?;
        if !uow.claim_idempotency_key(&IdempotencyKey::sale_recorded(&reference)).await? {
            debug!("Sale already recorded");
            uow.rollback().await?;
            return Ok(EventOutcome::already_recorded());
        }

        let account_id = self.mapping.account_for(sale.payment_method);
        let account = lock_active_account(uow.as_mut(), account_id)
            .await
            .map_err(|err| match err {
                LedgerError::AccountNotFound(_) => LedgerError::NoAccountForMethod(sale.payment_method),
                other => other,
            })?;

        let today = self.timezone.business_date(Utc::now());
        let mut txn = FinancialTransaction::new(
            transaction_code(CodePrefix::Sale, &reference, today),
            TransactionKind::Income,
            TransactionCategory::Sales,
            sale.total_amount,
            AuditKind::Sale,
        )
        .to_account(account.id)
        .referencing(reference)
        .described(format!("Sale {}", sale.invoice_number))
        .with_subcategory(sale.payment_method.as_str())
        .created_by(sale.cashier);
        txn.validate()?;

        let mut outcome = EventOutcome::default();
        let status = resolve_status(sale.payment_method, sale.channel, sale.status);
        if status == TransactionStatus::Completed {
            txn.complete(sale.cashier)?;
            outcome.merge(apply_transaction(uow.as_mut(), &mut txn, &self.timezone).await?);
        }
        uow.insert_transaction(&txn).await?;

        let completed = txn.is_completed();
        info!(
            code = %txn.code,
            account = %account.code,
            amount = %txn.amount,
            status = %txn.status,
            "Sale recorded"
        );
        outcome.transactions.insert(0, txn);

        if completed {
            if let Some(cogs) = self.book_cost_of_goods(uow.as_mut(), sale).await? {
                outcome.merge(cogs);
            }
        }

        if uow.claim_idempotency_key(&IdempotencyKey::stock_reduced(&reference)).await? {
            outcome.movements = self.reduce_sale_stock(uow.as_mut(), sale).await?;
            debug!(lines = outcome.movements.len(), "Sale stock reduced on completion");
        }

        uow.commit().await?;
        Ok(outcome)
    }

    /// Completes a pending sale transaction
    #[instrument(skip(self, sale), fields(sale = %sale.id))]
    pub async fn confirm_payment(&self, sale: &Sale) -> Result<EventOutcome, LedgerError> {
        sale.validate()?;
        let reference = sale.reference();
        let mut uow = self.store.begin().await?;
        let transactions = uow.lock_transactions_for(&reference).await?;

        let mut primary = transactions
            .iter()
            .find(|txn| txn.category == TransactionCategory::Sales)
            .cloned()
            .ok_or_else(|| LedgerError::TransactionNotFound(reference.to_string()))?;

        match primary.status {
            TransactionStatus::Completed => {
                debug!(code = %primary.code, "Payment already confirmed");
                uow.rollback().await?;
                return Ok(EventOutcome::already_recorded());
            }
            TransactionStatus::Cancelled => {
                return Err(LedgerError::InvalidTransactionState {
                    code: primary.code,
                    from: TransactionStatus::Cancelled.to_string(),
                    to: TransactionStatus::Completed.to_string(),
                });
            }
            TransactionStatus::Pending => {}
        }

        primary.complete(sale.cashier)?;
        let mut outcome = apply_transaction(uow.as_mut(), &mut primary, &self.timezone).await?;
        uow.update_transaction(&primary).await?;
        info!(code = %primary.code, amount = %primary.amount, "Payment confirmed");
        outcome.transactions.insert(0, primary);

        let has_cogs = transactions
            .iter()
            .any(|txn| txn.category == TransactionCategory::CostOfGoods && !txn.is_cancelled());
        if !has_cogs {
            if let Some(cogs) = self.book_cost_of_goods(uow.as_mut(), sale).await? {
                outcome.merge(cogs);
            }
        }

        uow.commit().await?;
        Ok(outcome)
    }

    /// Cancels a sale's transactions, reversing applied balances, and restores its stock
    #[instrument(skip(self, sale), fields(sale = %sale.id))]
    pub async fn reject_payment(&self, sale: &Sale, reason: &str) -> Result<EventOutcome, LedgerError> {
        sale.validate()?;
        let reference = sale.reference();
        let mut uow = self.store.begin().await?;
        let transactions = uow.lock_transactions_for(&reference).await?;

        let mut outcome = EventOutcome::default();
        for mut txn in transactions {
            if txn.is_cancelled() {
                continue;
            }
            if txn.audit.balance_applied {
                outcome.merge(reverse_transaction(uow.as_mut(), &mut txn, &self.timezone, reason).await?);
            }
            txn.cancel(format!("payment rejected: {}", reason))?;
            uow.update_transaction(&txn).await?;
            outcome.transactions.push(txn);
        }

        outcome.movements = self
            .restore_sale_stock(uow.as_mut(), sale, &format!("Payment rejected: {}", reason))
            .await?;

        if outcome.transactions.is_empty() && outcome.movements.is_empty() {
            uow.rollback().await?;
            return Ok(EventOutcome::already_recorded());
        }

        uow.commit().await?;
        info!(
            invoice = %sale.invoice_number,
            cancelled = outcome.transactions.len(),
            restored = outcome.movements.len(),
            "Payment rejected"
        );
        Ok(outcome)
    }

    /// Re-books edited sale lines with the return-then-out protocol
    ///
    /// # Arguments
    ///
    /// * `sale` - The sale as it is after the edit
    /// * `old_lines` - Quantities that were taken out before the edit
    /// * `new_lines` - Quantities to take out now
    ///
    /// Stock moves only when the sale's stock is currently out. Pending sale
    /// transactions are amended to the new total.
    #[instrument(skip(self, sale, old_lines, new_lines), fields(sale = %sale.id))]
    pub async fn edit_sale(
        &self,
        sale: &Sale,
        old_lines: &[LineQuantity],
        new_lines: &[LineQuantity],
    ) -> Result<EventOutcome, LedgerError> {
        sale.validate()?;
        validate_lines(old_lines)?;
        validate_lines(new_lines)?;
        let reference = sale.reference();
        let mut uow = self.store.begin().await?;
        let transactions = uow.lock_transactions_for(&reference).await?;
        ensure_changeable(sale, &transactions)?;

        let mut outcome = EventOutcome::default();
        if self.stock_is_out(uow.as_mut(), sale).await? {
            let context = MovementContext {
                source: Some(reference),
                edit_batch: Some(Uuid::now_v7()),
                reason: None,
            };
            outcome.movements = apply_plan(
                uow.as_mut(),
                &plan_line_edit(old_lines, new_lines)?,
                &format!("Edit of sale {}", sale.invoice_number),
                sale.cashier,
                &context,
            )
            .await?;
        }

        for mut txn in transactions {
            if txn.status == TransactionStatus::Pending && txn.category == TransactionCategory::Sales {
                txn.change_amount(sale.total_amount)?;
                uow.update_transaction(&txn).await?;
                outcome.transactions.push(txn);
            }
        }

        uow.commit().await?;
        info!(
            invoice = %sale.invoice_number,
            movements = outcome.movements.len(),
            "Sale edited"
        );
        Ok(outcome)
    }

    /// Cancels a deleted sale's pending transactions and restores its stock
    #[instrument(skip(self, sale), fields(sale = %sale.id))]
    pub async fn delete_sale(&self, sale: &Sale) -> Result<EventOutcome, LedgerError> {
        sale.validate()?;
        let reference = sale.reference();
        let mut uow = self.store.begin().await?;
        let transactions = uow.lock_transactions_for(&reference).await?;
        ensure_changeable(sale, &transactions)?;

        let mut outcome = EventOutcome::default();
        for mut txn in transactions {
            if txn.status == TransactionStatus::Pending {
                txn.cancel("sale deleted")?;
                uow.update_transaction(&txn).await?;
                outcome.transactions.push(txn);
            }
        }

        outcome.movements = self
            .restore_sale_stock(uow.as_mut(), sale, &format!("Sale {} deleted", sale.invoice_number))
            .await?;

        if outcome.transactions.is_empty() && outcome.movements.is_empty() {
            uow.rollback().await?;
            return Ok(EventOutcome::already_recorded());
        }

        uow.commit().await?;
        info!(invoice = %sale.invoice_number, restored = outcome.movements.len(), "Sale deleted");
        Ok(outcome)
    }

    /// Books a purchase as a transfer from the paying account into inventory
    ///
    /// # Returns
    ///
    /// The completed purchase transaction followed by its cash flows and one
    /// `in` movement per line.
    #[instrument(skip(self, purchase), fields(purchase = %purchase.id))]
    pub async fn record_purchase(&self, purchase: &Purchase) -> Result<EventOutcome, LedgerError> {
        purchase.validate()?;
        let reference = purchase.reference();
        let mut uow = self.store.begin().await?;
        if !uow.claim_idempotency_key(&IdempotencyKey::purchase_recorded(&reference)).await? {
            debug!("Purchase already recorded");
            uow.rollback().await?;
            return Ok(EventOutcome::already_recorded());
        }

        let payer_id = self.mapping.account_for(purchase.payment_method);
        let payer = lock_active_account(uow.as_mut(), payer_id)
            .await
            .map_err(|err| match err {
                LedgerError::AccountNotFound(_) => LedgerError::NoAccountForMethod(purchase.payment_method),
                other => other,
            })?;

        let today = self.timezone.business_date(Utc::now());
        let mut txn = FinancialTransaction::new(
            transaction_code(CodePrefix::Purchase, &reference, today),
            TransactionKind::Expense,
            TransactionCategory::Purchase,
            purchase.total_amount,
            AuditKind::Purchase,
        )
        .from_account(payer.id)
        .to_account(self.mapping.inventory)
        .referencing(reference)
        .described(format!("Purchase {} from {}", purchase.reference_number, purchase.supplier))
        .with_subcategory(purchase.payment_method.as_str())
        .created_by(purchase.purchased_by);
        txn.validate()?;
        txn.complete(purchase.purchased_by)?;

        let mut outcome = apply_transaction(uow.as_mut(), &mut txn, &self.timezone).await?;
        uow.insert_transaction(&txn).await?;

        let context = MovementContext {
            source: Some(reference),
            ..MovementContext::default()
        };
        outcome.movements = apply_plan(
            uow.as_mut(),
            &plan_intake(&purchase.line_quantities())?,
            &format!("Purchase {}", purchase.reference_number),
            purchase.purchased_by,
            &context,
        )
        .await?;

        uow.commit().await?;
        info!(code = %txn.code, amount = %txn.amount, "Purchase recorded");
        outcome.transactions.insert(0, txn);
        Ok(outcome)
    }

    /// Pays an approved payroll from a cash or bank account
    #[instrument(skip(self))]
    pub async fn record_payroll_payment(
        &self,
        payroll_id: PayrollId,
        account_id: Option<AccountId>,
        approver: UserId,
    ) -> Result<EventOutcome, LedgerError> {
        let mut uow = self.store.begin().await?;
        let outcome = book_payroll_payment(
            uow.as_mut(),
            &self.mapping,
            &self.timezone,
            payroll_id,
            account_id,
            approver,
        )
        .await?;
        uow.commit().await?;
        Ok(outcome)
    }

    async fn book_cost_of_goods(
        &self,
        uow: &mut dyn LedgerUnitOfWork,
        sale: &Sale,
    ) -> Result<Option<EventOutcome>, LedgerError> {
        let Some(cost) = sale.cost_basis().filter(|cost| cost.is_positive()) else {
            return Ok(None);
        };

        let reference = sale.reference();
        let today = self.timezone.business_date(Utc::now());
        let mut txn = FinancialTransaction::new(
            transaction_code(CodePrefix::CostOfGoods, &reference, today),
            TransactionKind::Expense,
            TransactionCategory::CostOfGoods,
            cost,
            AuditKind::CostOfGoods,
        )
        .from_account(self.mapping.inventory)
        .to_account(self.mapping.cost_of_goods)
        .referencing(reference)
        .described(format!("Cost of goods for sale {}", sale.invoice_number))
        .created_by(sale.cashier);
        txn.validate()?;
        txn.complete(sale.cashier)?;

        let mut outcome = apply_transaction(uow, &mut txn, &self.timezone).await?;
        if txn.audit.clamped_shortfall.is_positive() {
            warn!(
                code = %txn.code,
                cost = %cost,
                shortfall = %txn.audit.clamped_shortfall,
                "Inventory balance clamped to zero while booking cost of goods"
            );
        }
        uow.insert_transaction(&txn).await?;
        outcome.transactions.push(txn);
        Ok(Some(outcome))
    }

    /// True when the sale's stock was taken out and not yet put back
    async fn stock_is_out(&self, uow: &mut dyn LedgerUnitOfWork, sale: &Sale) -> Result<bool, LedgerError> {
        let reference = sale.reference();
        Ok(uow.has_idempotency_key(&IdempotencyKey::stock_reduced(&reference)).await?
            && !uow.has_idempotency_key(&IdempotencyKey::stock_restored(&reference)).await?)
    }

    /// Caller has claimed the `stock_reduced` key
    async fn reduce_sale_stock(
        &self,
        uow: &mut dyn LedgerUnitOfWork,
        sale: &Sale,
    ) -> Result<Vec<StockMovement>, LedgerError> {
        let context = MovementContext {
            source: Some(sale.reference()),
            ..MovementContext::default()
        };
        apply_plan(
            uow,
            &plan_reduce(&sale.line_quantities())?,
            &format!("Sale {}", sale.invoice_number),
            sale.cashier,
            &context,
        )
        .await
    }

    async fn restore_sale_stock(
        &self,
        uow: &mut dyn LedgerUnitOfWork,
        sale: &Sale,
        description: &str,
    ) -> Result<Vec<StockMovement>, LedgerError> {
        let reference = sale.reference();
        if !uow.has_idempotency_key(&IdempotencyKey::stock_reduced(&reference)).await? {
            return Ok(Vec::new());
        }
        if !uow.claim_idempotency_key(&IdempotencyKey::stock_restored(&reference)).await? {
            return Ok(Vec::new());
        }
        let context = MovementContext {
            source: Some(reference),
            ..MovementContext::default()
        };
        apply_plan(
            uow,
            &plan_restore(&sale.line_quantities())?,
            description,
            sale.cashier,
            &context,
        )
        .await
    }
}

/// Completed sales, or sales with completed money, are frozen
fn ensure_changeable(sale: &Sale, transactions: &[FinancialTransaction]) -> Result<(), LedgerError> {
    if sale.status == SaleStatus::Completed {
        return Err(LedgerError::SaleLocked {
            sale: sale.id,
            reason: "sale is completed".to_string(),
        });
    }
    if let Some(txn) = transactions.iter().find(|txn| txn.is_completed()) {
        return Err(LedgerError::SaleLocked {
            sale: sale.id,
            reason: format!("transaction {} is completed", txn.code),
        });
    }
    Ok(())
}
