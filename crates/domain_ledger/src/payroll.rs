//! Payroll service
//!
//! Generation, approval and payment of monthly payroll records. Payment and
//! reversal book through the same posting path as sales, inside one unit of
//! work per call.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use core_kernel::{AccountId, PayrollId, PayrollPeriod, SourceRef, Timezone, UserId};
use domain_payroll::{
    calculate, payroll_code, Employee, PayrollConfig, PayrollError, PayrollRecord, PayrollStatus,
};

use crate::error::LedgerError;
use crate::events::EventOutcome;
use crate::payment::AccountMapping;
use crate::ports::{IdempotencyKey, LedgerStore, LedgerUnitOfWork};
use crate::posting::{apply_transaction, lock_active_account};
use crate::transaction::{
    transaction_code, AuditKind, CodePrefix, FinancialTransaction, TransactionCategory,
    TransactionKind,
};

/// Result of a generation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationReport {
    pub period: Option<PayrollPeriod>,
    pub created: Vec<PayrollRecord>,
    /// Employees that already had a record for the period
    pub skipped: Vec<UserId>,
}

/// Books the payment of an approved payroll record
///
/// The caller owns the unit of work and commits it. A record that is
/// already paid yields an `already_recorded` outcome.
pub(crate) async fn book_payroll_payment(
    uow: &mut dyn LedgerUnitOfWork,
    mapping: &AccountMapping,
    timezone: &Timezone,
    payroll_id: PayrollId,
    account_id: Option<AccountId>,
    approver: UserId,
) -> Result<EventOutcome, LedgerError> {
    let mut record = uow.lock_payroll(payroll_id).await?;
    let reference = SourceRef::payroll(record.id);

    if record.status == PayrollStatus::Paid
        && uow.has_idempotency_key(&IdempotencyKey::payroll_paid(&reference)).await?
    {
        debug!(code = %record.code, "Payroll already paid");
        return Ok(EventOutcome::already_recorded());
    }
    record.ensure_payable()?;

    if !uow.claim_idempotency_key(&IdempotencyKey::payroll_paid(&reference)).await? {
        return Ok(EventOutcome::already_recorded());
    }

    let account = lock_active_account(uow, account_id.unwrap_or(mapping.payroll)).await?;
    if !account.account_type.is_liquid() {
        return Err(LedgerError::InvalidTransaction(format!(
            "payroll must be paid from a cash or bank account, {} is {}",
            account.code, account.account_type
        )));
    }
    if !account.can_cover(record.net_salary) {
        return Err(LedgerError::InsufficientBalance {
            account: account.code.clone(),
            requested: record.net_salary.to_string(),
            available: account.current_balance.to_string(),
        });
    }

    let today = timezone.business_date(Utc::now());
    let mut txn = FinancialTransaction::new(
        transaction_code(CodePrefix::Payroll, &reference, today),
        TransactionKind::Expense,
        TransactionCategory::Payroll,
        record.net_salary,
        AuditKind::PayrollPayment,
    )
    .from_account(account.id)
    .referencing(reference)
    .described(format!("Salary payment {} for {}", record.code, record.period))
    .created_by(Some(approver));
    txn.validate()?;
    txn.complete(Some(approver))?;

    let mut outcome = apply_transaction(uow, &mut txn, timezone).await?;
    uow.insert_transaction(&txn).await?;

    record.mark_paid(txn.id, approver)?;
    uow.save_payroll(&record).await?;

    info!(
        code = %txn.code,
        payroll = %record.code,
        account = %account.code,
        amount = %txn.amount,
        "Payroll paid"
    );
    outcome.transactions.insert(0, txn);
    outcome.payroll = Some(record);
    Ok(outcome)
}

/// Payroll lifecycle operations
///
/// Records move `draft -> approved -> paid`; a paid record is corrected with
/// a compensating reversal, never edited.
///
/// # Example
///
/// ```rust,ignore
/// use domain_ledger::PayrollService;
///
/// let payroll = PayrollService::new(store, PayrollConfig::default(), mapping);
/// let report = payroll.generate(period, &employees, Some(owner)).await?;
/// for record in &report.created {
///     payroll.approve(record.id, owner).await?;
///     payroll.process_payment(record.id, None, owner).await?;
/// }
/// ```
#[derive(Clone)]
pub struct PayrollService {
    store: Arc<dyn LedgerStore>,
    config: PayrollConfig,
    mapping: AccountMapping,
    timezone: Timezone,
}

impl PayrollService {
    pub fn new(store: Arc<dyn LedgerStore>, config: PayrollConfig, mapping: AccountMapping) -> Self {
        Self {
            store,
            config,
            mapping,
            timezone: Timezone::default(),
        }
    }

    pub fn with_timezone(mut self, timezone: Timezone) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn config(&self) -> &PayrollConfig {
        &self.config
    }

    /// Creates draft records for every employee without one in `period`
    ///
    /// # Arguments
    ///
    /// * `period` - Payroll month; codes are numbered within it
    /// * `employees` - Active employees to pay
    /// * `actor` - Who triggered the run
    ///
    /// # Returns
    ///
    /// A [`GenerationReport`] listing created records and the employees that
    /// already had one. Concurrent runs for one period never duplicate a record.
    #[instrument(skip(self, employees), fields(period = %period, employees = employees.len()))]
    pub async fn generate(
        &self,
        period: PayrollPeriod,
        employees: &[Employee],
        actor: Option<UserId>,
    ) -> Result<GenerationReport, LedgerError> {
        let mut uow = self.store.begin().await?;
        uow.lock_payroll_period(period).await?;
        let mut report = GenerationReport {
            period: Some(period),
            ..GenerationReport::default()
        };

        for employee in employees {
            if uow.payroll_exists(employee.user_id, period).await? {
                debug!(user = %employee.user_id, "Payroll already generated");
                report.skipped.push(employee.user_id);
                continue;
            }
            let sequence = uow.next_payroll_sequence(period).await?;
            let breakdown = calculate(employee, period, &self.config);
            let record = PayrollRecord::draft(payroll_code(period, sequence), employee.user_id, breakdown)
                .with_created_by(actor);
            record.validate()?;
            uow.insert_payroll(&record).await?;
            report.created.push(record);
        }

        uow.commit().await?;
        info!(
            created = report.created.len(),
            skipped = report.skipped.len(),
            "Payroll generated"
        );
        Ok(report)
    }

    #[instrument(skip(self))]
    pub async fn approve(&self, payroll_id: PayrollId, approver: UserId) -> Result<PayrollRecord, LedgerError> {
        let mut uow = self.store.begin().await?;
        let mut record = uow.lock_payroll(payroll_id).await?;
        record.approve(approver)?;
        uow.save_payroll(&record).await?;
        uow.commit().await?;
        info!(code = %record.code, "Payroll approved");
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn cancel(&self, payroll_id: PayrollId, reason: Option<String>) -> Result<PayrollRecord, LedgerError> {
        let mut uow = self.store.begin().await?;
        let mut record = uow.lock_payroll(payroll_id).await?;
        record.cancel(reason)?;
        uow.save_payroll(&record).await?;
        uow.commit().await?;
        info!(code = %record.code, "Payroll cancelled");
        Ok(record)
    }

    /// Pays an approved record; the configured payroll account is used when none is given
    ///
    /// # Errors
    ///
    /// * `Payroll(NotApproved)` - the record is still a draft or was cancelled
    /// * `InsufficientBalance` - the paying account cannot cover the net salary
    #[instrument(skip(self))]
    pub async fn process_payment(
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
        if outcome.already_recorded {
            uow.rollback().await?;
        } else {
            uow.commit().await?;
        }
        Ok(outcome)
    }

    /// Books a compensating income transaction for a paid record
    ///
    /// The paid record and its payment transaction stay as they are.
    #[instrument(skip(self, reason))]
    pub async fn reverse_payroll_payment(
        &self,
        payroll_id: PayrollId,
        reason: &str,
        actor: UserId,
    ) -> Result<EventOutcome, LedgerError> {
        let mut uow = self.store.begin().await?;
        let record = uow.lock_payroll(payroll_id).await?;
        if record.status != PayrollStatus::Paid {
            return Err(PayrollError::NotPaid(record.code).into());
        }

        let reference = SourceRef::payroll(record.id);
        if !uow.claim_idempotency_key(&IdempotencyKey::payroll_reversed(&reference)).await? {
            debug!(code = %record.code, "Payroll payment already reversed");
            uow.rollback().await?;
            return Ok(EventOutcome::already_recorded());
        }

        let payment = uow
            .lock_transactions_for(&reference)
            .await?
            .into_iter()
            .find(|txn| txn.category == TransactionCategory::Payroll && txn.is_completed())
            .ok_or_else(|| LedgerError::TransactionNotFound(reference.to_string()))?;
        let account_id = payment
            .from_account
            .ok_or_else(|| LedgerError::InvalidTransaction(format!("{} has no paying account", payment.code)))?;
        let account = lock_active_account(uow.as_mut(), account_id).await?;

        let today = self.timezone.business_date(Utc::now());
        let mut txn = FinancialTransaction::new(
            transaction_code(CodePrefix::PayrollReversal, &reference, today),
            TransactionKind::Income,
            TransactionCategory::PayrollReversal,
            payment.audit.applied_amount,
            AuditKind::PayrollReversal,
        )
        .to_account(account.id)
        .referencing(reference)
        .described(format!("Reversal of {}: {}", payment.code, reason))
        .created_by(Some(actor));
        txn.validate()?;
        txn.complete(Some(actor))?;

        let mut outcome = apply_transaction(uow.as_mut(), &mut txn, &self.timezone).await?;
        uow.insert_transaction(&txn).await?;
        uow.commit().await?;

        info!(
            code = %txn.code,
            payroll = %record.code,
            amount = %txn.amount,
            "Payroll payment reversed"
        );
        outcome.transactions.insert(0, txn);
        outcome.payroll = Some(record);
        Ok(outcome)
    }

    pub async fn get(&self, payroll_id: PayrollId) -> Result<PayrollRecord, LedgerError> {
        Ok(self.store.get_payroll(payroll_id).await?)
    }

    pub async fn list(&self, period: Option<PayrollPeriod>) -> Result<Vec<PayrollRecord>, LedgerError> {
        Ok(self.store.list_payrolls(period).await?)
    }
}
