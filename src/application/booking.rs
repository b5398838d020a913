use crate::domain::batch::{Batch, BatchItemBuilder, RESOURCE_ID_PLACEHOLDER};
use crate::domain::config::{OperationKey, TenantConfig, TenantConfigResolver};
use crate::domain::job::{
    BookingContext, ConversionAccountCredit, ConversionAccountDebit, DisposalDeposit, RevertRequest,
    Stage, TechnicalAccountCredit, Variables, parse_request,
};
use crate::domain::message::{CreditDebit, MessageKind, PartyDetails, StatementEntry};
use crate::domain::money::Amount;
use crate::domain::ports::{LedgerGatewayRef, MessageAdapterRef};
use crate::domain::transaction::{
    AccountRole, LedgerAction, LegPart, StatementDetail, TransactionBody, action_segment,
};
use crate::error::{ConnectorError, Result};
use crate::settings::LedgerSettings;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Operation-key stage segments.
const TECHNICAL_ACCOUNT_STAGE: &str = "bookCreditedAmountFromTechnicalAccount";
const CONVERSION_CREDIT_STAGE: &str = "bookCreditedAmountToConversionAccount";
const CONVERSION_RECALL_STAGE: &str = "bookCreditedAmountToConversionAccountInRecall";
const CONVERSION_RETURN_STAGE: &str = "bookCreditedAmountToConversionAccountInReturn";
const CONVERSION_DEBIT_STAGE: &str = "bookOnConversionAccountInAms";
const REVERT_STAGE: &str = "revertInAms";

/// The booking a revert compensates: the payment left the customer's disposal
/// account and landed on the conversion account. Reverts book each side inverted.
const REVERTED_BOOKING: [(AccountRole, LedgerAction); 2] = [
    (AccountRole::Conversion, LedgerAction::Deposit),
    (AccountRole::Disposal, LedgerAction::Withdrawal),
];

/// A batch ready for submission together with the variables it resolved.
#[derive(Debug, Clone)]
pub struct PlannedBooking {
    pub stage: Stage,
    pub correlation_id: String,
    pub batch: Batch,
    /// Fields added to the job output on success.
    pub resolved: Variables,
}

/// The statement data shared by every detail leg of one booking.
struct StatementRecord {
    correlation_id: String,
    group_id: Option<String>,
    payload: String,
    party: PartyDetails,
}

impl StatementRecord {
    fn new(
        correlation_id: String,
        group_id: Option<String>,
        entry: &StatementEntry,
    ) -> Result<Self> {
        Ok(Self {
            correlation_id,
            group_id,
            payload: entry.serialized_payload()?,
            party: entry.party.clone(),
        })
    }
}

/// One money-moving leg.
struct Leg<'a> {
    account_id: i64,
    role: AccountRole,
    action: LedgerAction,
    part: LegPart,
    amount: Amount,
    purpose_code: Option<&'a str>,
}

/// Writes money legs and their statement details into one batch.
struct LegWriter<'a> {
    settings: &'a LedgerSettings,
    config: &'a TenantConfig,
    scheme: &'a str,
    stage: &'a str,
    transaction_date: &'a str,
    record: &'a StatementRecord,
    builder: BatchItemBuilder,
}

impl LegWriter<'_> {
    fn book(&mut self, leg: Leg<'_>) -> Result<()> {
        let key = OperationKey::new(
            self.scheme,
            self.stage,
            leg.role.key_segment(),
            &action_segment(leg.action, leg.part),
        );
        let payment_type_id = self.config.find_payment_type_id(&key)?;

        debug!(
            account_id = leg.account_id,
            command = leg.action.command(),
            amount = %leg.amount,
            operation = %key,
            payment_type_id,
            "Adding booking leg"
        );

        let body = TransactionBody {
            transaction_date: self.transaction_date.to_string(),
            transaction_amount: leg.amount,
            payment_type_id,
            note: String::new(),
            date_format: self.settings.date_format.clone(),
            locale: self.settings.locale.clone(),
        };
        self.builder.append(
            format!(
                "{}{}/transactions?command={}",
                self.settings.relative_base_path(),
                leg.account_id,
                leg.action.command()
            ),
            serde_json::to_string(&body)?,
            false,
        );

        let detail = StatementDetail {
            internal_correlation_id: self.record.correlation_id.clone(),
            structured_transaction_details: Some(self.record.payload.clone()),
            partner_account_iban: self.record.party.account_iban.clone(),
            payment_type_code: self.config.find_payment_type_code(&key).map(str::to_string),
            transaction_group_id: self.record.group_id.clone(),
            partner_name: self.record.party.name.clone(),
            remittance_information: self.record.party.remittance_information.clone(),
            category_purpose_code: leg.purpose_code.map(str::to_string),
        };
        self.builder.append(
            format!(
                "datatables/{}/{}",
                self.settings.statement_details_table, RESOURCE_ID_PLACEHOLDER
            ),
            serde_json::to_string(&detail)?,
            true,
        );
        Ok(())
    }

    fn finish(self) -> Batch {
        self.builder.finish()
    }
}

fn required_correlation_id(context: &BookingContext) -> Result<String> {
    context
        .internal_correlation_id
        .clone()
        .ok_or(ConnectorError::MissingVariable("internalCorrelationId"))
}

/// Decides which accounts a lifecycle stage touches and assembles the batch.
///
/// Holds only immutable collaborators, so one instance serves any number of
/// concurrent jobs.
pub struct BookingOrchestrator {
    resolver: Arc<TenantConfigResolver>,
    ledger: LedgerGatewayRef,
    messages: MessageAdapterRef,
    settings: LedgerSettings,
}

impl BookingOrchestrator {
    /// Creates a new `BookingOrchestrator`.
    ///
    /// # Arguments
    ///
    /// * `resolver` - Tenant payment-type configuration, loaded at startup.
    /// * `ledger` - Gateway executing the batches.
    /// * `messages` - Adapter turning upstream messages into statement entries.
    /// * `settings` - Addressing and formatting of ledger requests.
    pub fn new(
        resolver: Arc<TenantConfigResolver>,
        ledger: LedgerGatewayRef,
        messages: MessageAdapterRef,
        settings: LedgerSettings,
    ) -> Self {
        Self {
            resolver,
            ledger,
            messages,
            settings,
        }
    }

    /// Builds the batch for `stage` without submitting it.
    pub fn plan(&self, stage: Stage, variables: &Variables) -> Result<PlannedBooking> {
        match stage {
            Stage::CreditTechnicalAccount => {
                self.credit_technical_account(parse_request(variables)?)
            }
            Stage::CreditConversionAccount
            | Stage::CreditConversionAccountRecall
            | Stage::CreditConversionAccountReturn => {
                self.credit_conversion_account(stage, parse_request(variables)?)
            }
            Stage::BookOnConversionAccount => {
                self.book_on_conversion_account(parse_request(variables)?)
            }
            Stage::RevertInAms | Stage::RevertWithoutFee => {
                self.revert(stage, parse_request(variables)?)
            }
            Stage::DepositOnDisposal => self.deposit_on_disposal(parse_request(variables)?),
            Stage::AccountLookup => Err(ConnectorError::ValidationError(format!(
                "{} does not book on the ledger",
                stage
            ))),
        }
    }

    /// Builds and submits the batch for `stage`.
    ///
    /// On success returns the job variables augmented with whatever the
    /// booking resolved. The gateway is all-or-nothing, so an error here
    /// means nothing was posted.
    pub async fn execute(&self, stage: Stage, variables: &Variables) -> Result<Variables> {
        let planned = self.plan(stage, variables)?;
        self.submit(planned, variables).await
    }

    /// Submits a planned booking and returns `variables` augmented with what it resolved.
    pub async fn submit(
        &self,
        planned: PlannedBooking,
        variables: &Variables,
    ) -> Result<Variables> {
        let stage = planned.stage;
        info!(
            stage = %stage,
            tenant = planned.batch.tenant(),
            internal_correlation_id = %planned.correlation_id,
            items = planned.batch.len(),
            "Submitting booking batch"
        );

        let receipt = self
            .ledger
            .submit_batch(planned.batch.tenant(), &planned.batch)
            .await?;

        info!(
            stage = %stage,
            internal_correlation_id = %planned.correlation_id,
            resources = ?receipt.resource_ids,
            "Booking finished successfully"
        );

        let mut output = variables.clone();
        output.extend(planned.resolved);
        Ok(output)
    }

    fn writer<'a>(
        &'a self,
        config: &'a TenantConfig,
        scheme: &'a str,
        stage: &'a str,
        transaction_date: &'a str,
        record: &'a StatementRecord,
    ) -> LegWriter<'a> {
        LegWriter {
            settings: &self.settings,
            config,
            scheme,
            stage,
            transaction_date,
            record,
            builder: BatchItemBuilder::begin(config.tenant()),
        }
    }

    fn today(&self) -> Result<String> {
        let format = self.settings.chrono_date_format()?;
        Ok(chrono::Local::now().format(&format).to_string())
    }

    fn credit_technical_account(&self, request: TechnicalAccountCredit) -> Result<PlannedBooking> {
        let context = &request.context;
        let config = self.resolver.resolve(&context.tenant_identifier)?;
        let correlation_id = required_correlation_id(context)?;

        let account_id =
            config.find_technical_account(&context.payment_scheme, &request.case_identifier)?;
        info!(
            account_id,
            case = %request.case_identifier,
            amount = %request.amount,
            "Withdrawing credited amount from technical account"
        );

        let entry = self
            .messages
            .statement_entry(MessageKind::Pacs008, &request.original_pacs008, None)?;
        let mut record = StatementRecord::new(
            correlation_id.clone(),
            context.transaction_group_id.clone(),
            &entry,
        )?;
        // Technical bookings carry no counterparty columns.
        record.party = PartyDetails::default();

        let mut writer = self.writer(
            &config,
            &context.payment_scheme,
            TECHNICAL_ACCOUNT_STAGE,
            &request.transaction_date,
            &record,
        );
        writer.book(Leg {
            account_id,
            role: AccountRole::Technical(request.case_identifier.clone()),
            action: LedgerAction::Withdrawal,
            part: LegPart::TransactionAmount,
            amount: request.amount,
            purpose_code: context.transaction_category_purpose_code.as_deref(),
        })?;

        let mut resolved = Variables::new();
        resolved.insert("technicalAccountAmsId".into(), Value::from(account_id));

        Ok(PlannedBooking {
            stage: Stage::CreditTechnicalAccount,
            correlation_id,
            batch: writer.finish(),
            resolved,
        })
    }

    fn credit_conversion_account(
        &self,
        stage: Stage,
        request: ConversionAccountCredit,
    ) -> Result<PlannedBooking> {
        let context = &request.context;
        let config = self.resolver.resolve(&context.tenant_identifier)?;
        let correlation_id = required_correlation_id(context)?;
        info!(
            stage = %stage,
            account_id = request.conversion_account_ams_id,
            amount = %request.amount,
            "Depositing amount on conversion account"
        );

        let credit_entry = |raw: &str| {
            self.messages
                .statement_entry(MessageKind::Pacs008, raw, Some(CreditDebit::Credit))
        };
        let (key_stage, entry) = match stage {
            Stage::CreditConversionAccountRecall => {
                let original = request
                    .original_pacs008
                    .as_deref()
                    .ok_or(ConnectorError::MissingVariable("originalPacs008"))?;
                (CONVERSION_RECALL_STAGE, credit_entry(original)?)
            }
            Stage::CreditConversionAccountReturn => {
                let pacs004 = request
                    .pacs004
                    .as_deref()
                    .ok_or(ConnectorError::MissingVariable("pacs004"))?;
                let returned = self.messages.statement_entry(
                    MessageKind::Pacs004,
                    pacs004,
                    Some(CreditDebit::Credit),
                )?;
                // The returned payment is described by the original credit when we
                // still have it; otherwise the detail carries an empty entry.
                let payload = match request.original_pacs008.as_deref() {
                    Some(original) => credit_entry(original)?.payload,
                    None => StatementEntry::empty().payload,
                };
                (
                    CONVERSION_RETURN_STAGE,
                    StatementEntry {
                        payload,
                        party: returned.party,
                    },
                )
            }
            _ => {
                let original = request
                    .original_pacs008
                    .as_deref()
                    .ok_or(ConnectorError::MissingVariable("originalPacs008"))?;
                (CONVERSION_CREDIT_STAGE, credit_entry(original)?)
            }
        };

        let mut record = StatementRecord::new(
            correlation_id.clone(),
            context.transaction_group_id.clone(),
            &entry,
        )?;
        if record.party.account_iban.is_none() {
            record.party.account_iban = request.creditor_iban.clone();
        }

        let mut writer = self.writer(
            &config,
            &context.payment_scheme,
            key_stage,
            &request.transaction_date,
            &record,
        );
        writer.book(Leg {
            account_id: request.conversion_account_ams_id,
            role: AccountRole::Conversion,
            action: LedgerAction::Deposit,
            part: LegPart::TransactionAmount,
            amount: request.amount,
            purpose_code: context.transaction_category_purpose_code.as_deref(),
        })?;

        Ok(PlannedBooking {
            stage,
            correlation_id,
            batch: writer.finish(),
            resolved: Variables::new(),
        })
    }

    fn book_on_conversion_account(
        &self,
        request: ConversionAccountDebit,
    ) -> Result<PlannedBooking> {
        let context = &request.context;
        let config = self.resolver.resolve(&context.tenant_identifier)?;
        let correlation_id = required_correlation_id(context)?;
        info!(
            account_id = request.conversion_account_ams_id,
            amount = %request.amount,
            fee = %request.transaction_fee_amount,
            "Withdrawing amount from conversion account"
        );

        let entry = self
            .messages
            .statement_entry(MessageKind::Pain001, &request.original_pain001, None)?;
        let record = StatementRecord::new(
            correlation_id.clone(),
            context.transaction_group_id.clone(),
            &entry,
        )?;

        let mut writer = self.writer(
            &config,
            &context.payment_scheme,
            CONVERSION_DEBIT_STAGE,
            &request.transaction_date,
            &record,
        );
        writer.book(Leg {
            account_id: request.conversion_account_ams_id,
            role: AccountRole::Conversion,
            action: LedgerAction::Withdrawal,
            part: LegPart::TransactionAmount,
            amount: request.amount,
            purpose_code: context.transaction_category_purpose_code.as_deref(),
        })?;
        if let Some(fee) = request.transaction_fee_amount.chargeable() {
            writer.book(Leg {
                account_id: request.conversion_account_ams_id,
                role: AccountRole::Conversion,
                action: LedgerAction::Withdrawal,
                part: LegPart::TransactionFee,
                amount: fee,
                purpose_code: request.transaction_fee_category_purpose_code.as_deref(),
            })?;
        }

        Ok(PlannedBooking {
            stage: Stage::BookOnConversionAccount,
            correlation_id,
            batch: writer.finish(),
            resolved: Variables::new(),
        })
    }

    /// Compensates a conversion-account debit: amount and fee come back off the
    /// conversion account and are re-deposited on the disposal account.
    fn revert(&self, stage: Stage, request: RevertRequest) -> Result<PlannedBooking> {
        let context = &request.context;
        let config = self.resolver.resolve(&context.tenant_identifier)?;
        let correlation_id = required_correlation_id(context)?;

        let mut resolved = Variables::new();
        let transaction_date = match (&request.transaction_date, stage) {
            (Some(date), _) => date.clone(),
            (None, Stage::RevertWithoutFee) => {
                let today = self.today()?;
                resolved.insert("transactionDate".into(), Value::from(today.clone()));
                today
            }
            (None, _) => return Err(ConnectorError::MissingVariable("transactionDate")),
        };

        let purpose_code = context.transaction_category_purpose_code.as_deref();
        let fee_purpose_code = match stage {
            Stage::RevertWithoutFee => purpose_code,
            _ => request.transaction_fee_category_purpose_code.as_deref(),
        };
        info!(
            stage = %stage,
            conversion_account_id = request.conversion_account_ams_id,
            disposal_account_id = request.disposal_account_ams_id,
            amount = %request.amount,
            fee = %request.transaction_fee_amount,
            "Reverting booking"
        );

        let entry = self
            .messages
            .statement_entry(MessageKind::Pain001, &request.original_pain001, None)?;
        let mut record = StatementRecord::new(
            correlation_id.clone(),
            context.transaction_group_id.clone(),
            &entry,
        )?;
        if request.debtor_iban.is_some() {
            record.party.account_iban = request.debtor_iban.clone();
        }

        let mut writer = self.writer(
            &config,
            &context.payment_scheme,
            REVERT_STAGE,
            &transaction_date,
            &record,
        );
        for (role, original) in REVERTED_BOOKING {
            let action = original.inverse();
            let account_id = match role {
                AccountRole::Disposal => request.disposal_account_ams_id,
                _ => request.conversion_account_ams_id,
            };
            writer.book(Leg {
                account_id,
                role: role.clone(),
                action,
                part: LegPart::TransactionAmount,
                amount: request.amount,
                purpose_code,
            })?;
            if let Some(fee) = request.transaction_fee_amount.chargeable() {
                writer.book(Leg {
                    account_id,
                    role,
                    action,
                    part: LegPart::TransactionFee,
                    amount: fee,
                    purpose_code: fee_purpose_code,
                })?;
            }
        }

        Ok(PlannedBooking {
            stage,
            correlation_id,
            batch: writer.finish(),
            resolved,
        })
    }

    /// Moves a cancelled payment from the conversion account to the disposal account.
    fn deposit_on_disposal(&self, request: DisposalDeposit) -> Result<PlannedBooking> {
        let context = &request.context;
        let config = self.resolver.resolve(&context.tenant_identifier)?;

        let mut resolved = Variables::new();
        let correlation_id = match &context.internal_correlation_id {
            Some(id) => id.clone(),
            None => {
                let derived = self
                    .messages
                    .cancellation_reference(&request.camt056)?
                    .correlation_id();
                debug!(internal_correlation_id = %derived, "Derived correlation id from camt.056");
                resolved.insert("internalCorrelationId".into(), Value::from(derived.clone()));
                derived
            }
        };
        let transaction_date = match &request.transaction_date {
            Some(date) => date.clone(),
            None => {
                let today = self.today()?;
                resolved.insert("transactionDate".into(), Value::from(today.clone()));
                today
            }
        };
        info!(
            conversion_account_id = request.conversion_account_ams_id,
            disposal_account_id = request.disposal_account_ams_id,
            amount = %request.amount,
            internal_correlation_id = %correlation_id,
            "Depositing cancelled amount on disposal account"
        );

        let entry = self
            .messages
            .statement_entry(MessageKind::Camt056, &request.camt056, None)?;
        let group_id = context
            .transaction_group_id
            .clone()
            .unwrap_or_else(|| correlation_id.clone());
        let mut record = StatementRecord::new(correlation_id.clone(), Some(group_id), &entry)?;
        if request.debtor_iban.is_some() {
            record.party.account_iban = request.debtor_iban.clone();
        }

        let purpose_code = context.transaction_category_purpose_code.as_deref();
        let mut writer = self.writer(
            &config,
            &context.payment_scheme,
            REVERT_STAGE,
            &transaction_date,
            &record,
        );
        writer.book(Leg {
            account_id: request.conversion_account_ams_id,
            role: AccountRole::Conversion,
            action: LedgerAction::Withdrawal,
            part: LegPart::TransactionAmount,
            amount: request.amount,
            purpose_code,
        })?;
        writer.book(Leg {
            account_id: request.disposal_account_ams_id,
            role: AccountRole::Disposal,
            action: LedgerAction::Deposit,
            part: LegPart::TransactionAmount,
            amount: request.amount,
            purpose_code,
        })?;

        Ok(PlannedBooking {
            stage: Stage::DepositOnDisposal,
            correlation_id,
            batch: writer.finish(),
            resolved,
        })
    }
}
