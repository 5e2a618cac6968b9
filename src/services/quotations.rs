use crate::{
    db::DbPool,
    entities::{
        quotation::{self, Entity as QuotationEntity},
        rfq::RfqStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        numbering::{next_document_number, DocumentKind},
        rfqs::{advance, find_rfq},
    },
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use serde::Deserialize;
use slog::Logger;
use std::sync::Arc;
use tracing::{error, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Supplier quotation as typed in from the supplier's document.
#[derive(Clone, Debug, Deserialize, Validate, ToSchema)]
pub struct RecordQuotationInput {
    #[validate(length(min = 1, max = 255))]
    pub supplier_name: String,
    #[validate(length(max = 255))]
    pub supplier_contact: Option<String>,
    pub quote_date: NaiveDate,
    pub valid_until: Option<NaiveDate>,
    /// ISO 4217 code; the configured default currency when omitted
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    #[serde(default)]
    pub vat_included: bool,
    pub total_before_vat: Decimal,
    #[serde(default)]
    pub vat_amount: Decimal,
    pub total_after_vat: Decimal,
    #[validate(length(max = 500))]
    pub payment_terms: Option<String>,
    #[validate(length(max = 500))]
    pub delivery_terms: Option<String>,
}

impl RecordQuotationInput {
    fn check_amounts(&self) -> Result<(), ServiceError> {
        let amounts = [
            ("total_before_vat", self.total_before_vat),
            ("vat_amount", self.vat_amount),
            ("total_after_vat", self.total_after_vat),
        ];
        if let Some((field, _)) = amounts.iter().find(|(_, v)| *v < Decimal::ZERO) {
            return Err(ServiceError::ValidationError(format!(
                "{} must not be negative",
                field
            )));
        }
        if let Some(valid_until) = self.valid_until {
            if valid_until < self.quote_date {
                return Err(ServiceError::ValidationError(
                    "valid_until is before quote_date".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct QuotationService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    logger: Logger,
    default_currency: String,
}

impl QuotationService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        logger: Logger,
        default_currency: String,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            logger,
            default_currency,
        }
    }

    /// Records a quotation against an RFQ that is still collecting offers.
    /// The first quotation on a `created` RFQ opens it.
    #[instrument(skip(self, input), fields(supplier = %input.supplier_name))]
    pub async fn record(
        &self,
        rfq_id: Uuid,
        input: RecordQuotationInput,
        actor: &str,
    ) -> Result<quotation::Model, ServiceError> {
        input.validate()?;
        input.check_amounts()?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        let rfq = find_rfq(&txn, rfq_id).await?;
        let opened = match rfq.status {
            RfqStatus::Created => {
                advance(&txn, &rfq, RfqStatus::Open).await?;
                true
            }
            RfqStatus::Open => false,
            other => {
                return Err(ServiceError::InvalidStatus(format!(
                    "RFQ {} is {} and no longer accepts quotations",
                    rfq.rfq_no, other
                )))
            }
        };

        let currency = input
            .currency
            .unwrap_or_else(|| self.default_currency.clone())
            .to_ascii_uppercase();

        let recorded = quotation::ActiveModel {
            id: Set(Uuid::new_v4()),
            quote_no: Set(next_document_number(DocumentKind::Quotation)),
            rfq_id: Set(rfq_id),
            supplier_name: Set(input.supplier_name.trim().to_string()),
            supplier_contact: Set(input.supplier_contact),
            quote_date: Set(input.quote_date),
            valid_until: Set(input.valid_until),
            currency: Set(currency),
            vat_included: Set(input.vat_included),
            total_before_vat: Set(input.total_before_vat),
            vat_amount: Set(input.vat_amount),
            total_after_vat: Set(input.total_after_vat),
            payment_terms: Set(input.payment_terms),
            delivery_terms: Set(input.delivery_terms),
            is_selected: Set(false),
            created_by: Set(actor.to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!("Failed to record quotation for RFQ {}: {}", rfq_id, e);
            ServiceError::db_error(e)
        })?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        if opened {
            slog::info!(self.logger, "rfq status changed";
                "rfq_id" => %rfq_id, "from" => %RfqStatus::Created, "to" => %RfqStatus::Open, "actor" => actor);
            self.event_sender
                .send_or_log(Event::RfqStatusChanged {
                    rfq_id,
                    from: RfqStatus::Created.to_string(),
                    to: RfqStatus::Open.to_string(),
                })
                .await;
        }
        slog::info!(self.logger, "quotation recorded";
            "quotation_id" => %recorded.id,
            "rfq_id" => %rfq_id,
            "supplier" => %recorded.supplier_name,
            "total_after_vat" => %recorded.total_after_vat,
            "actor" => actor);
        self.event_sender
            .send_or_log(Event::QuotationRecorded {
                quotation_id: recorded.id,
                rfq_id,
            })
            .await;

        Ok(recorded)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<quotation::Model, ServiceError> {
        find_quotation(&*self.db_pool, id).await
    }

    #[instrument(skip(self))]
    pub async fn list_by_rfq(&self, rfq_id: Uuid) -> Result<Vec<quotation::Model>, ServiceError> {
        let db = &*self.db_pool;
        find_rfq(db, rfq_id).await?;
        QuotationEntity::find()
            .filter(quotation::Column::RfqId.eq(rfq_id))
            .order_by_asc(quotation::Column::TotalAfterVat)
            .all(db)
            .await
            .map_err(ServiceError::db_error)
    }
}

pub(crate) async fn find_quotation<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<quotation::Model, ServiceError> {
    QuotationEntity::find_by_id(id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Quotation {} not found", id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input() -> RecordQuotationInput {
        RecordQuotationInput {
            supplier_name: "Siam Medical Supply".into(),
            supplier_contact: None,
            quote_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            valid_until: None,
            currency: None,
            vat_included: true,
            total_before_vat: dec!(934.58),
            vat_amount: dec!(65.42),
            total_after_vat: dec!(1000.00),
            payment_terms: None,
            delivery_terms: None,
        }
    }

    #[test]
    fn amounts_are_taken_as_entered() {
        assert!(input().check_amounts().is_ok());
        let zero = RecordQuotationInput {
            total_before_vat: Decimal::ZERO,
            vat_amount: Decimal::ZERO,
            total_after_vat: Decimal::ZERO,
            ..input()
        };
        assert!(zero.check_amounts().is_ok());
    }

    #[test]
    fn negative_amount_is_rejected() {
        let bad = RecordQuotationInput {
            vat_amount: dec!(-1),
            ..input()
        };
        assert!(matches!(
            bad.check_amounts(),
            Err(ServiceError::ValidationError(msg)) if msg.contains("vat_amount")
        ));
    }

    #[test]
    fn validity_must_not_precede_quote_date() {
        let bad = RecordQuotationInput {
            valid_until: NaiveDate::from_ymd_opt(2024, 5, 31),
            ..input()
        };
        assert!(bad.check_amounts().is_err());
    }
}
