use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument};
use mongodb::{Collection, Database, IndexModel};

use crate::error::PaymentError;
use crate::models::{parse_payment_id, Payment, PaymentFilter, StatusChange};

pub const PAYMENTS_COLLECTION: &str = "payments";

/// Persistence for [`Payment`] records.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Persist a new payment, returning the id the store assigned.
    async fn insert(&self, payment: Payment) -> Result<ObjectId, PaymentError>;

    async fn find_by_id(&self, id: &str) -> Result<Payment, PaymentError>;

    async fn find_by_order_id(&self, order_id: i64) -> Result<Payment, PaymentError>;

    /// All payments of a user, oldest first. Empty when the user has none.
    async fn find_many_by_user_id(&self, user_id: i64) -> Result<Vec<Payment>, PaymentError>;

    /// Atomically set `status` (and any gateway reference in `change`) and
    /// refresh `updatedAt` on the matching payment, returning the updated
    /// document.
    async fn find_and_update_status(
        &self,
        filter: PaymentFilter,
        change: StatusChange,
    ) -> Result<Payment, PaymentError>;

    async fn health_check(&self) -> Result<(), PaymentError>;
}

pub(crate) fn not_found() -> PaymentError {
    PaymentError::NotFound("payment not found".to_string())
}

/// MongoDB-backed payment store.
#[derive(Clone)]
pub struct PaymentRepository {
    db: Database,
    collection: Collection<Payment>,
}

impl PaymentRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            db: db.clone(),
            collection: db.collection(PAYMENTS_COLLECTION),
        }
    }

    /// Unique index on `paymentIntentId` plus lookup indexes for the read
    /// queries.
    pub async fn init_indexes(&self) -> Result<(), PaymentError> {
        let intent_index = IndexModel::builder()
            .keys(doc! { "paymentIntentId": 1 })
            .options(
                IndexOptions::builder()
                    .name("payment_intent_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        let order_index = IndexModel::builder()
            .keys(doc! { "orderId": 1 })
            .options(
                IndexOptions::builder()
                    .name("order_idx".to_string())
                    .build(),
            )
            .build();

        let user_index = IndexModel::builder()
            .keys(doc! { "userId": 1, "createdAt": 1 })
            .options(
                IndexOptions::builder()
                    .name("user_created_idx".to_string())
                    .build(),
            )
            .build();

        self.collection
            .create_indexes([intent_index, order_index, user_index], None)
            .await?;

        tracing::info!("Payment service indexes initialized");
        Ok(())
    }

    fn filter_doc(filter: &PaymentFilter) -> Document {
        match filter {
            PaymentFilter::Id(id) => doc! { "_id": *id },
            PaymentFilter::PaymentIntentId(intent_id) => {
                doc! { "paymentIntentId": intent_id.as_str() }
            }
        }
    }

    fn status_update(change: &StatusChange) -> Result<Document, PaymentError> {
        let mut set = doc! {
            "status": mongodb::bson::to_bson(&change.status)?,
            "updatedAt": DateTime::now()
        };
        if let Some(transaction_id) = &change.transaction_id {
            set.insert("transactionId", transaction_id.as_str());
        }
        if let Some(refund_id) = &change.refund_id {
            set.insert("refundId", refund_id.as_str());
        }
        Ok(doc! { "$set": set })
    }

    fn update_options() -> FindOneAndUpdateOptions {
        FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build()
    }
}

#[async_trait]
impl PaymentStore for PaymentRepository {
    async fn insert(&self, mut payment: Payment) -> Result<ObjectId, PaymentError> {
        let id = ObjectId::new();
        payment.id = Some(id);
        self.collection.insert_one(payment, None).await?;
        Ok(id)
    }

    async fn find_by_id(&self, id: &str) -> Result<Payment, PaymentError> {
        let object_id = parse_payment_id(id)?;
        self.collection
            .find_one(doc! { "_id": object_id }, None)
            .await?
            .ok_or_else(not_found)
    }

    async fn find_by_order_id(&self, order_id: i64) -> Result<Payment, PaymentError> {
        self.collection
            .find_one(doc! { "orderId": order_id }, None)
            .await?
            .ok_or_else(not_found)
    }

    async fn find_many_by_user_id(&self, user_id: i64) -> Result<Vec<Payment>, PaymentError> {
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": 1 })
            .build();

        let cursor = self
            .collection
            .find(doc! { "userId": user_id }, options)
            .await?;

        let payments: Vec<Payment> = cursor.try_collect().await?;
        Ok(payments)
    }

    async fn find_and_update_status(
        &self,
        filter: PaymentFilter,
        change: StatusChange,
    ) -> Result<Payment, PaymentError> {
        let update = Self::status_update(&change)?;

        self.collection
            .find_one_and_update(Self::filter_doc(&filter), update, Self::update_options())
            .await?
            .ok_or_else(not_found)
    }

    async fn health_check(&self) -> Result<(), PaymentError> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }
}
