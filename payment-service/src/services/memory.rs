use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use super::repository::{not_found, PaymentStore};
use crate::error::PaymentError;
use crate::models::{parse_payment_id, Payment, PaymentFilter, StatusChange};

/// Payment store held in process memory, in insertion order.
///
/// Status updates happen under a single write lock, so concurrent updates of
/// the same payment serialize the same way `findOneAndUpdate` does.
#[derive(Default)]
pub struct InMemoryPaymentStore {
    payments: RwLock<Vec<Payment>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.payments.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.payments.read().await.is_empty()
    }
}

fn filter_matches(payment: &Payment, filter: &PaymentFilter) -> bool {
    match filter {
        PaymentFilter::Id(id) => payment.id.as_ref() == Some(id),
        PaymentFilter::PaymentIntentId(intent_id) => &payment.payment_intent_id == intent_id,
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, mut payment: Payment) -> Result<ObjectId, PaymentError> {
        let mut payments = self.payments.write().await;
        if payments
            .iter()
            .any(|p| p.payment_intent_id == payment.payment_intent_id)
        {
            return Err(PaymentError::Store(format!(
                "duplicate paymentIntentId: {}",
                payment.payment_intent_id
            )));
        }

        let id = ObjectId::new();
        payment.id = Some(id);
        payments.push(payment);
        Ok(id)
    }

    async fn find_by_id(&self, id: &str) -> Result<Payment, PaymentError> {
        let object_id = parse_payment_id(id)?;
        self.payments
            .read()
            .await
            .iter()
            .find(|p| p.id == Some(object_id))
            .cloned()
            .ok_or_else(not_found)
    }

    async fn find_by_order_id(&self, order_id: i64) -> Result<Payment, PaymentError> {
        self.payments
            .read()
            .await
            .iter()
            .find(|p| p.order_id == order_id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn find_many_by_user_id(&self, user_id: i64) -> Result<Vec<Payment>, PaymentError> {
        Ok(self
            .payments
            .read()
            .await
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_and_update_status(
        &self,
        filter: PaymentFilter,
        change: StatusChange,
    ) -> Result<Payment, PaymentError> {
        let mut payments = self.payments.write().await;
        let payment = payments
            .iter_mut()
            .find(|p| filter_matches(p, &filter))
            .ok_or_else(not_found)?;

        change.apply(payment);
        Ok(payment.clone())
    }

    async fn health_check(&self) -> Result<(), PaymentError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentStatus;
    use std::time::Duration;

    fn payment(order_id: i64, user_id: i64, intent: &str) -> Payment {
        Payment::pending(order_id, user_id, 19.99, "card".to_string(), intent.to_string())
    }

    #[tokio::test]
    async fn insert_assigns_id_and_round_trips() {
        let store = InMemoryPaymentStore::new();
        let id = store.insert(payment(42, 7, "pi_1")).await.unwrap();

        let found = store.find_by_id(&id.to_hex()).await.unwrap();
        assert_eq!(found.id, Some(id));
        assert_eq!(found.order_id, 42);
        assert_eq!(found.user_id, 7);
        assert_eq!(found.payment_intent_id, "pi_1");
    }

    #[tokio::test]
    async fn malformed_id_is_distinct_from_missing_id() {
        let store = InMemoryPaymentStore::new();

        assert!(matches!(
            store.find_by_id("xyz").await,
            Err(PaymentError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            store.find_by_id(&ObjectId::new().to_hex()).await,
            Err(PaymentError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_intent_ids_are_rejected() {
        let store = InMemoryPaymentStore::new();
        store.insert(payment(1, 1, "pi_dup")).await.unwrap();

        let err = store.insert(payment(2, 1, "pi_dup")).await.unwrap_err();
        assert!(matches!(err, PaymentError::Store(_)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn find_many_returns_empty_for_unknown_user() {
        let store = InMemoryPaymentStore::new();
        store.insert(payment(1, 7, "pi_1")).await.unwrap();
        store.insert(payment(2, 7, "pi_2")).await.unwrap();
        store.insert(payment(3, 8, "pi_3")).await.unwrap();

        let mine = store.find_many_by_user_id(7).await.unwrap();
        assert_eq!(
            mine.iter().map(|p| p.order_id).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert!(store.find_many_by_user_id(99).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_returns_post_update_snapshot() {
        let store = InMemoryPaymentStore::new();
        let id = store.insert(payment(42, 7, "pi_1")).await.unwrap();
        let before = store.find_by_id(&id.to_hex()).await.unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;
        let updated = store
            .find_and_update_status(
                PaymentFilter::PaymentIntentId("pi_1".to_string()),
                StatusChange::completed("pi_1"),
            )
            .await
            .unwrap();

        assert_eq!(updated.status, PaymentStatus::Completed);
        assert_eq!(updated.transaction_id.as_deref(), Some("pi_1"));
        assert!(updated.updated_at > before.updated_at);
        assert_eq!(updated.created_at, before.created_at);

        let refunded = store
            .find_and_update_status(PaymentFilter::Id(id), StatusChange::refunded("re_1"))
            .await
            .unwrap();
        assert_eq!(refunded.status, PaymentStatus::Refunded);
        assert_eq!(refunded.refund_id.as_deref(), Some("re_1"));

        let stored = store.find_by_id(&id.to_hex()).await.unwrap();
        assert_eq!(stored, refunded);
    }

    #[tokio::test]
    async fn update_without_match_is_not_found() {
        let store = InMemoryPaymentStore::new();
        let err = store
            .find_and_update_status(
                PaymentFilter::PaymentIntentId("pi_nope".to_string()),
                StatusChange::completed("pi_nope"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::NotFound(_)));
    }
}
