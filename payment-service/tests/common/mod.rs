#![allow(dead_code)]

use payment_service::config::{
    Config, DatabaseConfig, GatewayConfig, GatewayProvider, StripeConfig,
};
use payment_service::services::{InMemoryPaymentStore, StripeClient};
use payment_service::startup::Application;
use secrecy::Secret;
use serde_json::{json, Value};
use service_core::config::Config as CommonConfig;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const STRIPE_TEST_KEY: &str = "sk_test_payment_service";

pub struct TestApp {
    pub address: String,
    pub store: Arc<InMemoryPaymentStore>,
    pub stripe: MockServer,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Spawn the HTTP API over an in-memory store, talking to a mocked Stripe.
    pub async fn spawn() -> Self {
        let stripe = MockServer::start().await;

        let config = Config {
            common: CommonConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                log_level: "info".to_string(),
                otlp_endpoint: None,
            },
            database: DatabaseConfig {
                url: Secret::new("mongodb://localhost:27017".to_string()),
                db_name: "payment_test".to_string(),
            },
            gateway: GatewayConfig {
                provider: GatewayProvider::Stripe,
                stripe: StripeConfig {
                    secret_key: Secret::new(STRIPE_TEST_KEY.to_string()),
                    api_base_url: stripe.uri(),
                    currency: "usd".to_string(),
                    timeout_secs: 5,
                },
            },
            service_name: "payment-service-test".to_string(),
        };

        let store = Arc::new(InMemoryPaymentStore::new());
        let gateway = Arc::new(
            StripeClient::new(config.gateway.stripe.clone()).expect("Failed to build Stripe client"),
        );

        let app = Application::build_with(config, store.clone(), gateway)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        TestApp {
            address: format!("http://127.0.0.1:{}", port),
            store,
            stripe,
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn create_intent(&self, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/payments/create-intent"))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn confirm(&self, payment_intent_id: &str) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/payments/confirm/{}", payment_intent_id)))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn refund(&self, id: &str, body: &Value) -> reqwest::Response {
        self.client
            .put(self.url(&format!("/api/payments/{}/refund", id)))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Stripe accepts the next intent creation and returns `intent_id`.
    pub async fn stripe_creates_intent(&self, intent_id: &str) {
        Mock::given(method("POST"))
            .and(path("/payment_intents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(intent_body(intent_id)))
            .up_to_n_times(1)
            .mount(&self.stripe)
            .await;
    }

    /// Stripe resolves `intent_id` on lookup.
    pub async fn stripe_knows_intent(&self, intent_id: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/payment_intents/{}", intent_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(intent_body(intent_id)))
            .mount(&self.stripe)
            .await;
    }

    /// Stripe accepts any refund.
    pub async fn stripe_refunds(&self) {
        Mock::given(method("POST"))
            .and(path("/refunds"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "re_test_1",
                "object": "refund",
                "amount": 500,
                "status": "succeeded"
            })))
            .mount(&self.stripe)
            .await;
    }

    /// Create a payment through the API and return `(id, paymentIntentId)`.
    pub async fn seed_payment(&self, order_id: i64, user_id: i64, intent_id: &str) -> (String, String) {
        self.stripe_creates_intent(intent_id).await;
        let response = self
            .create_intent(&json!({
                "orderId": order_id,
                "userId": user_id,
                "amount": 19.99,
                "method": "card"
            }))
            .await;
        assert_eq!(response.status().as_u16(), 201);

        let body: Value = self
            .get(&format!("/api/payments/order/{}", order_id))
            .await
            .json()
            .await
            .expect("Failed to parse JSON");
        (
            body["id"].as_str().unwrap_or_default().to_string(),
            body["paymentIntentId"].as_str().unwrap_or_default().to_string(),
        )
    }
}

pub fn intent_body(intent_id: &str) -> Value {
    json!({
        "id": intent_id,
        "object": "payment_intent",
        "client_secret": format!("{}_secret_test", intent_id),
        "status": "requires_payment_method",
        "amount": 1999,
        "currency": "usd",
        "metadata": {}
    })
}
