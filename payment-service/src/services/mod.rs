pub mod gateway;
pub mod memory;
pub mod metrics;
pub mod payments;
pub mod repository;

pub use gateway::{GatewayError, MockGateway, PaymentGateway, StripeClient};
pub use memory::InMemoryPaymentStore;
pub use metrics::{get_metrics, init_metrics};
pub use payments::PaymentService;
pub use repository::{PaymentRepository, PaymentStore};
