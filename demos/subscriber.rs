//! # Subscriber Example
//!
//! Shows closure and trait-based subscribers on the same mediator, and how
//! dropping a subscriber is enough to stop its deliveries.
//!
//! The example counts:
//! - Orders seen by a trait-based [`Subscribe`] implementor
//! - Orders rejected by a closure handler (reported, never returned)
//!
//! ## Run
//! ```bash
//! cargo run --example subscriber
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use statevisor::{HandlerError, Mediator, Sender, Subscribe};

struct Order {
    id: u64,
    amount: u64,
}

struct Metrics {
    orders: AtomicU64,
    revenue: AtomicU64,
}

impl Metrics {
    fn new() -> Self {
        Self {
            orders: AtomicU64::new(0),
            revenue: AtomicU64::new(0),
        }
    }

    fn print_stats(&self) {
        println!();
        println!("Metrics:");
        println!(" ├─► Orders:  {}", self.orders.load(Ordering::Relaxed));
        println!(" └─► Revenue: {}", self.revenue.load(Ordering::Relaxed));
    }
}

#[async_trait::async_trait]
impl Subscribe<Order> for Metrics {
    async fn on_publish(&self, _sender: &Sender, order: Arc<Order>) -> Result<(), HandlerError> {
        self.orders.fetch_add(1, Ordering::Relaxed);
        self.revenue.fetch_add(order.amount, Ordering::Relaxed);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "metrics"
    }
}

struct Fraud;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mediator = Mediator::builder().build();
    let checkout = Sender::new("checkout");

    let metrics = Arc::new(Metrics::new());
    mediator.attach::<Order, _>(&metrics, "orders");

    let fraud = Arc::new(Fraud);
    mediator.subscribe_topic(&fraud, "orders", |_f: Arc<Fraud>, from: Sender, order: Arc<Order>| async move {
        if order.amount > 1_000 {
            return Err(HandlerError::fail(format!("order {} from {from} flagged", order.id)));
        }
        Ok(())
    });

    for (id, amount) in [(1, 40), (2, 5_000), (3, 120)] {
        let report = mediator
            .publish_topic(&checkout, "orders", Order { id, amount })
            .await;
        println!("order {id}: {report:?}");
    }

    // The fraud checker goes away; its entry is pruned by the next publish.
    drop(fraud);
    let report = mediator
        .publish_topic(&checkout, "orders", Order { id: 4, amount: 9_000 })
        .await;
    println!("order 4: {report:?}");

    metrics.print_stats();
    Ok(())
}
