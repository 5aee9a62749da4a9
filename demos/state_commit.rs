//! # State Commit Example
//!
//! Commits a cart through a [`StateManager`] backed by [`LocalStorage`], then
//! reopens the storage directory to show the committed value survives.
//!
//! ## Run
//! ```bash
//! cargo run --example state_commit
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use statevisor::state::{LocalStorage, StateManager};
use statevisor::{Mediator, Sender};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Cart {
    items: Vec<String>,
}

struct Badge;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let dir = tempfile::tempdir()?;
    let state = StateManager::new(LocalStorage::new(dir.path()), Mediator::builder().build());

    let badge = Arc::new(Badge);
    state.on_committed_named(&badge, "cart", |_b: Arc<Badge>, from: Sender, cart: Arc<Cart>| async move {
        println!(" ├─► {from}: cart has {} item(s)", cart.items.len());
        Ok(())
    });

    let mut cart = state.get_named_state::<Cart>("cart").await;
    for item in ["apple", "pear"] {
        cart.items.push(item.to_string());
        state.commit_named_state("cart", cart.clone()).await?;
    }

    let reopened = StateManager::new(LocalStorage::new(dir.path()), Mediator::builder().build());
    let cart = reopened.get_named_state::<Cart>("cart").await;
    println!(" └─► reopened: {:?}", cart.items);
    Ok(())
}
