//! # Hierarchy Example
//!
//! Declares `Admin <: User <: dyn Named` and shows that one publish of an `Admin`
//! reaches the subscribers of all three topic types with the same name.
//!
//! ## Run
//! ```bash
//! RUST_LOG=statevisor=debug cargo run --example hierarchy
//! ```

use std::sync::Arc;

use statevisor::{Mediator, Sender};

trait Named: Send + Sync {
    fn name(&self) -> &str;
}

struct User {
    name: String,
}

struct Admin {
    name: String,
    scopes: Vec<&'static str>,
}

impl Named for User {
    fn name(&self) -> &str {
        &self.name
    }
}

struct Console;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mediator = Mediator::builder().build();
    mediator.declare_subtype::<Admin, User, _>(|a: Arc<Admin>| {
        Arc::new(User {
            name: a.name.clone(),
        })
    })?;
    mediator.declare_subtype::<User, dyn Named, _>(|u: Arc<User>| u as Arc<dyn Named>)?;

    let console = Arc::new(Console);
    mediator.subscribe_topic(&console, "session", |_c: Arc<Console>, _s: Sender, a: Arc<Admin>| async move {
        println!(" ├─► admin   {} {:?}", a.name, a.scopes);
        Ok(())
    });
    mediator.subscribe_topic(&console, "session", |_c: Arc<Console>, _s: Sender, u: Arc<User>| async move {
        println!(" ├─► user    {}", u.name);
        Ok(())
    });
    mediator.subscribe_topic(&console, "session", |_c: Arc<Console>, _s: Sender, n: Arc<dyn Named>| async move {
        println!(" └─► named   {}", n.name());
        Ok(())
    });

    println!("publish Admin:");
    let admin = Admin {
        name: "root".into(),
        scopes: vec!["billing", "users"],
    };
    let report = mediator
        .publish_topic(&Sender::new("login"), "session", admin)
        .await;
    println!("{report:?}");

    println!("publish User:");
    let report = mediator
        .publish_topic(&Sender::new("login"), "session", User { name: "ann".into() })
        .await;
    println!("{report:?}");

    // Declaring the reverse edge would close a cycle.
    let reverse = mediator.declare_subtype::<User, Admin, _>(|u: Arc<User>| {
        Arc::new(Admin {
            name: u.name.clone(),
            scopes: Vec::new(),
        })
    });
    if let Err(err) = reverse {
        println!("rejected: {err}");
    }
    Ok(())
}
