//! `tcc-demo` — a small binary that drives a [`tcc_engine::Engine`] through a
//! two-action transaction against the in-memory queue, then runs the
//! recovery loop to completion the way a production poller would.
//!
//! Two actions are registered: `reserve-seat` always succeeds; `charge-card`
//! fails its `Try` when `--fail` is passed, so `--fail` demonstrates the
//! cancellation path (including the compensating `release seat` cancel).

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use clap::Parser;
use serde::{Deserialize, Serialize};
use tcc_core::{Action, ActionError, Error as TccError};
use tcc_engine::Engine;
use tcc_storage::MemoryQueue;

#[derive(Parser)]
#[command(about = "Run a demo TCC transaction against an in-memory queue")]
struct Args {
    /// Seat number to reserve.
    #[arg(long, default_value_t = 12)]
    seat: u32,

    /// Amount to charge, in cents.
    #[arg(long, default_value_t = 500)]
    amount_cents: u32,

    /// Fail the charge's Try, forcing the transaction to cancel.
    #[arg(long)]
    fail: bool,

    /// Run the two actions concurrently instead of in order.
    #[arg(long)]
    concurrent: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ReserveSeat {
    seat: u32,
}

#[async_trait]
impl Action for ReserveSeat {
    fn name(&self) -> &'static str {
        "reserve-seat"
    }

    fn to_raw(&self) -> Result<serde_json::Value, TccError> {
        serde_json::to_value(self).map_err(|e| TccError::Encode(e.to_string()))
    }

    async fn try_op(&self) -> Result<(), ActionError> {
        println!("try:     reserving seat {}", self.seat);
        Ok(())
    }

    async fn confirm(&self) -> Result<(), ActionError> {
        println!("confirm: seat {} is yours", self.seat);
        Ok(())
    }

    async fn cancel(&self) -> Result<(), ActionError> {
        println!("cancel:  releasing seat {}", self.seat);
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChargeCard {
    amount_cents: u32,
    #[serde(default)]
    should_fail: bool,
}

#[async_trait]
impl Action for ChargeCard {
    fn name(&self) -> &'static str {
        "charge-card"
    }

    fn to_raw(&self) -> Result<serde_json::Value, TccError> {
        serde_json::to_value(self).map_err(|e| TccError::Encode(e.to_string()))
    }

    async fn try_op(&self) -> Result<(), ActionError> {
        if self.should_fail {
            return Err("card declined".into());
        }
        println!("try:     authorizing {} cents", self.amount_cents);
        Ok(())
    }

    async fn confirm(&self) -> Result<(), ActionError> {
        println!("confirm: captured {} cents", self.amount_cents);
        Ok(())
    }

    async fn cancel(&self) -> Result<(), ActionError> {
        println!("cancel:  voiding authorization for {} cents", self.amount_cents);
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let queue = MemoryQueue::new();
    let engine = match Engine::new("demo-booking", queue).await {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("failed to start engine: {e}");
            std::process::exit(1);
        }
    };
    engine.register(ReserveSeat { seat: 0 });
    engine.register(ChargeCard {
        amount_cents: 0,
        should_fail: false,
    });

    let actions: Vec<Box<dyn Action>> = vec![
        Box::new(ReserveSeat { seat: args.seat }),
        Box::new(ChargeCard {
            amount_cents: args.amount_cents,
            should_fail: args.fail,
        }),
    ];

    match engine.run(Duration::from_secs(30), args.concurrent, actions).await {
        Ok(()) => println!("--- transaction confirmed ---"),
        Err(e) => println!("--- transaction canceled: {e} ---"),
    }

    // The in-memory queue has no background poller; drain whatever the
    // engine just scheduled (sub-record settlement happens on delivery).
    let mut rounds = 0;
    while !engine.queue().is_empty() && rounds < 10 {
        engine.queue().deliver_due(Utc::now()).await;
        rounds += 1;
    }
    println!("recovery drained in {rounds} round(s)");
}
