use anyhow::Result;
use clap::Args;
use tracing::info;

use arcadia_core::AppConfig;
use arcadia_simulator::Side;
use arcadia_wallet::{short_address, TransactionPayload};

use crate::app::{require_connected, App, WalletArgs};

/// Arguments for the scripted demo session.
#[derive(Args, Debug, Clone)]
pub struct DemoArgs {
    #[command(flatten)]
    pub wallet: WalletArgs,

    /// Number of trades to place, alternating BUY and SELL
    #[arg(long, default_value = "4")]
    pub trades: u32,

    /// Amount per trade
    #[arg(long, default_value = "1.0")]
    pub amount: f64,
}

/// Runs one full session against simulated wallets.
pub async fn run_demo(config: &AppConfig, args: DemoArgs) -> Result<()> {
    let mut app = App::build(config, &args.wallet)?;
    info!(
        network = %config.wallet.network,
        trades = args.trades,
        "Starting demo session"
    );

    app.ensure_connected(&args.wallet.provider).await?;
    let address = require_connected(&app.wallet)?;

    for i in 0..args.trades {
        let side = if i % 2 == 0 { Side::Buy } else { Side::Sell };
        app.simulator.select_side(side);
        app.simulator.execute_trade(args.amount).await?;
        app.flush_notifications();
    }

    let payload = TransactionPayload::entry_function("0x1::coin::transfer")
        .type_argument("0x1::aptos_coin::AptosCoin")
        .argument(address.clone())
        .argument("1000");
    match app.wallet.sign_and_submit(&payload).await {
        Ok(hash) => println!("Submitted transfer from {}: {hash}", short_address(&address)),
        Err(e) => println!("Transaction failed: {e}"),
    }

    println!(
        "Open positions: {}  unrealized P&L: {:.2}",
        app.simulator.positions().len(),
        app.simulator.unrealized_pnl()
    );

    let summary = app.simulator.exit_all();
    app.flush_notifications();
    println!(
        "Closed {} positions ({})  realized P&L: {:.2}",
        summary.closed,
        summary.outcome,
        app.simulator.realized_pnl()
    );

    if let Err(e) = app.wallet.disconnect().await {
        println!("{e}");
    }
    println!("Disconnected: {}", !app.wallet.is_connected());

    let stats = app.simulator.stats();
    info!(
        trades = stats.trades_executed,
        notifications = app.board().len(),
        "Demo session finished"
    );
    Ok(())
}
