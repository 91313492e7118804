use anyhow::Result;
use clap::{Args, ValueEnum};
use tracing::warn;

use arcadia_core::AppConfig;
use arcadia_simulator::Side;

use crate::app::{parse_amount, App, WalletArgs};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideArg {
    Buy,
    Sell,
}

impl From<SideArg> for Side {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Buy => Side::Buy,
            SideArg::Sell => Side::Sell,
        }
    }
}

/// Arguments for placing simulated trades.
#[derive(Args, Debug, Clone)]
pub struct TradeArgs {
    #[command(flatten)]
    pub wallet: WalletArgs,

    /// Trade direction
    #[arg(long, value_enum)]
    pub side: SideArg,

    /// Amount of tokens per trade
    #[arg(long)]
    pub amount: String,

    /// Number of trades to place
    #[arg(long, default_value = "1")]
    pub count: u32,

    /// Close every position after trading
    #[arg(long)]
    pub exit: bool,
}

pub async fn run_trade(config: &AppConfig, args: TradeArgs) -> Result<()> {
    let mut app = App::build(config, &args.wallet)?;
    app.ensure_connected(&args.wallet.provider).await?;

    let amount = parse_amount(&args.amount);
    app.simulator.select_side(args.side.into());

    for _ in 0..args.count {
        app.simulator.stage_amount(amount);
        let result = app.simulator.execute_pending().await;
        app.flush_notifications();
        if let Err(e) = result {
            warn!(error = %e, "Trade rejected");
            return Err(e.into());
        }
    }

    for position in app.simulator.positions() {
        println!(
            "{} {} {} @ {:.4}  pnl {:+.2}",
            position.id, position.side, position.amount, position.entry_price, position.pnl
        );
    }

    if args.exit {
        let summary = app.simulator.exit_all();
        app.flush_notifications();
        println!("Exit: {} ({:.2})", summary.outcome, summary.aggregate_pnl);
    }
    Ok(())
}
