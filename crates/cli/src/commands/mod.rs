pub mod demo;
pub mod trade;

pub use demo::{run_demo, DemoArgs};
pub use trade::{run_trade, TradeArgs};
