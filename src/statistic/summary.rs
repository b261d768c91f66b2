use crate::{
    event::{EquityPoint, TriggerEvent, TriggerKind},
    statistic::metric::{ProfitFactor, SharpeRatio, WinRate},
    trade::TradeRecord,
};
use prettytable::{Table, row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregate performance statistics of one backtest run.
///
/// Monetary figures are exact decimals; `win_rate` and
/// `max_drawdown_percent` are fractions in `[0, 1]`, converted to
/// percentages only for display.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct BacktestSummary {
    pub total_pnl: Decimal,
    pub total_pnl_percent: Decimal,
    pub max_drawdown: Decimal,
    pub max_drawdown_percent: Decimal,
    pub sharpe_ratio: Decimal,

    /// Closed trades only.
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: Decimal,
    pub profit_factor: Decimal,

    pub avg_win: Decimal,
    pub avg_loss: Decimal,
    pub largest_win: Decimal,
    pub largest_loss: Decimal,

    pub total_triggers: usize,
    pub signal_triggers: usize,
    pub scheduled_triggers: usize,
}

impl BacktestSummary {
    /// Aggregate the run's trade ledger, equity curve, and trigger log.
    pub fn generate(
        trades: &[TradeRecord],
        equity_curve: &[EquityPoint],
        triggers: &[TriggerEvent],
        initial_balance: Decimal,
        max_drawdown: Decimal,
        max_drawdown_percent: Decimal,
    ) -> Self {
        let closed: Vec<&TradeRecord> = trades.iter().filter(|trade| trade.is_closed()).collect();

        let total_pnl: Decimal = closed.iter().map(|trade| trade.pnl).sum();
        let total_pnl_percent = if initial_balance > Decimal::ZERO {
            total_pnl / initial_balance * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };

        let winners: Vec<&&TradeRecord> = closed
            .iter()
            .filter(|trade| trade.pnl > Decimal::ZERO)
            .collect();
        let losers: Vec<&&TradeRecord> = closed
            .iter()
            .filter(|trade| trade.pnl <= Decimal::ZERO)
            .collect();

        let gross_profit: Decimal = winners.iter().map(|trade| trade.pnl).sum();
        let gross_loss: Decimal = losers
            .iter()
            .map(|trade| trade.pnl)
            .sum::<Decimal>()
            .abs();

        let win_rate =
            WinRate::calculate(Decimal::from(winners.len()), Decimal::from(closed.len())).value;
        let profit_factor = ProfitFactor::calculate(gross_profit, gross_loss).value;

        let avg_win = if winners.is_empty() {
            Decimal::ZERO
        } else {
            gross_profit / Decimal::from(winners.len())
        };
        let avg_loss = if losers.is_empty() {
            Decimal::ZERO
        } else {
            gross_loss / Decimal::from(losers.len())
        };

        let largest_win = winners
            .iter()
            .map(|trade| trade.pnl)
            .max()
            .unwrap_or(Decimal::ZERO);
        let largest_loss = losers
            .iter()
            .map(|trade| trade.pnl)
            .min()
            .unwrap_or(Decimal::ZERO);

        let sharpe_ratio =
            SharpeRatio::from_equity_curve(equity_curve.iter().map(|point| point.equity)).value;

        let signal_triggers = triggers
            .iter()
            .filter(|trigger| trigger.kind == TriggerKind::Signal)
            .count();
        let scheduled_triggers = triggers
            .iter()
            .filter(|trigger| trigger.kind == TriggerKind::Scheduled)
            .count();

        Self {
            total_pnl,
            total_pnl_percent,
            max_drawdown,
            max_drawdown_percent,
            sharpe_ratio,
            total_trades: closed.len(),
            winning_trades: winners.len(),
            losing_trades: losers.len(),
            win_rate,
            profit_factor,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            total_triggers: triggers.len(),
            signal_triggers,
            scheduled_triggers,
        }
    }

    /// Render the summary as a metric table.
    pub fn table(&self) -> Table {
        let mut table = Table::new();
        table.set_format(*prettytable::format::consts::FORMAT_BOX_CHARS);

        table.set_titles(row![b->"Metric", b->"Value"]);
        table.add_row(row!["Total PnL", format!("{:.2}", self.total_pnl)]);
        table.add_row(row!["Return", format!("{:.2}%", self.total_pnl_percent)]);
        table.add_row(row![
            "Max Drawdown",
            format!(
                "{:.2} ({:.2}%)",
                self.max_drawdown,
                self.max_drawdown_percent * Decimal::ONE_HUNDRED
            )
        ]);
        table.add_row(row!["Sharpe Ratio", format!("{:.4}", self.sharpe_ratio)]);
        table.add_row(row![
            "Trades (W/L)",
            format!(
                "{} ({}/{})",
                self.total_trades, self.winning_trades, self.losing_trades
            )
        ]);
        table.add_row(row![
            "Win Rate",
            format!("{:.2}%", self.win_rate * Decimal::ONE_HUNDRED)
        ]);
        table.add_row(row!["Profit Factor", format!("{:.4}", self.profit_factor)]);
        table.add_row(row![
            "Triggers (signal/scheduled)",
            format!(
                "{} ({}/{})",
                self.total_triggers, self.signal_triggers, self.scheduled_triggers
            )
        ]);
        table
    }

    /// Print the summary table to stdout.
    pub fn print_summary(&self) {
        self.table().printstd();
    }
}
