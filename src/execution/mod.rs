use crate::{
    Symbol, TimestampMs,
    account::{OrderSide, PendingOrderKind, PositionSide, VirtualAccount},
    data::{Candle, HistoricalDataProvider, MarketDataStore},
    error::AccountError,
    event::TriggerEvent,
    strategy::{Decision, DecisionOp},
    trade::{ExitReason, TradeOperation, TradeRecord},
};
use derive_more::Constructor;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use smol_str::SmolStr;
use tracing::warn;

/// Translates strategy [`Decision`]s and pending TP/SL orders into
/// [`VirtualAccount`] mutations and [`TradeRecord`]s.
///
/// Execution is fully deterministic: a constant slippage percentage shifted
/// against the order side, and a flat fee rate on the executed notional. No
/// maker/taker distinction, no volume scaling.
#[derive(Debug, Clone, PartialEq, Constructor)]
pub struct ExecutionSimulator {
    slippage_percent: Decimal,
    fee_rate: Decimal,
}

/// Trigger context stamped onto the trade records of one decision.
struct TradeContext {
    trigger_kind: crate::event::TriggerKind,
    pool_name: Option<SmolStr>,
    triggered_signals: Vec<SmolStr>,
}

impl TradeContext {
    fn from_trigger(trigger: &TriggerEvent) -> Self {
        Self {
            trigger_kind: trigger.kind,
            pool_name: trigger.pool_name.clone(),
            triggered_signals: trigger
                .triggered_signals
                .iter()
                .map(|signal| signal.name.clone())
                .collect(),
        }
    }
}

impl ExecutionSimulator {
    /// Execution price with slippage applied against the order side, and the
    /// absolute slippage amount. Buying pushes the price up, selling down.
    pub fn execution_price(&self, price: Decimal, side: OrderSide) -> (Decimal, Decimal) {
        let factor = self.slippage_percent / Decimal::ONE_HUNDRED;
        let executed = match side {
            OrderSide::Buy => price * (Decimal::ONE + factor),
            OrderSide::Sell => price * (Decimal::ONE - factor),
        };
        (executed, (executed - price).abs())
    }

    /// Fee on an executed notional.
    pub fn fee(&self, notional: Decimal) -> Decimal {
        notional * self.fee_rate / Decimal::ONE_HUNDRED
    }

    /// Dispatch a validated decision against the account.
    ///
    /// Returns the trade records produced: empty for holds, no-ops, and
    /// rejected decisions; one record for an open/add/close; two records for a
    /// reverse (the close, then the re-open). Only genuinely unexpected
    /// account inconsistencies surface as errors.
    pub fn execute_decision(
        &self,
        decision: &Decision,
        account: &mut VirtualAccount,
        current_price: Decimal,
        timestamp: TimestampMs,
        trigger: &TriggerEvent,
    ) -> Result<Vec<TradeRecord>, AccountError> {
        let context = TradeContext::from_trigger(trigger);

        match decision.operation {
            DecisionOp::Hold => Ok(Vec::new()),
            DecisionOp::Close => {
                let Some(position) = account.position(&decision.symbol) else {
                    return Ok(Vec::new());
                };
                if !close_price_present(decision, position.side) {
                    warn!(
                        symbol = %decision.symbol,
                        "rejecting close decision without its required limit price"
                    );
                    return Ok(Vec::new());
                }
                let trade = self.close_full(
                    account,
                    &decision.symbol,
                    current_price,
                    timestamp,
                    ExitReason::Decision,
                    decision.reason.clone(),
                    &context,
                )?;
                Ok(trade.into_iter().collect())
            }
            DecisionOp::Buy | DecisionOp::Sell => {
                if !self.validate_entry(decision) {
                    return Ok(Vec::new());
                }

                let entry_side = match decision.operation {
                    DecisionOp::Buy => PositionSide::Long,
                    _ => PositionSide::Short,
                };

                let mut trades = Vec::new();
                if let Some(position) = account.position(&decision.symbol) {
                    if position.side == entry_side {
                        // Same direction: average into the existing position.
                        let trade = self.enter(
                            account,
                            decision,
                            entry_side,
                            current_price,
                            timestamp,
                            TradeOperation::AddPosition,
                            &context,
                        )?;
                        return Ok(trade.into_iter().collect());
                    }

                    // Opposite direction: close the existing position first.
                    trades.extend(self.close_full(
                        account,
                        &decision.symbol,
                        current_price,
                        timestamp,
                        ExitReason::Reverse,
                        "reverse into opposite side".to_string(),
                        &context,
                    )?);
                }

                let operation = match decision.operation {
                    DecisionOp::Buy => TradeOperation::Buy,
                    _ => TradeOperation::Sell,
                };
                trades.extend(self.enter(
                    account,
                    decision,
                    entry_side,
                    current_price,
                    timestamp,
                    operation,
                    &context,
                )?);
                Ok(trades)
            }
        }
    }

    /// Open a new position or add to an existing one, spawning the tranche's
    /// independent TP/SL orders.
    #[allow(clippy::too_many_arguments)]
    fn enter(
        &self,
        account: &mut VirtualAccount,
        decision: &Decision,
        side: PositionSide,
        current_price: Decimal,
        timestamp: TimestampMs,
        operation: TradeOperation,
        context: &TradeContext,
    ) -> Result<Option<TradeRecord>, AccountError> {
        let order_side = match side {
            PositionSide::Long => OrderSide::Buy,
            PositionSide::Short => OrderSide::Sell,
        };
        let (exec_price, _) = self.execution_price(current_price, order_side);

        let available = account.balance * decision.target_portion_of_balance;
        let size = (available * Decimal::from(decision.leverage)) / exec_price;
        if size <= Decimal::ZERO {
            warn!(symbol = %decision.symbol, %size, "rejecting entry with non-positive size");
            return Ok(None);
        }

        let fee = self.fee(size * exec_price);
        let mut reason = decision.reason.clone();

        if operation == TradeOperation::AddPosition {
            let position = account.add_to_position(&decision.symbol, size, exec_price, fee)?;
            reason = format!("{reason} (added to position, avg entry {})", position.entry_price);
        } else {
            match account.open_position(
                decision.symbol.clone(),
                side,
                size,
                exec_price,
                decision.leverage,
                timestamp,
                fee,
            ) {
                Ok(_) => {}
                Err(AccountError::InsufficientMargin {
                    required,
                    available,
                }) => {
                    warn!(
                        symbol = %decision.symbol,
                        %required,
                        %available,
                        "rejecting open with insufficient balance"
                    );
                    return Ok(None);
                }
                Err(other) => return Err(other),
            }
        }

        // Each entry tranche owns its own reduce-only TP/SL orders, tagged
        // with this tranche's fill price for exact PnL attribution.
        let close_side = side.close_side();
        if let Some(tp_price) = decision.take_profit_price {
            account.add_pending_order(
                decision.symbol.clone(),
                close_side,
                PendingOrderKind::TakeProfit,
                tp_price,
                size,
                exec_price,
                timestamp,
            );
        }
        if let Some(sl_price) = decision.stop_loss_price {
            account.add_pending_order(
                decision.symbol.clone(),
                close_side,
                PendingOrderKind::StopLoss,
                sl_price,
                size,
                exec_price,
                timestamp,
            );
        }

        Ok(Some(TradeRecord {
            time: timestamp,
            trigger_kind: Some(context.trigger_kind),
            symbol: decision.symbol.clone(),
            operation,
            side,
            entry_price: exec_price,
            size,
            leverage: decision.leverage,
            exit_price: None,
            exit_time: None,
            exit_reason: None,
            pnl: Decimal::ZERO,
            pnl_percent: Decimal::ZERO,
            fee,
            equity_after: None,
            reason,
            pool_name: context.pool_name.clone(),
            triggered_signals: context.triggered_signals.clone(),
        }))
    }

    /// Fully close the position on `symbol`, if any.
    #[allow(clippy::too_many_arguments)]
    fn close_full(
        &self,
        account: &mut VirtualAccount,
        symbol: &Symbol,
        current_price: Decimal,
        timestamp: TimestampMs,
        exit_reason: ExitReason,
        reason: String,
        context: &TradeContext,
    ) -> Result<Option<TradeRecord>, AccountError> {
        let Some(position) = account.position(symbol).cloned() else {
            return Ok(None);
        };

        let (exec_price, _) = self.execution_price(current_price, position.side.close_side());
        let fee = self.fee(position.size * exec_price);
        let pnl = account.close_position(symbol, exec_price, fee)?;

        let entry_notional = position.size * position.entry_price;
        let pnl_percent = if entry_notional > Decimal::ZERO {
            pnl / entry_notional * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };

        Ok(Some(TradeRecord {
            time: position.entry_time,
            trigger_kind: Some(context.trigger_kind),
            symbol: symbol.clone(),
            operation: TradeOperation::Close,
            side: position.side,
            entry_price: position.entry_price,
            size: position.size,
            leverage: position.leverage,
            exit_price: Some(exec_price),
            exit_time: Some(timestamp),
            exit_reason: Some(exit_reason),
            pnl,
            pnl_percent,
            fee,
            equity_after: None,
            reason,
            pool_name: context.pool_name.clone(),
            triggered_signals: context.triggered_signals.clone(),
        }))
    }

    /// Scan the candles between two triggers for TP/SL fires on `symbol`.
    ///
    /// Candles are processed in chronological order; within one candle,
    /// pending orders are checked in insertion order and every matching order
    /// fires. Fills execute at the order's trigger price with slippage, not
    /// the candle close. After each fill, equity is marked at the fill
    /// instant: the candle close for the fired symbol, the historical price at
    /// the candle close time for every other open symbol.
    pub fn check_pending_orders<Store>(
        &self,
        account: &mut VirtualAccount,
        symbol: &Symbol,
        candles: &[Candle],
        provider: &HistoricalDataProvider<Store>,
    ) -> Result<Vec<TradeRecord>, AccountError>
    where
        Store: MarketDataStore,
    {
        let mut trades = Vec::new();

        for candle in candles {
            let candidates: Vec<_> = account.pending_orders_for(symbol).cloned().collect();

            for order in candidates {
                let Some(position) = account.position(symbol) else {
                    // Position fully closed by an earlier fire; orphaned
                    // orders are silently removed.
                    account.remove_pending_order(order.id);
                    continue;
                };
                let position_side = position.side;
                let leverage = position.leverage;

                if !order.triggers_within(position_side, candle.high, candle.low) {
                    continue;
                }

                let (exec_price, _) = self.execution_price(order.trigger_price, order.side);
                let fee = self.fee(order.size * exec_price);
                let pnl = account.partial_close_position(
                    symbol,
                    order.size,
                    exec_price,
                    fee,
                    Some(order.entry_price),
                )?;
                account.remove_pending_order(order.id);

                let mut prices = IndexMap::new();
                prices.insert(symbol.clone(), candle.close);
                for other_symbol in account.positions().keys() {
                    if other_symbol != symbol
                        && let Some(price) = provider.price_at(other_symbol, candle.close_time)
                    {
                        prices.insert(other_symbol.clone(), price);
                    }
                }
                account.mark_equity(&prices);

                let entry_notional = order.size * order.entry_price;
                let pnl_percent = if entry_notional > Decimal::ZERO {
                    pnl / entry_notional * Decimal::ONE_HUNDRED
                } else {
                    Decimal::ZERO
                };

                let (exit_reason, reason) = match order.kind {
                    PendingOrderKind::TakeProfit => {
                        (ExitReason::TakeProfit, "take profit triggered")
                    }
                    PendingOrderKind::StopLoss => (ExitReason::StopLoss, "stop loss triggered"),
                };

                trades.push(TradeRecord {
                    time: order.created_at,
                    trigger_kind: None,
                    symbol: symbol.clone(),
                    operation: TradeOperation::Close,
                    side: position_side,
                    entry_price: order.entry_price,
                    size: order.size,
                    leverage,
                    exit_price: Some(exec_price),
                    exit_time: Some(candle.close_time),
                    exit_reason: Some(exit_reason),
                    pnl,
                    pnl_percent,
                    fee,
                    equity_after: Some(account.equity),
                    reason: reason.to_string(),
                    pool_name: None,
                    triggered_signals: Vec::new(),
                });
            }
        }

        Ok(trades)
    }

    fn validate_entry(&self, decision: &Decision) -> bool {
        let portion = decision.target_portion_of_balance;
        if portion < Decimal::new(1, 1) || portion > Decimal::ONE {
            warn!(
                symbol = %decision.symbol,
                %portion,
                "rejecting decision with portion outside [0.1, 1.0]"
            );
            return false;
        }

        if !(1..=50).contains(&decision.leverage) {
            warn!(
                symbol = %decision.symbol,
                leverage = decision.leverage,
                "rejecting decision with leverage outside [1, 50]"
            );
            return false;
        }

        let price_present = match decision.operation {
            DecisionOp::Buy => decision.max_price.is_some(),
            DecisionOp::Sell => decision.min_price.is_some(),
            _ => true,
        };
        if !price_present {
            warn!(
                symbol = %decision.symbol,
                operation = ?decision.operation,
                "rejecting decision without its required limit price"
            );
            return false;
        }

        true
    }
}

/// Closing a long requires `min_price`; closing a short requires `max_price`.
fn close_price_present(decision: &Decision, position_side: PositionSide) -> bool {
    match position_side {
        PositionSide::Long => decision.min_price.is_some(),
        PositionSide::Short => decision.max_price.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::InMemoryMarketData;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn simulator() -> ExecutionSimulator {
        ExecutionSimulator::new(Decimal::ZERO, Decimal::ZERO)
    }

    fn trigger() -> TriggerEvent {
        TriggerEvent::scheduled(1_000)
    }

    fn provider() -> HistoricalDataProvider<InMemoryMarketData> {
        HistoricalDataProvider::new(
            Arc::new(InMemoryMarketData::new()),
            vec![Symbol::new("BTC")],
            0,
        )
    }

    fn buy(symbol: &str, portion: Decimal, leverage: u32) -> Decision {
        Decision {
            operation: DecisionOp::Buy,
            symbol: Symbol::new(symbol),
            target_portion_of_balance: portion,
            leverage,
            max_price: Some(dec!(1000000)),
            ..Decision::default()
        }
    }

    fn sell(symbol: &str, portion: Decimal, leverage: u32) -> Decision {
        Decision {
            operation: DecisionOp::Sell,
            symbol: Symbol::new(symbol),
            target_portion_of_balance: portion,
            leverage,
            min_price: Some(dec!(0.01)),
            ..Decision::default()
        }
    }

    #[test]
    fn test_execution_price_slippage() {
        let simulator = ExecutionSimulator::new(dec!(0.05), Decimal::ZERO);

        let (buy_price, buy_slippage) = simulator.execution_price(dec!(100), OrderSide::Buy);
        assert_eq!(buy_price, dec!(100.05));
        assert_eq!(buy_slippage, dec!(0.05));

        let (sell_price, sell_slippage) = simulator.execution_price(dec!(100), OrderSide::Sell);
        assert_eq!(sell_price, dec!(99.95));
        assert_eq!(sell_slippage, dec!(0.05));
    }

    #[test]
    fn test_fee_on_notional() {
        let simulator = ExecutionSimulator::new(Decimal::ZERO, dec!(0.035));
        assert_eq!(simulator.fee(dec!(10000)), dec!(3.5));
    }

    #[test]
    fn test_buy_without_position_opens_long() {
        let simulator = simulator();
        let mut account = VirtualAccount::new(dec!(10000));

        let trades = simulator
            .execute_decision(
                &buy("BTC", dec!(0.5), 2),
                &mut account,
                dec!(100),
                1_000,
                &trigger(),
            )
            .unwrap();

        assert_eq!(trades.len(), 1);
        let trade = &trades[0];
        assert_eq!(trade.operation, TradeOperation::Buy);
        assert_eq!(trade.side, PositionSide::Long);
        // size = (10000 * 0.5 * 2) / 100
        assert_eq!(trade.size, dec!(100));

        let position = account.position(&Symbol::new("BTC")).unwrap();
        assert_eq!(position.size, dec!(100));
        assert_eq!(position.leverage, 2);
        // margin = 100 * 100 / 2
        assert_eq!(account.balance, dec!(10000) - dec!(5000));
    }

    #[test]
    fn test_buy_same_side_adds_to_position() {
        let simulator = simulator();
        let mut account = VirtualAccount::new(dec!(10000));
        let btc = Symbol::new("BTC");

        account
            .open_position(
                btc.clone(),
                PositionSide::Long,
                dec!(10),
                dec!(100),
                1,
                0,
                Decimal::ZERO,
            )
            .unwrap();

        let trades = simulator
            .execute_decision(
                &buy("BTC", dec!(0.5), 1),
                &mut account,
                dec!(110),
                2_000,
                &trigger(),
            )
            .unwrap();

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].operation, TradeOperation::AddPosition);
        let position = account.position(&btc).unwrap();
        assert!(position.size > dec!(10));
        // weighted average sits between the two entries
        assert!(position.entry_price > dec!(100) && position.entry_price < dec!(110));
    }

    #[test]
    fn test_buy_on_short_reverses_with_two_records() {
        let simulator = simulator();
        let mut account = VirtualAccount::new(dec!(10000));
        let btc = Symbol::new("BTC");

        account
            .open_position(
                btc.clone(),
                PositionSide::Short,
                dec!(10),
                dec!(100),
                1,
                0,
                Decimal::ZERO,
            )
            .unwrap();
        account.add_pending_order(
            btc.clone(),
            OrderSide::Buy,
            PendingOrderKind::StopLoss,
            dec!(120),
            dec!(10),
            dec!(100),
            0,
        );

        let trades = simulator
            .execute_decision(
                &buy("BTC", dec!(0.5), 1),
                &mut account,
                dec!(90),
                2_000,
                &trigger(),
            )
            .unwrap();

        // exactly one close followed by one open, never an add
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].operation, TradeOperation::Close);
        assert_eq!(trades[0].exit_reason, Some(ExitReason::Reverse));
        assert_eq!(trades[0].pnl, dec!(100));
        assert_eq!(trades[1].operation, TradeOperation::Buy);
        assert_eq!(trades[1].side, PositionSide::Long);

        let position = account.position(&btc).unwrap();
        assert_eq!(position.side, PositionSide::Long);
        // no pending orders survive the reverse
        assert!(account.pending_orders().is_empty());
    }

    #[test]
    fn test_close_without_position_is_noop() {
        let simulator = simulator();
        let mut account = VirtualAccount::new(dec!(10000));

        let decision = Decision {
            operation: DecisionOp::Close,
            symbol: Symbol::new("BTC"),
            min_price: Some(dec!(1)),
            ..Decision::default()
        };
        let trades = simulator
            .execute_decision(&decision, &mut account, dec!(100), 1_000, &trigger())
            .unwrap();

        assert!(trades.is_empty());
        assert_eq!(account, VirtualAccount::new(dec!(10000)));
    }

    #[test]
    fn test_invalid_decisions_rejected_without_mutation() {
        let simulator = simulator();
        let mut account = VirtualAccount::new(dec!(10000));
        let pristine = account.clone();

        // portion below 0.1
        let trades = simulator
            .execute_decision(
                &buy("BTC", dec!(0.05), 1),
                &mut account,
                dec!(100),
                1_000,
                &trigger(),
            )
            .unwrap();
        assert!(trades.is_empty());

        // leverage above 50
        let trades = simulator
            .execute_decision(
                &buy("BTC", dec!(0.5), 51),
                &mut account,
                dec!(100),
                1_000,
                &trigger(),
            )
            .unwrap();
        assert!(trades.is_empty());

        // buy without max_price
        let mut no_price = buy("BTC", dec!(0.5), 1);
        no_price.max_price = None;
        let trades = simulator
            .execute_decision(&no_price, &mut account, dec!(100), 1_000, &trigger())
            .unwrap();
        assert!(trades.is_empty());

        assert_eq!(account, pristine);
    }

    #[test]
    fn test_tp_fires_mid_candle_at_trigger_price() {
        let simulator = simulator();
        let mut account = VirtualAccount::new(dec!(10000));
        let btc = Symbol::new("BTC");
        let provider = provider();

        account
            .open_position(
                btc.clone(),
                PositionSide::Long,
                dec!(1),
                dec!(100),
                1,
                0,
                Decimal::ZERO,
            )
            .unwrap();
        account.add_pending_order(
            btc.clone(),
            OrderSide::Sell,
            PendingOrderKind::TakeProfit,
            dec!(110),
            dec!(1),
            dec!(100),
            0,
        );

        // wick to 115, close back at 101: fill must be 110, not 101
        let candles = [Candle {
            close_time: 300_000,
            open: dec!(100),
            high: dec!(115),
            low: dec!(99),
            close: dec!(101),
            volume: dec!(1),
        }];

        let trades = simulator
            .check_pending_orders(&mut account, &btc, &candles, &provider)
            .unwrap();

        assert_eq!(trades.len(), 1);
        let trade = &trades[0];
        assert_eq!(trade.exit_price, Some(dec!(110)));
        assert_eq!(trade.exit_reason, Some(ExitReason::TakeProfit));
        assert_eq!(trade.exit_time, Some(300_000));
        assert_eq!(trade.pnl, dec!(10));
        // equity marked at the candle close
        assert_eq!(trade.equity_after, Some(dec!(10010)));

        assert!(!account.has_position(&btc));
        assert!(account.pending_orders().is_empty());
    }

    #[test]
    fn test_tranche_orders_fire_independently() {
        let simulator = simulator();
        let mut account = VirtualAccount::new(dec!(10000));
        let btc = Symbol::new("BTC");
        let provider = provider();

        // tranche one: size 1.0 @ 100, TP 120
        account
            .open_position(
                btc.clone(),
                PositionSide::Long,
                dec!(1),
                dec!(100),
                1,
                0,
                Decimal::ZERO,
            )
            .unwrap();
        account.add_pending_order(
            btc.clone(),
            OrderSide::Sell,
            PendingOrderKind::TakeProfit,
            dec!(120),
            dec!(1),
            dec!(100),
            0,
        );

        // tranche two: size 1.0 @ 110, TP 115
        account
            .add_to_position(&btc, dec!(1), dec!(110), Decimal::ZERO)
            .unwrap();
        account.add_pending_order(
            btc.clone(),
            OrderSide::Sell,
            PendingOrderKind::TakeProfit,
            dec!(115),
            dec!(1),
            dec!(110),
            0,
        );

        // market wicks to 116: only the 115 TP may fire
        let candles = [Candle {
            close_time: 300_000,
            open: dec!(110),
            high: dec!(116),
            low: dec!(109),
            close: dec!(114),
            volume: dec!(1),
        }];

        let trades = simulator
            .check_pending_orders(&mut account, &btc, &candles, &provider)
            .unwrap();

        assert_eq!(trades.len(), 1);
        // realised on size 1.0 against the tranche's own entry of 110
        assert_eq!(trades[0].exit_price, Some(dec!(115)));
        assert_eq!(trades[0].entry_price, dec!(110));
        assert_eq!(trades[0].pnl, dec!(5));

        // remaining position: size 1.0, averaged entry untouched (one-way
        // averaging at add time)
        let position = account.position(&btc).unwrap();
        assert_eq!(position.size, dec!(1));
        assert_eq!(position.entry_price, dec!(105));

        // the 120 TP is still pending
        assert_eq!(account.pending_orders().len(), 1);
        assert_eq!(account.pending_orders()[0].trigger_price, dec!(120));
    }

    #[test]
    fn test_orphaned_orders_removed_on_scan() {
        let simulator = simulator();
        let mut account = VirtualAccount::new(dec!(10000));
        let btc = Symbol::new("BTC");
        let provider = provider();

        // order without a position (position closed by another path)
        account.add_pending_order(
            btc.clone(),
            OrderSide::Sell,
            PendingOrderKind::TakeProfit,
            dec!(110),
            dec!(1),
            dec!(100),
            0,
        );

        let candles = [Candle {
            close_time: 300_000,
            open: dec!(100),
            high: dec!(120),
            low: dec!(90),
            close: dec!(100),
            volume: dec!(1),
        }];

        let trades = simulator
            .check_pending_orders(&mut account, &btc, &candles, &provider)
            .unwrap();

        assert!(trades.is_empty());
        assert!(account.pending_orders().is_empty());
    }

    #[test]
    fn test_short_position_sl_fires_on_high() {
        let simulator = simulator();
        let mut account = VirtualAccount::new(dec!(10000));
        let btc = Symbol::new("BTC");
        let provider = provider();

        account
            .open_position(
                btc.clone(),
                PositionSide::Short,
                dec!(1),
                dec!(100),
                1,
                0,
                Decimal::ZERO,
            )
            .unwrap();
        account.add_pending_order(
            btc.clone(),
            OrderSide::Buy,
            PendingOrderKind::StopLoss,
            dec!(105),
            dec!(1),
            dec!(100),
            0,
        );

        let candles = [Candle {
            close_time: 300_000,
            open: dec!(100),
            high: dec!(106),
            low: dec!(98),
            close: dec!(104),
            volume: dec!(1),
        }];

        let trades = simulator
            .check_pending_orders(&mut account, &btc, &candles, &provider)
            .unwrap();

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].exit_reason, Some(ExitReason::StopLoss));
        assert_eq!(trades[0].pnl, dec!(-5));
    }

    #[test]
    fn test_sell_entry_opens_short() {
        let simulator = simulator();
        let mut account = VirtualAccount::new(dec!(10000));

        let trades = simulator
            .execute_decision(
                &sell("BTC", dec!(0.5), 1),
                &mut account,
                dec!(100),
                1_000,
                &trigger(),
            )
            .unwrap();

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].side, PositionSide::Short);
        assert_eq!(
            account.position(&Symbol::new("BTC")).unwrap().side,
            PositionSide::Short
        );
    }
}
