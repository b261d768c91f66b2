use crate::{
    Symbol, TimestampMs,
    error::AccountError,
    statistic::metric::drawdown::DrawdownTracker,
};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub mod order;
pub mod position;

pub use order::{OrderSide, PendingOrder, PendingOrderKind};
pub use position::{Position, PositionSide};

/// Residual position size at or below which a partial close collapses into a
/// full close.
pub const CLOSE_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

/// Margined multi-symbol perpetuals ledger for one backtest run.
///
/// Equity follows the account-value convention of mainstream perpetuals
/// venues:
///
/// ```text
/// equity = initial_balance + realized_pnl_total - total_fees + unrealized_pnl_total
/// ```
///
/// Margin locks reduce `balance` (available cash) but never equity; only
/// realised PnL and fees move equity. The identity holds after every mutation
/// and every [`Self::mark_equity`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VirtualAccount {
    pub initial_balance: Decimal,

    /// Available cash for margin. Reduced by margin locks, restored on close.
    pub balance: Decimal,

    /// Account value at the last mark.
    pub equity: Decimal,

    positions: IndexMap<Symbol, Position>,
    pending_orders: Vec<PendingOrder>,
    order_id_counter: u64,

    pub realized_pnl_total: Decimal,
    pub unrealized_pnl_total: Decimal,
    pub total_fees: Decimal,

    drawdown: DrawdownTracker,
}

impl VirtualAccount {
    pub fn new(initial_balance: Decimal) -> Self {
        Self {
            initial_balance,
            balance: initial_balance,
            equity: initial_balance,
            positions: IndexMap::new(),
            pending_orders: Vec::new(),
            order_id_counter: 0,
            realized_pnl_total: Decimal::ZERO,
            unrealized_pnl_total: Decimal::ZERO,
            total_fees: Decimal::ZERO,
            drawdown: DrawdownTracker::init(initial_balance),
        }
    }

    /// Restore the pristine post-construction state, discarding all positions,
    /// orders, and accumulated statistics.
    pub fn reset(&mut self) {
        *self = Self::new(self.initial_balance);
    }

    pub fn has_position(&self, symbol: &Symbol) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn position(&self, symbol: &Symbol) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn positions(&self) -> &IndexMap<Symbol, Position> {
        &self.positions
    }

    pub fn pending_orders(&self) -> &[PendingOrder] {
        &self.pending_orders
    }

    pub fn pending_orders_for<'a>(
        &'a self,
        symbol: &'a Symbol,
    ) -> impl Iterator<Item = &'a PendingOrder> {
        self.pending_orders
            .iter()
            .filter(move |order| &order.symbol == symbol)
    }

    /// Total margin currently locked against open positions.
    pub fn margin_in_use(&self) -> Decimal {
        self.positions
            .values()
            .map(|position| position.margin_used)
            .sum()
    }

    pub fn max_drawdown(&self) -> Decimal {
        self.drawdown.max_drawdown
    }

    /// Maximum drawdown as a fraction of the peak it fell from.
    pub fn max_drawdown_percent(&self) -> Decimal {
        self.drawdown.max_drawdown_percent
    }

    /// Open a new position, locking `size * entry_price / leverage` margin.
    #[allow(clippy::too_many_arguments)]
    pub fn open_position(
        &mut self,
        symbol: Symbol,
        side: PositionSide,
        size: Decimal,
        entry_price: Decimal,
        leverage: u32,
        timestamp: TimestampMs,
        fee: Decimal,
    ) -> Result<&Position, AccountError> {
        if size <= Decimal::ZERO {
            return Err(AccountError::NonPositiveSize(size));
        }

        let notional = size * entry_price;
        let margin_required = notional / Decimal::from(leverage.max(1));

        if self.balance < margin_required {
            return Err(AccountError::InsufficientMargin {
                required: margin_required,
                available: self.balance,
            });
        }

        let position = Position {
            symbol: symbol.clone(),
            side,
            size,
            entry_price,
            leverage,
            entry_time: timestamp,
            margin_used: margin_required,
            unrealized_pnl: Decimal::ZERO,
        };

        self.balance -= margin_required;
        self.total_fees += fee;
        debug!(%symbol, ?side, %size, %entry_price, %margin_required, "opened position");

        self.positions.insert(symbol.clone(), position);
        Ok(&self.positions[&symbol])
    }

    /// Add to an existing position, re-averaging the entry price over the old
    /// and new notionals and locking additional margin at the existing
    /// leverage.
    pub fn add_to_position(
        &mut self,
        symbol: &Symbol,
        size: Decimal,
        entry_price: Decimal,
        fee: Decimal,
    ) -> Result<&Position, AccountError> {
        if size <= Decimal::ZERO {
            return Err(AccountError::NonPositiveSize(size));
        }

        let position = self
            .positions
            .get_mut(symbol)
            .ok_or_else(|| AccountError::PositionNotFound(symbol.clone()))?;

        let old_notional = position.size * position.entry_price;
        let new_notional = size * entry_price;
        let total_size = position.size + size;

        let additional_margin = new_notional / Decimal::from(position.leverage.max(1));

        position.entry_price = (old_notional + new_notional) / total_size;
        position.size = total_size;
        position.margin_used += additional_margin;

        self.balance -= additional_margin;
        self.total_fees += fee;
        debug!(%symbol, %size, %entry_price, avg_entry = %self.positions[symbol].entry_price, "added to position");

        Ok(&self.positions[symbol])
    }

    /// Fully close a position, returning the realised PnL before fee
    /// deduction. Margin returns to the available balance and every pending
    /// order on the symbol is removed.
    pub fn close_position(
        &mut self,
        symbol: &Symbol,
        exit_price: Decimal,
        fee: Decimal,
    ) -> Result<Decimal, AccountError> {
        let mut position = self
            .positions
            .shift_remove(symbol)
            .ok_or_else(|| AccountError::PositionNotFound(symbol.clone()))?;

        let realized_pnl = position.update_pnl(exit_price);

        self.realized_pnl_total += realized_pnl;
        self.total_fees += fee;
        self.balance += position.margin_used;
        self.remove_orders_for(symbol);
        debug!(%symbol, %exit_price, %realized_pnl, "closed position");

        Ok(realized_pnl)
    }

    /// Close part of a position, attributing PnL to `entry_price_override`
    /// when provided (the tranche's own fill price), else to the position's
    /// weighted-average entry. Margin returns proportionally. A residual size
    /// at or below [`CLOSE_EPSILON`] collapses into a full close.
    pub fn partial_close_position(
        &mut self,
        symbol: &Symbol,
        size: Decimal,
        exit_price: Decimal,
        fee: Decimal,
        entry_price_override: Option<Decimal>,
    ) -> Result<Decimal, AccountError> {
        let position = self
            .positions
            .get_mut(symbol)
            .ok_or_else(|| AccountError::PositionNotFound(symbol.clone()))?;

        let close_size = size.min(position.size);
        if close_size <= Decimal::ZERO {
            return Err(AccountError::NonPositiveSize(close_size));
        }

        let entry = entry_price_override
            .filter(|price| *price > Decimal::ZERO)
            .unwrap_or(position.entry_price);

        let realized_pnl = match position.side {
            PositionSide::Long => (exit_price - entry) * close_size,
            PositionSide::Short => (entry - exit_price) * close_size,
        };

        self.realized_pnl_total += realized_pnl;
        self.total_fees += fee;

        let margin_to_return = (close_size / position.size) * position.margin_used;
        let remaining_size = position.size - close_size;

        if remaining_size <= CLOSE_EPSILON {
            self.balance += position.margin_used;
            self.positions.shift_remove(symbol);
            self.remove_orders_for(symbol);
        } else {
            position.margin_used -= margin_to_return;
            position.size = remaining_size;
            self.balance += margin_to_return;
        }
        debug!(%symbol, %close_size, %exit_price, %realized_pnl, "partially closed position");

        Ok(realized_pnl)
    }

    /// Register an independent reduce-only TP/SL order. Ids are monotonically
    /// increasing for the lifetime of the account.
    #[allow(clippy::too_many_arguments)]
    pub fn add_pending_order(
        &mut self,
        symbol: Symbol,
        side: OrderSide,
        kind: PendingOrderKind,
        trigger_price: Decimal,
        size: Decimal,
        entry_price: Decimal,
        timestamp: TimestampMs,
    ) -> u64 {
        self.order_id_counter += 1;
        self.pending_orders.push(PendingOrder {
            id: self.order_id_counter,
            symbol,
            side,
            kind,
            trigger_price,
            size,
            entry_price,
            created_at: timestamp,
        });
        self.order_id_counter
    }

    /// Remove a pending order by id. Idempotent.
    pub fn remove_pending_order(&mut self, order_id: u64) {
        self.pending_orders.retain(|order| order.id != order_id);
    }

    fn remove_orders_for(&mut self, symbol: &Symbol) {
        self.pending_orders.retain(|order| &order.symbol != symbol);
    }

    /// Re-mark every position at the provided prices and recompute equity and
    /// drawdown. Positions without a price keep their previous mark.
    pub fn mark_equity(&mut self, prices: &IndexMap<Symbol, Decimal>) {
        self.unrealized_pnl_total = Decimal::ZERO;
        for (symbol, position) in &mut self.positions {
            if let Some(price) = prices.get(symbol) {
                position.update_pnl(*price);
            }
            self.unrealized_pnl_total += position.unrealized_pnl;
        }

        self.equity = self.initial_balance + self.realized_pnl_total + self.unrealized_pnl_total
            - self.total_fees;

        self.drawdown.update(self.equity);
    }
}
