// src/application/dto/parser.rs
// Parsers from OKX rows into domain models

use rust_decimal::Decimal;
use std::str::FromStr;

use super::okx::{
    BookRow, FundingRow, OkxEnvelope, OrderAckRow, OrderHistoryRow, PositionRow, TradeRow,
};
use crate::domain::errors::{ExchangeError, ExchangeResult};
use crate::domain::model::{
    BookLevel, Candle, FundingRate, OrderAck, OrderBook, OrderRecord, Position, TradePrint,
    TradeSide,
};

/// Unwrap a v5 envelope, turning a non-zero code into an API error
pub fn parse_envelope<T>(body: &str) -> ExchangeResult<Vec<T>>
where
    T: serde::de::DeserializeOwned,
{
    let envelope: OkxEnvelope<T> = serde_json::from_str(body)
        .map_err(|e| ExchangeError::Parse(format!("invalid envelope: {}", e)))?;

    if !envelope.is_success() {
        return Err(ExchangeError::Api {
            code: envelope.code,
            message: envelope.msg,
        });
    }

    Ok(envelope.data)
}

pub fn parse_decimal(value: &str, field: &str) -> ExchangeResult<Decimal> {
    Decimal::from_str(value.trim())
        .or_else(|_| Decimal::from_scientific(value.trim()))
        .map_err(|e| ExchangeError::Parse(format!("invalid {} '{}': {}", field, value, e)))
}

/// Empty strings mean "not applicable" on OKX
pub fn parse_optional_decimal(value: &str, field: &str) -> ExchangeResult<Option<Decimal>> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse_decimal(value, field).map(Some)
}

fn parse_millis(value: &str, field: &str) -> ExchangeResult<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|e| ExchangeError::Parse(format!("invalid {} '{}': {}", field, value, e)))
}

/// `[ts, o, h, l, c, vol, volCcy, volCcyQuote, confirm]`
pub fn candle_from_row(row: &[String]) -> ExchangeResult<Candle> {
    if row.len() < 6 {
        return Err(ExchangeError::Parse(format!(
            "Invalid candle length: expected at least 6 elements, got {}",
            row.len()
        )));
    }

    Ok(Candle {
        open_time: parse_millis(&row[0], "open_time")?,
        open: parse_decimal(&row[1], "open")?,
        high: parse_decimal(&row[2], "high")?,
        low: parse_decimal(&row[3], "low")?,
        close: parse_decimal(&row[4], "close")?,
        volume: parse_decimal(&row[5], "volume")?,
    })
}

/// Candles arrive newest first; the snapshot keeps them oldest first
pub fn candles_from_rows(rows: &[Vec<String>]) -> ExchangeResult<Vec<Candle>> {
    let mut candles = rows
        .iter()
        .map(|row| candle_from_row(row))
        .collect::<ExchangeResult<Vec<_>>>()?;
    candles.reverse();
    Ok(candles)
}

fn level_from_row(row: &[String]) -> ExchangeResult<BookLevel> {
    if row.len() < 2 {
        return Err(ExchangeError::Parse(format!(
            "Invalid book level length: {}",
            row.len()
        )));
    }
    Ok(BookLevel {
        price: parse_decimal(&row[0], "price")?,
        size: parse_decimal(&row[1], "size")?,
    })
}

pub fn order_book_from_row(row: &BookRow) -> ExchangeResult<OrderBook> {
    let bids = row
        .bids
        .iter()
        .map(|l| level_from_row(l))
        .collect::<ExchangeResult<Vec<_>>>()?;
    let asks = row
        .asks
        .iter()
        .map(|l| level_from_row(l))
        .collect::<ExchangeResult<Vec<_>>>()?;

    Ok(OrderBook {
        bids,
        asks,
        timestamp: row.ts.trim().parse().ok(),
    })
}

pub fn funding_from_row(row: &FundingRow) -> ExchangeResult<FundingRate> {
    Ok(FundingRate {
        rate: parse_decimal(&row.funding_rate, "fundingRate")?,
        next_funding_time: row.next_funding_time.trim().parse().ok(),
    })
}

pub fn trade_from_row(row: &TradeRow) -> ExchangeResult<TradePrint> {
    let side = match row.side.as_str() {
        "buy" => TradeSide::Buy,
        "sell" => TradeSide::Sell,
        other => return Err(ExchangeError::Parse(format!("unknown trade side '{}'", other))),
    };

    Ok(TradePrint {
        trade_id: row.trade_id.clone(),
        price: parse_decimal(&row.px, "px")?,
        size: parse_decimal(&row.sz, "sz")?,
        side,
        timestamp: parse_millis(&row.ts, "ts")?,
    })
}

pub fn position_from_row(row: &PositionRow) -> ExchangeResult<Position> {
    Ok(Position {
        inst_id: row.inst_id.clone(),
        size: parse_optional_decimal(&row.pos, "pos")?.unwrap_or_default(),
        notional_usd: parse_optional_decimal(&row.notional_usd, "notionalUsd")?.unwrap_or_default(),
        leverage: parse_optional_decimal(&row.lever, "lever")?,
        unrealized_pnl: parse_optional_decimal(&row.upl, "upl")?.unwrap_or_default(),
        average_price: parse_optional_decimal(&row.avg_px, "avgPx")?,
    })
}

pub fn order_record_from_row(row: &OrderHistoryRow) -> ExchangeResult<OrderRecord> {
    Ok(OrderRecord {
        order_id: row.ord_id.clone(),
        inst_id: row.inst_id.clone(),
        side: row.side.clone(),
        size: parse_optional_decimal(&row.sz, "sz")?.unwrap_or_default(),
        state: row.state.clone(),
    })
}

/// A place-order envelope can succeed while the order itself is rejected
/// (`sCode != "0"`)
pub fn order_ack_from_rows(rows: Vec<OrderAckRow>) -> ExchangeResult<OrderAck> {
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| ExchangeError::EmptyResponse("place order returned no data".to_string()))?;

    if !row.s_code.is_empty() && row.s_code != "0" {
        return Err(ExchangeError::Api {
            code: row.s_code,
            message: row.s_msg,
        });
    }
    if row.ord_id.is_empty() {
        return Err(ExchangeError::EmptyResponse("order id missing".to_string()));
    }

    Ok(OrderAck {
        order_id: row.ord_id,
        client_order_id: (!row.cl_ord_id.is_empty()).then_some(row.cl_ord_id),
    })
}
