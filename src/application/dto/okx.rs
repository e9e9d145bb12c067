// src/application/dto/okx.rs
// OKX v5 REST response rows. Numeric fields arrive as strings and are
// converted in `parser`.

use serde::{Deserialize, Serialize};

/// Every v5 response is wrapped in `{code, msg, data}`; `code == "0"` is success
#[derive(Debug, Deserialize)]
pub struct OkxEnvelope<T> {
    pub code: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

impl<T> OkxEnvelope<T> {
    pub fn is_success(&self) -> bool {
        self.code == "0"
    }
}

#[derive(Debug, Deserialize)]
pub struct BalanceRow {
    #[serde(rename = "totalEq", default)]
    pub total_eq: String,
}

#[derive(Debug, Deserialize)]
pub struct PositionRow {
    #[serde(rename = "instId", default)]
    pub inst_id: String,
    #[serde(default)]
    pub pos: String,
    #[serde(rename = "notionalUsd", default)]
    pub notional_usd: String,
    #[serde(default)]
    pub lever: String,
    #[serde(default)]
    pub upl: String,
    #[serde(rename = "avgPx", default)]
    pub avg_px: String,
}

#[derive(Debug, Deserialize)]
pub struct OrderHistoryRow {
    #[serde(rename = "ordId", default)]
    pub ord_id: String,
    #[serde(rename = "instId", default)]
    pub inst_id: String,
    #[serde(default)]
    pub side: String,
    #[serde(default)]
    pub sz: String,
    #[serde(default)]
    pub state: String,
}

/// Per-order result inside a place-order response
#[derive(Debug, Deserialize)]
pub struct OrderAckRow {
    #[serde(rename = "ordId", default)]
    pub ord_id: String,
    #[serde(rename = "clOrdId", default)]
    pub cl_ord_id: String,
    #[serde(rename = "sCode", default)]
    pub s_code: String,
    #[serde(rename = "sMsg", default)]
    pub s_msg: String,
}

#[derive(Debug, Deserialize)]
pub struct BookRow {
    #[serde(default)]
    pub asks: Vec<Vec<String>>,
    #[serde(default)]
    pub bids: Vec<Vec<String>>,
    #[serde(default)]
    pub ts: String,
}

#[derive(Debug, Deserialize)]
pub struct FundingRow {
    #[serde(rename = "fundingRate", default)]
    pub funding_rate: String,
    #[serde(rename = "nextFundingTime", default)]
    pub next_funding_time: String,
}

#[derive(Debug, Deserialize)]
pub struct OpenInterestRow {
    #[serde(default)]
    pub oi: String,
}

#[derive(Debug, Deserialize)]
pub struct TradeRow {
    #[serde(rename = "tradeId", default)]
    pub trade_id: String,
    #[serde(default)]
    pub px: String,
    #[serde(default)]
    pub sz: String,
    #[serde(default)]
    pub side: String,
    #[serde(default)]
    pub ts: String,
}

#[derive(Debug, Serialize)]
pub struct SetLeverageBody<'a> {
    #[serde(rename = "instId")]
    pub inst_id: &'a str,
    pub lever: String,
    #[serde(rename = "mgnMode")]
    pub mgn_mode: &'a str,
}

#[derive(Debug, Serialize)]
pub struct PlaceOrderBody<'a> {
    #[serde(rename = "instId")]
    pub inst_id: &'a str,
    #[serde(rename = "tdMode")]
    pub td_mode: &'a str,
    pub side: &'a str,
    #[serde(rename = "posSide")]
    pub pos_side: &'a str,
    #[serde(rename = "ordType")]
    pub ord_type: String,
    pub sz: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub px: Option<String>,
}
