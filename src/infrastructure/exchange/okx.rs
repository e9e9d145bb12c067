// src/infrastructure/exchange/okx.rs
// OKX v5 REST repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hyper::client::HttpConnector;
use hyper::{Body, Client, Method, Request, StatusCode};
use hyper_tls::HttpsConnector;
use rust_decimal::Decimal;

use super::signer::{timestamp, RequestSigner};
use crate::application::dto::okx::{
    BalanceRow, BookRow, FundingRow, OpenInterestRow, OrderAckRow, OrderHistoryRow,
    PlaceOrderBody, PositionRow, SetLeverageBody, TradeRow,
};
use crate::application::dto::parser::*;
use crate::config::ExchangeConfig;
use crate::domain::errors::{ExchangeError, ExchangeResult};
use crate::domain::model::{
    Candle, FundingRate, MarginMode, OrderAck, OrderBook, OrderRecord, OrderRequest, OrderType,
    Position, Timeframe, TradePrint,
};
use crate::domain::repository::{AccountRepository, MarketDataRepository, TradingRepository};

pub struct OkxClient {
    http: Client<HttpsConnector<HttpConnector>>,
    base_url: String,
    api_key: String,
    passphrase: String,
    signer: RequestSigner,
    simulated: bool,
}

impl OkxClient {
    pub fn new(config: &ExchangeConfig) -> Self {
        let https = HttpsConnector::new();
        Self {
            http: Client::builder().build::<_, Body>(https),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            passphrase: config.passphrase.clone(),
            signer: RequestSigner::new(config.secret_key.clone()),
            simulated: config.simulated,
        }
    }

    /// Private endpoints carry the four OK-ACCESS headers
    fn build_request(
        &self,
        method: Method,
        path: &str,
        body: String,
        signed: bool,
        now: DateTime<Utc>,
    ) -> ExchangeResult<Request<Body>> {
        let mut builder = Request::builder()
            .method(method.clone())
            .uri(format!("{}{}", self.base_url, path))
            .header("Content-Type", "application/json");

        if signed {
            let ts = timestamp(now);
            let signature = self.signer.sign(&ts, method.as_str(), path, &body)?;
            builder = builder
                .header("OK-ACCESS-KEY", self.api_key.as_str())
                .header("OK-ACCESS-SIGN", signature)
                .header("OK-ACCESS-TIMESTAMP", ts)
                .header("OK-ACCESS-PASSPHRASE", self.passphrase.as_str());
        }
        if self.simulated {
            builder = builder.header("x-simulated-trading", "1");
        }

        builder
            .body(Body::from(body))
            .map_err(|e| ExchangeError::Request(format!("{}", e)))
    }

    async fn send(&self, method: Method, path: &str, body: String, signed: bool) -> ExchangeResult<String> {
        let request = self.build_request(method, path, body, signed, Utc::now())?;

        let response = self
            .http
            .request(request)
            .await
            .map_err(|e| ExchangeError::Connection(format!("{}", e)))?;

        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body())
            .await
            .map_err(|e| ExchangeError::Connection(format!("{}", e)))?;
        let text = String::from_utf8_lossy(&bytes).to_string();

        if status.is_success() {
            return Ok(text);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ExchangeError::RateLimit(text));
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(ExchangeError::Authentication(text));
        }

        // Error bodies usually still carry the v5 envelope
        if let Err(api @ ExchangeError::Api { .. }) = parse_envelope::<serde_json::Value>(&text) {
            return Err(api);
        }
        Err(ExchangeError::Request(format!("HTTP {}: {}", status, text)))
    }

    async fn get<T>(&self, path: &str, signed: bool) -> ExchangeResult<Vec<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let body = self.send(Method::GET, path, String::new(), signed).await?;
        parse_envelope(&body)
    }

    async fn post<B, T>(&self, path: &str, payload: &B) -> ExchangeResult<Vec<T>>
    where
        B: serde::Serialize + Sync,
        T: serde::de::DeserializeOwned,
    {
        let body = serde_json::to_string(payload)
            .map_err(|e| ExchangeError::Request(format!("failed to encode body: {}", e)))?;
        let response = self.send(Method::POST, path, body, true).await?;
        parse_envelope(&response)
    }
}

fn first<T>(rows: Vec<T>, what: &str) -> ExchangeResult<T> {
    rows.into_iter()
        .next()
        .ok_or_else(|| ExchangeError::EmptyResponse(format!("{} returned no data", what)))
}

#[async_trait]
impl MarketDataRepository for OkxClient {
    async fn get_candles(
        &self,
        inst_id: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> ExchangeResult<Vec<Candle>> {
        let path = format!(
            "/api/v5/market/candles?instId={}&bar={}&limit={}",
            inst_id,
            timeframe.as_str(),
            limit
        );
        let rows: Vec<Vec<String>> = self.get(&path, false).await?;
        candles_from_rows(&rows)
    }

    async fn get_order_book(&self, inst_id: &str, depth: usize) -> ExchangeResult<OrderBook> {
        let path = format!("/api/v5/market/books?instId={}&sz={}", inst_id, depth);
        let rows: Vec<BookRow> = self.get(&path, false).await?;
        order_book_from_row(&first(rows, "order book")?)
    }

    async fn get_funding_rate(&self, inst_id: &str) -> ExchangeResult<FundingRate> {
        let path = format!("/api/v5/public/funding-rate?instId={}", inst_id);
        let rows: Vec<FundingRow> = self.get(&path, false).await?;
        funding_from_row(&first(rows, "funding rate")?)
    }

    async fn get_open_interest(&self, inst_id: &str) -> ExchangeResult<Decimal> {
        let path = format!(
            "/api/v5/public/open-interest?instType=SWAP&instId={}",
            inst_id
        );
        let rows: Vec<OpenInterestRow> = self.get(&path, false).await?;
        parse_decimal(&first(rows, "open interest")?.oi, "oi")
    }

    async fn get_recent_trades(&self, inst_id: &str, limit: usize) -> ExchangeResult<Vec<TradePrint>> {
        let path = format!("/api/v5/market/trades?instId={}&limit={}", inst_id, limit);
        let rows: Vec<TradeRow> = self.get(&path, false).await?;
        rows.iter().map(trade_from_row).collect()
    }
}

#[async_trait]
impl AccountRepository for OkxClient {
    async fn get_total_equity(&self) -> ExchangeResult<Decimal> {
        let rows: Vec<BalanceRow> = self.get("/api/v5/account/balance", true).await?;
        parse_decimal(&first(rows, "account balance")?.total_eq, "totalEq")
    }

    async fn get_positions(&self) -> ExchangeResult<Vec<Position>> {
        let rows: Vec<PositionRow> = self
            .get("/api/v5/account/positions?instType=SWAP", true)
            .await?;
        rows.iter().map(position_from_row).collect()
    }

    async fn get_order_history(&self) -> ExchangeResult<Vec<OrderRecord>> {
        let rows: Vec<OrderHistoryRow> = self
            .get("/api/v5/trade/orders-history?instType=SWAP", true)
            .await?;
        rows.iter().map(order_record_from_row).collect()
    }
}

#[async_trait]
impl TradingRepository for OkxClient {
    async fn set_leverage(&self, inst_id: &str, leverage: u32, mode: MarginMode) -> ExchangeResult<()> {
        let body = SetLeverageBody {
            inst_id,
            lever: leverage.to_string(),
            mgn_mode: mode.as_str(),
        };
        let _: Vec<serde_json::Value> = self.post("/api/v5/account/set-leverage", &body).await?;
        log::debug!("OKX: leverage {}x set on {} ({})", leverage, inst_id, mode.as_str());
        Ok(())
    }

    async fn place_order(&self, order: &OrderRequest) -> ExchangeResult<OrderAck> {
        let px = match &order.order_type {
            OrderType::Market => None,
            OrderType::Limit(price) => Some(price.normalize().to_string()),
        };
        let body = PlaceOrderBody {
            inst_id: &order.inst_id,
            td_mode: order.margin_mode.as_str(),
            side: order.side.as_str(),
            pos_side: order.position_side.as_str(),
            ord_type: order.order_type.to_string(),
            sz: order.size.normalize().to_string(),
            px,
        };
        let rows: Vec<OrderAckRow> = self.post("/api/v5/trade/order", &body).await?;
        order_ack_from_rows(rows)
    }
}
