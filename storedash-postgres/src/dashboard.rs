//! Dashboard queries: summary metrics, order/revenue series, customer
//! locations.
//!
//! Aggregates are cast to `float8`/`int8` in SQL and dates are selected as
//! text, so rows decode straight into the JSON the dashboard serves.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use tokio_postgres::types::FromSql;

use crate::error::{StoreError, StoreResult};
use crate::executor::StoreQuerier;
use crate::types::StoreId;

/// Rolling summary of a store over the last 30 days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_revenue: f64,
    pub total_orders: i64,
    pub average_order_value: f64,
    /// Revenue growth vs the previous 30-day period, in percent.
    pub revenue_growth: f64,
}

/// One day of order counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdersPoint {
    pub date: String,
    pub orders: i64,
}

/// One day of revenue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenuePoint {
    pub date: String,
    pub revenue: f64,
}

/// Customer orders aggregated by location over the last 90 days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerLocation {
    pub lat: f64,
    pub lng: f64,
    pub city: String,
    pub state: String,
    pub order_count: i64,
    pub total_revenue: f64,
}

/// The dashboard's read interface for one store.
#[async_trait]
pub trait Dashboard: Send + Sync {
    /// 30-day summary plus period-over-period revenue growth.
    async fn summary(&self, store: StoreId) -> StoreResult<AnalyticsSummary>;

    /// Daily order counts over the last 90 days, ascending by date.
    async fn orders_series(&self, store: StoreId) -> StoreResult<Vec<OrdersPoint>>;

    /// Daily revenue over the last 90 days, ascending by date.
    async fn revenue_series(&self, store: StoreId) -> StoreResult<Vec<RevenuePoint>>;

    /// Top customer locations by revenue over the last 90 days.
    async fn locations(&self, store: StoreId) -> StoreResult<Vec<CustomerLocation>>;
}

const SUMMARY_SQL: &str = "
    SELECT
        COALESCE(SUM(order_total), 0)::float8 AS total_revenue,
        COUNT(*)::int8 AS total_orders,
        COALESCE(AVG(order_total), 0)::float8 AS average_order_value
    FROM orders
    WHERE store_id = $1
      AND order_status = 'completed'
      AND order_date >= CURRENT_DATE - INTERVAL '30 days'
";

const GROWTH_SQL: &str = "
    WITH current_period AS (
        SELECT SUM(order_total) AS revenue
        FROM orders
        WHERE store_id = $1
          AND order_status = 'completed'
          AND order_date >= CURRENT_DATE - INTERVAL '30 days'
    ),
    previous_period AS (
        SELECT SUM(order_total) AS revenue
        FROM orders
        WHERE store_id = $1
          AND order_status = 'completed'
          AND order_date >= CURRENT_DATE - INTERVAL '60 days'
          AND order_date < CURRENT_DATE - INTERVAL '30 days'
    )
    SELECT COALESCE(
        (current_period.revenue - previous_period.revenue)
            / NULLIF(previous_period.revenue, 0) * 100,
        0
    )::float8 AS growth_percentage
    FROM current_period, previous_period
";

const ORDERS_SERIES_SQL: &str = "
    SELECT
        revenue_date::text AS date,
        order_count::int8 AS orders
    FROM daily_revenue
    WHERE store_id = $1
      AND revenue_date >= CURRENT_DATE - INTERVAL '90 days'
    ORDER BY revenue_date ASC
";

const REVENUE_SERIES_SQL: &str = "
    SELECT
        revenue_date::text AS date,
        total_revenue::float8 AS revenue
    FROM daily_revenue
    WHERE store_id = $1
      AND revenue_date >= CURRENT_DATE - INTERVAL '90 days'
    ORDER BY revenue_date ASC
";

const LOCATIONS_SQL: &str = "
    SELECT
        customer_lat::float8 AS lat,
        customer_lng::float8 AS lng,
        customer_city AS city,
        customer_state AS state,
        COUNT(*)::int8 AS order_count,
        SUM(order_total)::float8 AS total_revenue
    FROM orders
    WHERE store_id = $1
      AND order_status = 'completed'
      AND order_date >= CURRENT_DATE - INTERVAL '90 days'
    GROUP BY customer_lat, customer_lng, customer_city, customer_state
    ORDER BY total_revenue DESC
    LIMIT 100
";

/// Dashboard queries over a store querier.
pub struct DashboardService {
    querier: Arc<dyn StoreQuerier>,
}

impl DashboardService {
    /// Create a dashboard service.
    pub fn new(querier: Arc<dyn StoreQuerier>) -> Self {
        Self { querier }
    }
}

pub(crate) fn get<'a, T: FromSql<'a>>(row: &'a Row, column: &str) -> StoreResult<T> {
    row.try_get(column)
        .map_err(|e| StoreError::decode(format!("column {column}: {e}")))
}

#[async_trait]
impl Dashboard for DashboardService {
    async fn summary(&self, store: StoreId) -> StoreResult<AnalyticsSummary> {
        let id = store.get();

        let summary = self.querier.query(store, SUMMARY_SQL, &[&id]).await?;
        let growth = self.querier.query(store, GROWTH_SQL, &[&id]).await?;

        let row = summary
            .first()
            .ok_or_else(|| StoreError::decode("summary query returned no rows"))?;

        Ok(AnalyticsSummary {
            total_revenue: get(row, "total_revenue")?,
            total_orders: get(row, "total_orders")?,
            average_order_value: get(row, "average_order_value")?,
            revenue_growth: match growth.first() {
                Some(row) => get(row, "growth_percentage")?,
                None => 0.0,
            },
        })
    }

    async fn orders_series(&self, store: StoreId) -> StoreResult<Vec<OrdersPoint>> {
        let rows = self
            .querier
            .query(store, ORDERS_SERIES_SQL, &[&store.get()])
            .await?;

        rows.iter()
            .map(|row| {
                Ok(OrdersPoint {
                    date: get(row, "date")?,
                    orders: get(row, "orders")?,
                })
            })
            .collect()
    }

    async fn revenue_series(&self, store: StoreId) -> StoreResult<Vec<RevenuePoint>> {
        let rows = self
            .querier
            .query(store, REVENUE_SERIES_SQL, &[&store.get()])
            .await?;

        rows.iter()
            .map(|row| {
                Ok(RevenuePoint {
                    date: get(row, "date")?,
                    revenue: get(row, "revenue")?,
                })
            })
            .collect()
    }

    async fn locations(&self, store: StoreId) -> StoreResult<Vec<CustomerLocation>> {
        let rows = self
            .querier
            .query(store, LOCATIONS_SQL, &[&store.get()])
            .await?;

        rows.iter()
            .map(|row| {
                Ok(CustomerLocation {
                    lat: get(row, "lat")?,
                    lng: get(row, "lng")?,
                    city: get(row, "city")?,
                    state: get(row, "state")?,
                    order_count: get(row, "order_count")?,
                    total_revenue: get(row, "total_revenue")?,
                })
            })
            .collect()
    }
}
