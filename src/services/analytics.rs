//! Analytics engine: windowed KPI snapshot and stock-out alert ranking over
//! the persisted store. Operates entirely on committed data; the validation
//! pipeline is not involved here.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Serialize;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::entities::{inventory_level, product, sale};
use crate::errors::ServiceError;

pub const DEFAULT_WINDOW_DAYS: i64 = 30;
pub const MAX_WINDOW_DAYS: i64 = 365;
pub const DEFAULT_ALERT_LIMIT: u64 = 25;
pub const MAX_ALERT_LIMIT: u64 = 200;

/// Point-in-time KPI snapshot for one sales window. Derived, never persisted.
#[derive(Debug, Serialize, ToSchema)]
pub struct KpiSnapshot {
    pub window_days: i64,
    pub revenue: f64,
    pub units: i64,
    pub gross_margin_pct: f64,
    pub low_stock_skus: usize,
    pub stockout_risk_skus: usize,
}

/// One ranked reorder alert.
#[derive(Debug, Serialize, ToSchema)]
pub struct AlertEntry {
    pub sku: String,
    pub name: String,
    pub issue: String,
    pub on_hand: i32,
    pub reorder_point: i32,
    pub lead_time_days: i32,
    pub avg_daily_units: f64,
    pub stockout_days: f64,
    pub action: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AlertList {
    pub window_days: i64,
    pub alerts: Vec<AlertEntry>,
}

/// Analytics service over the persisted store.
#[derive(Clone)]
pub struct AnalyticsService {
    db: Arc<DatabaseConnection>,
}

impl AnalyticsService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Computes the KPI snapshot for the trailing `days` window (inclusive of
    /// the cutoff day).
    #[instrument(skip(self))]
    pub async fn kpis(&self, days: i64) -> Result<KpiSnapshot, ServiceError> {
        check_window(days)?;
        let db = &*self.db;

        let cutoff = Utc::now().date_naive() - Duration::days(days);
        let windowed = sale::Entity::find()
            .filter(sale::Column::SoldOn.gte(cutoff))
            .all(db)
            .await?;

        let units: i64 = windowed.iter().map(|s| i64::from(s.units)).sum();
        let revenue: Decimal = windowed
            .iter()
            .map(|s| Decimal::from(s.units) * s.unit_price)
            .sum();

        // Margin joins to products by sku; sales without a product row drop
        // out of both sides of the ratio but still count in revenue above.
        let products = product::Entity::find().all(db).await?;
        let cost_by_sku: HashMap<&str, Decimal> =
            products.iter().map(|p| (p.sku.as_str(), p.cost)).collect();

        let mut joined_revenue = Decimal::ZERO;
        let mut joined_profit = Decimal::ZERO;
        for sale in &windowed {
            if let Some(cost) = cost_by_sku.get(sale.sku.as_str()) {
                let line_units = Decimal::from(sale.units);
                joined_revenue += line_units * sale.unit_price;
                joined_profit += line_units * (sale.unit_price - cost);
            }
        }
        let gross_margin_pct = if joined_revenue > Decimal::ZERO {
            let pct = joined_profit / joined_revenue * Decimal::from(100);
            round2(pct.to_f64().unwrap_or(0.0))
        } else {
            0.0
        };

        let inventory = inventory_level::Entity::find().all(db).await?;
        let low_stock_skus = inventory
            .iter()
            .filter(|i| i.on_hand <= i.reorder_point)
            .count();

        // A sku with no windowed sales has no measurable velocity; it is
        // omitted from the risk count rather than treated as zero risk.
        let velocity = velocity_by_sku(&windowed, days);
        let stockout_risk_skus = inventory
            .iter()
            .filter(|inv| match velocity.get(inv.sku.as_str()) {
                Some(&avg) if avg > 0.0 => {
                    f64::from(inv.on_hand) / avg <= f64::from(inv.lead_time_days)
                }
                _ => false,
            })
            .count();

        info!(
            window_days = days,
            units, low_stock_skus, stockout_risk_skus, "Computed KPI snapshot"
        );

        Ok(KpiSnapshot {
            window_days: days,
            revenue: revenue.to_f64().unwrap_or(0.0),
            units,
            gross_margin_pct,
            low_stock_skus,
            stockout_risk_skus,
        })
    }

    /// Ranks skus by projected days until stock-out and classifies the top
    /// `limit` of them.
    ///
    /// The truncation happens before classification, so the response may hold
    /// fewer than `limit` alerts even when more qualifying skus exist past
    /// the cutoff. That is the intended ranking policy, not an accident.
    #[instrument(skip(self))]
    pub async fn alerts(&self, days: i64, limit: u64) -> Result<AlertList, ServiceError> {
        check_window(days)?;
        check_limit(limit)?;
        let db = &*self.db;

        let cutoff = Utc::now().date_naive() - Duration::days(days);
        let windowed = sale::Entity::find()
            .filter(sale::Column::SoldOn.gte(cutoff))
            .all(db)
            .await?;
        let velocity = velocity_by_sku(&windowed, days);

        let inventory = inventory_level::Entity::find().all(db).await?;
        let products = product::Entity::find().all(db).await?;
        let name_by_sku: HashMap<&str, &str> = products
            .iter()
            .map(|p| (p.sku.as_str(), p.name.as_str()))
            .collect();

        struct Candidate<'a> {
            inv: &'a inventory_level::Model,
            name: &'a str,
            avg_daily_units: f64,
            stockout_days: f64,
        }

        let mut candidates: Vec<Candidate> = inventory
            .iter()
            .filter_map(|inv| {
                let avg = *velocity.get(inv.sku.as_str())?;
                if avg <= 0.0 {
                    return None;
                }
                let name = *name_by_sku.get(inv.sku.as_str())?;
                Some(Candidate {
                    inv,
                    name,
                    avg_daily_units: avg,
                    stockout_days: f64::from(inv.on_hand) / avg,
                })
            })
            .collect();

        candidates.sort_by(|a, b| {
            a.stockout_days
                .partial_cmp(&b.stockout_days)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.inv.sku.cmp(&b.inv.sku))
        });
        candidates.truncate(limit as usize);

        let mut alerts = Vec::new();
        for c in candidates {
            let lead = f64::from(c.inv.lead_time_days);
            let issue = if c.stockout_days <= lead {
                format!(
                    "Stockout risk in ~{:.1} days (lead {}d)",
                    c.stockout_days, c.inv.lead_time_days
                )
            } else if c.inv.on_hand <= c.inv.reorder_point {
                "Low stock (below reorder point)".to_string()
            } else {
                continue;
            };

            alerts.push(AlertEntry {
                sku: c.inv.sku.clone(),
                name: c.name.to_string(),
                issue,
                on_hand: c.inv.on_hand,
                reorder_point: c.inv.reorder_point,
                lead_time_days: c.inv.lead_time_days,
                avg_daily_units: c.avg_daily_units,
                stockout_days: round1(c.stockout_days),
                action: "Create PO".to_string(),
            });
        }

        info!(window_days = days, alerts = alerts.len(), "Ranked reorder alerts");

        Ok(AlertList {
            window_days: days,
            alerts,
        })
    }
}

fn check_window(days: i64) -> Result<(), ServiceError> {
    if !(1..=MAX_WINDOW_DAYS).contains(&days) {
        return Err(ServiceError::ValidationError(format!(
            "days must be between 1 and {}",
            MAX_WINDOW_DAYS
        )));
    }
    Ok(())
}

fn check_limit(limit: u64) -> Result<(), ServiceError> {
    if !(1..=MAX_ALERT_LIMIT).contains(&limit) {
        return Err(ServiceError::ValidationError(format!(
            "limit must be between 1 and {}",
            MAX_ALERT_LIMIT
        )));
    }
    Ok(())
}

/// Average daily units per sku over the window.
fn velocity_by_sku(windowed: &[sale::Model], days: i64) -> HashMap<&str, f64> {
    let mut units_by_sku: HashMap<&str, i64> = HashMap::new();
    for sale in windowed {
        *units_by_sku.entry(sale.sku.as_str()).or_insert(0) += i64::from(sale.units);
    }

    units_by_sku
        .into_iter()
        .map(|(sku, units)| (sku, units as f64 / days as f64))
        .collect()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn sale_row(sku: &str, units: i32) -> sale::Model {
        sale::Model {
            id: 0,
            sku: sku.to_string(),
            sold_on: NaiveDate::from_ymd_opt(2026, 7, 27).unwrap(),
            units,
            unit_price: dec!(10),
        }
    }

    #[test]
    fn velocity_sums_units_across_days_per_sku() {
        let sales = vec![sale_row("A1", 20), sale_row("A1", 10), sale_row("B2", 3)];
        let velocity = velocity_by_sku(&sales, 30);
        assert_eq!(velocity["A1"], 1.0);
        assert_eq!(velocity["B2"], 0.1);
    }

    #[test]
    fn rounding_helpers() {
        assert_eq!(round1(3.04), 3.0);
        assert_eq!(round1(3.06), 3.1);
        assert_eq!(round1(2.25), 2.3);
        assert_eq!(round2(33.333), 33.33);
        assert_eq!(round2(50.0), 50.0);
    }

    #[test]
    fn window_and_limit_bounds() {
        assert!(check_window(1).is_ok());
        assert!(check_window(365).is_ok());
        assert!(check_window(0).is_err());
        assert!(check_window(366).is_err());
        assert!(check_limit(1).is_ok());
        assert!(check_limit(200).is_ok());
        assert!(check_limit(0).is_err());
        assert!(check_limit(201).is_err());
    }
}
