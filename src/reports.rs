// ABOUTME: Pure aggregation over order and ticket records for the admin dashboard and analytics
// ABOUTME: Aggregation is total over its input; the loaders add the authorization gate and storage reads

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::authz::{self, Action, Actor, Scope, Target};
use crate::entities::{order, OrderStatus};
use crate::error::Result;
use crate::orders::{self, OrderWithOwner};
use crate::storage::Storage;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "Mei", "Jun", "Jul", "Agu", "Sep", "Okt", "Nov", "Des",
];

pub const ANALYTICS_WINDOW_DAYS: i64 = 30;
pub const ANALYTICS_MONTHS: u32 = 6;
pub const RECENT_ORDERS: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub active: u64,
    pub rejected: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyBucket {
    pub month: String,
    pub label: &'static str,
    pub revenue: i64,
    pub order_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageCount {
    pub package_name: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    pub total_revenue: i64,
    pub monthly_revenue: i64,
    pub total_orders: u64,
    pub total_users: u64,
    pub monthly: Vec<MonthlyBucket>,
    pub packages: Vec<PackageCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub total_users: u64,
    pub pending_orders: u64,
    pub active_orders: u64,
    pub open_tickets: u64,
    pub total_revenue: i64,
    pub recent_orders: Vec<OrderWithOwner>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UserOrderSummary {
    pub total: u64,
    pub pending: u64,
    pub active: u64,
}

fn is_active(order: &order::Model) -> bool {
    order.status == OrderStatus::Active
}

pub fn count_by_status(orders: &[order::Model]) -> StatusCounts {
    orders.iter().fold(StatusCounts::default(), |mut counts, order| {
        match order.status {
            OrderStatus::Pending => counts.pending += 1,
            OrderStatus::Active => counts.active += 1,
            OrderStatus::Rejected => counts.rejected += 1,
        }
        counts
    })
}

/// Sum of `package_price` over active orders.
pub fn total_revenue(orders: &[order::Model]) -> i64 {
    orders
        .iter()
        .filter(|order| is_active(order))
        .map(|order| order.package_price)
        .sum()
}

/// Active revenue created within the last `window_days` before `now`.
pub fn monthly_revenue(orders: &[order::Model], window_days: i64, now: DateTime<Utc>) -> i64 {
    let cutoff = (now - Duration::days(window_days)).timestamp();
    orders
        .iter()
        .filter(|order| is_active(order) && order.created_at >= cutoff)
        .map(|order| order.package_price)
        .sum()
}

/// Months since year 0, so calendar arithmetic stays in integers.
fn month_index(year: i32, month0: u32) -> i64 {
    i64::from(year) * 12 + i64::from(month0)
}

fn order_month_index(order: &order::Model) -> Option<i64> {
    let created = DateTime::<Utc>::from_timestamp(order.created_at, 0)?;
    Some(month_index(created.year(), created.month0()))
}

/// Active orders grouped per UTC calendar month, covering the `months_back`
/// months that end with `now`'s month. Oldest first; empty months are zero.
pub fn monthly_buckets(
    orders: &[order::Model],
    months_back: u32,
    now: DateTime<Utc>,
) -> Vec<MonthlyBucket> {
    let current = month_index(now.year(), now.month0());
    let first = current - i64::from(months_back) + 1;

    let mut buckets: Vec<MonthlyBucket> = (first..=current)
        .map(|index| {
            let year = index.div_euclid(12);
            let month0 = index.rem_euclid(12) as usize;
            MonthlyBucket {
                month: format!("{:04}-{:02}", year, month0 + 1),
                label: MONTH_LABELS[month0],
                revenue: 0,
                order_count: 0,
            }
        })
        .collect();

    for order in orders.iter().filter(|order| is_active(order)) {
        let Some(index) = order_month_index(order) else {
            continue;
        };
        if index < first || index > current {
            continue;
        }
        let bucket = &mut buckets[(index - first) as usize];
        bucket.revenue += order.package_price;
        bucket.order_count += 1;
    }

    buckets
}

/// Order counts per package across every status, most popular first.
pub fn package_distribution(orders: &[order::Model]) -> Vec<PackageCount> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for order in orders {
        *counts.entry(order.package_name.as_str()).or_default() += 1;
    }

    let mut distribution: Vec<PackageCount> = counts
        .into_iter()
        .map(|(name, count)| PackageCount {
            package_name: name.to_string(),
            count,
        })
        .collect();
    distribution.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.package_name.cmp(&b.package_name))
    });
    distribution
}

pub fn analytics_summary(
    orders: &[order::Model],
    total_users: u64,
    now: DateTime<Utc>,
) -> AnalyticsSummary {
    AnalyticsSummary {
        total_revenue: total_revenue(orders),
        monthly_revenue: monthly_revenue(orders, ANALYTICS_WINDOW_DAYS, now),
        total_orders: orders.len() as u64,
        total_users,
        monthly: monthly_buckets(orders, ANALYTICS_MONTHS, now),
        packages: package_distribution(orders),
    }
}

/// `orders_with_owner` is expected newest first, as storage returns it.
pub fn dashboard_summary(
    orders_with_owner: Vec<OrderWithOwner>,
    total_users: u64,
    open_tickets: u64,
) -> DashboardSummary {
    let orders: Vec<order::Model> = orders_with_owner
        .iter()
        .map(|row| row.order.clone())
        .collect();
    let counts = count_by_status(&orders);

    DashboardSummary {
        total_users,
        pending_orders: counts.pending,
        active_orders: counts.active,
        open_tickets,
        total_revenue: total_revenue(&orders),
        recent_orders: orders_with_owner.into_iter().take(RECENT_ORDERS).collect(),
    }
}

pub fn user_order_summary(own_orders: &[order::Model]) -> UserOrderSummary {
    let counts = count_by_status(own_orders);
    UserOrderSummary {
        total: own_orders.len() as u64,
        pending: counts.pending,
        active: counts.active,
    }
}

pub async fn load_user_dashboard(storage: &Storage, actor: &Actor) -> Result<UserOrderSummary> {
    let own = orders::list_orders(storage, actor, Scope::Own).await?;
    Ok(user_order_summary(&own))
}

pub async fn load_admin_dashboard(storage: &Storage, actor: &Actor) -> Result<DashboardSummary> {
    authz::authorize(actor, Action::ViewDashboard, &Target::none()).into_result()?;

    let rows = orders::list_orders_with_owner(storage, actor).await?;
    let total_users = storage.count_profiles().await?;
    let open_tickets = storage.count_open_tickets().await?;
    Ok(dashboard_summary(rows, total_users, open_tickets))
}

pub async fn load_analytics(
    storage: &Storage,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<AnalyticsSummary> {
    authz::authorize(actor, Action::ViewAnalytics, &Target::none()).into_result()?;

    let all = storage.list_all_orders().await?;
    let total_users = storage.count_profiles().await?;
    Ok(analytics_summary(&all, total_users, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn order_at(package: &str, price: i64, status: OrderStatus, at: DateTime<Utc>) -> order::Model {
        order::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            package_name: package.to_string(),
            package_price: price,
            domain_name: "example.com".to_string(),
            payment_proof: Some("proof.png".to_string()),
            status,
            created_at: at.timestamp(),
            updated_at: at.timestamp(),
        }
    }

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn empty_input_is_all_zeros() {
        let now = utc(2025, 3, 15);
        assert_eq!(count_by_status(&[]), StatusCounts::default());
        assert_eq!(total_revenue(&[]), 0);
        assert_eq!(monthly_revenue(&[], 30, now), 0);
        assert!(package_distribution(&[]).is_empty());

        let buckets = monthly_buckets(&[], 3, now);
        assert_eq!(buckets.len(), 3);
        assert!(buckets.iter().all(|b| b.revenue == 0 && b.order_count == 0));
    }

    #[test]
    fn revenue_counts_only_active_orders() {
        let now = utc(2025, 3, 15);
        let orders = vec![
            order_at("Pelajar Basic", 15_000, OrderStatus::Active, now),
            order_at("Pelajar Pro", 50_000, OrderStatus::Pending, now),
            order_at("Personal Pro", 300_000, OrderStatus::Rejected, now),
        ];

        assert_eq!(total_revenue(&orders), 15_000);
        assert_eq!(
            count_by_status(&orders),
            StatusCounts {
                pending: 1,
                active: 1,
                rejected: 1
            }
        );
    }

    #[test]
    fn monthly_revenue_respects_window() {
        let now = utc(2025, 3, 31);
        let orders = vec![
            order_at("Pelajar Basic", 15_000, OrderStatus::Active, utc(2025, 3, 20)),
            order_at("Pelajar Pro", 50_000, OrderStatus::Active, utc(2025, 1, 5)),
        ];

        assert_eq!(monthly_revenue(&orders, 30, now), 15_000);
        assert_eq!(monthly_revenue(&orders, 365, now), 65_000);
    }

    #[test]
    fn single_month_bucket_sums_active_orders() {
        let now = utc(2025, 3, 28);
        let orders = vec![
            order_at("Pelajar Pemula", 10_000, OrderStatus::Active, utc(2025, 3, 2)),
            order_at("Pelajar Basic", 20_000, OrderStatus::Active, utc(2025, 3, 10)),
            order_at("Pelajar Pemula", 5_000, OrderStatus::Active, utc(2025, 3, 27)),
        ];

        let buckets = monthly_buckets(&orders, 1, now);
        assert_eq!(
            buckets,
            vec![MonthlyBucket {
                month: "2025-03".to_string(),
                label: "Mar",
                revenue: 35_000,
                order_count: 3,
            }]
        );
    }

    #[test]
    fn buckets_cross_year_boundary_oldest_first() {
        let now = utc(2025, 2, 10);
        let orders = vec![
            order_at("Pelajar Basic", 15_000, OrderStatus::Active, utc(2024, 12, 1)),
            order_at("Pelajar Basic", 15_000, OrderStatus::Active, utc(2024, 6, 1)),
            order_at("Pelajar Pro", 50_000, OrderStatus::Pending, utc(2025, 1, 1)),
        ];

        let buckets = monthly_buckets(&orders, 4, now);
        let months: Vec<&str> = buckets.iter().map(|b| b.month.as_str()).collect();
        assert_eq!(months, ["2024-11", "2024-12", "2025-01", "2025-02"]);
        assert_eq!(buckets[1].label, "Des");
        assert_eq!(buckets[1].revenue, 15_000);
        assert_eq!(buckets[2].order_count, 0);
    }

    #[test]
    fn distribution_sorted_by_count_then_name() {
        let now = utc(2025, 3, 1);
        let orders = vec![
            order_at("Pelajar Pro", 50_000, OrderStatus::Active, now),
            order_at("Pelajar Basic", 15_000, OrderStatus::Pending, now),
            order_at("Pelajar Pro", 50_000, OrderStatus::Rejected, now),
            order_at("Pelajar Advance", 25_000, OrderStatus::Active, now),
        ];

        let distribution = package_distribution(&orders);
        let names: Vec<&str> = distribution
            .iter()
            .map(|p| p.package_name.as_str())
            .collect();
        assert_eq!(names, ["Pelajar Pro", "Pelajar Advance", "Pelajar Basic"]);
        assert_eq!(
            distribution.iter().map(|p| p.count).sum::<u64>(),
            orders.len() as u64
        );
    }

    #[test]
    fn dashboard_keeps_five_most_recent() {
        let now = utc(2025, 3, 1);
        let rows: Vec<OrderWithOwner> = (0..7)
            .map(|i| OrderWithOwner {
                order: order_at(
                    "Pelajar Basic",
                    15_000,
                    if i % 2 == 0 {
                        OrderStatus::Active
                    } else {
                        OrderStatus::Pending
                    },
                    now,
                ),
                username: format!("user{}", i),
                email: "N/A".to_string(),
            })
            .collect();

        let summary = dashboard_summary(rows, 9, 2);
        assert_eq!(summary.recent_orders.len(), 5);
        assert_eq!(summary.recent_orders[0].username, "user0");
        assert_eq!(summary.active_orders, 4);
        assert_eq!(summary.pending_orders, 3);
        assert_eq!(summary.total_revenue, 60_000);
        assert_eq!(summary.open_tickets, 2);
    }
}
