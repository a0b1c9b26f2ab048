//! Ride statistics aggregated per user.

use serde::Serialize;
use uuid::Uuid;

use super::ride::{Ride, RideStatus};

const ALL_STATUSES: [RideStatus; 3] = [
    RideStatus::Active,
    RideStatus::Completed,
    RideStatus::Cancelled,
];

/// Count and revenue for rides in one status.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBucket {
    pub status: RideStatus,
    pub count: usize,
    pub total_revenue: f64,
}

/// A driver's finished rides grouped by outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverRideStats {
    pub stats: Vec<StatusBucket>,
    pub total_rides: usize,
    pub active_rides: usize,
}

/// Profile-level summary across both roles.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub driver_stats: Vec<StatusBucket>,
    pub passenger_stats: Vec<StatusBucket>,
    pub total_driver_rides: usize,
    pub total_passenger_rides: usize,
}

/// Group rides by status, skipping empty buckets.
pub fn group_by_status<'a, I>(rides: I, statuses: &[RideStatus]) -> Vec<StatusBucket>
where
    I: IntoIterator<Item = &'a Ride> + Clone,
{
    statuses
        .iter()
        .filter_map(|status| {
            let (count, total_revenue) = rides
                .clone()
                .into_iter()
                .filter(|r| r.status == *status)
                .fold((0usize, 0.0f64), |(n, rev), r| (n + 1, rev + r.total_revenue()));
            (count > 0).then_some(StatusBucket {
                status: *status,
                count,
                total_revenue,
            })
        })
        .collect()
}

impl DriverRideStats {
    /// `rides` must be the rides driven by one driver.
    pub fn from_rides(rides: &[Ride]) -> Self {
        Self {
            stats: group_by_status(rides, &[RideStatus::Completed, RideStatus::Cancelled]),
            total_rides: rides.len(),
            active_rides: rides
                .iter()
                .filter(|r| r.status == RideStatus::Active)
                .count(),
        }
    }
}

impl UserStats {
    pub fn collect(user_id: Uuid, driven: &[Ride], joined: &[Ride]) -> Self {
        let passenger_stats = group_by_status(joined, &ALL_STATUSES)
            .into_iter()
            .map(|bucket| {
                // A passenger's spend is their own seats, not the ride total.
                let spent = joined
                    .iter()
                    .filter(|r| r.status == bucket.status)
                    .filter_map(|r| r.booking_for(user_id).map(|b| f64::from(b.seats) * r.price))
                    .sum();
                StatusBucket {
                    total_revenue: spent,
                    ..bucket
                }
            })
            .collect();

        Self {
            driver_stats: group_by_status(driven, &ALL_STATUSES),
            passenger_stats,
            total_driver_rides: driven.len(),
            total_passenger_rides: joined.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ride::NewRide;
    use chrono::Utc;

    fn ride(driver: Uuid, price: f64) -> Ride {
        Ride::new(
            driver,
            NewRide {
                start_location: "Bahir Dar".into(),
                destination: "Gondar".into(),
                date: Utc::now(),
                time: "07:00".into(),
                eta_hours: 3.0,
                available_seats: 4,
                price,
                description: None,
                vehicle: None,
                pickup_points: Vec::new(),
                restrictions: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_driver_stats_group_terminal_rides() {
        let driver = Uuid::new_v4();
        let passenger = Uuid::new_v4();

        let mut done = ride(driver, 100.0);
        done.book(passenger, 2, Utc::now()).unwrap();
        done.transition(RideStatus::Completed).unwrap();

        let mut dropped = ride(driver, 50.0);
        dropped.transition(RideStatus::Cancelled).unwrap();

        let open = ride(driver, 10.0);

        let stats = DriverRideStats::from_rides(&[done, dropped, open]);
        assert_eq!(stats.total_rides, 3);
        assert_eq!(stats.active_rides, 1);
        assert_eq!(
            stats.stats,
            vec![
                StatusBucket {
                    status: RideStatus::Completed,
                    count: 1,
                    total_revenue: 200.0
                },
                StatusBucket {
                    status: RideStatus::Cancelled,
                    count: 1,
                    total_revenue: 0.0
                },
            ]
        );
    }

    #[test]
    fn test_user_stats_counts_own_seats_as_passenger() {
        let driver = Uuid::new_v4();
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();

        let mut shared = ride(driver, 30.0);
        shared.book(me, 1, Utc::now()).unwrap();
        shared.book(other, 3, Utc::now()).unwrap();

        let stats = UserStats::collect(me, &[], &[shared]);
        assert_eq!(stats.total_passenger_rides, 1);
        assert_eq!(stats.passenger_stats.len(), 1);
        assert_eq!(stats.passenger_stats[0].total_revenue, 30.0);
        assert!(stats.driver_stats.is_empty());
    }
}
