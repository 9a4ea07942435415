//! Weekly trigger for the export job.
//!
//! The fire-time arithmetic is a pure function so tests can pin it down; the
//! loop itself just sleeps until the next occurrence, runs the export, logs
//! the outcome, and goes back to sleep. Runs are strictly sequential, so at
//! most one run is ever in flight, and a failed run never unseats the loop.

use chrono::{DateTime, Datelike, Days, NaiveTime, TimeZone, Utc, Weekday};
use tracing::{error, info};

use crate::config::ScheduleConfig;
use crate::deliver::Deliverer;
use crate::export::run_export;
use crate::fetch::OrderSource;
use crate::mapping::MappingTable;
use crate::runlog::RunLog;

/// The first instant strictly after `now` that falls on `weekday` at
/// `hour:00:00` UTC. `hour` is validated to 0-23 at config load.
pub fn next_run_after(now: DateTime<Utc>, weekday: Weekday, hour: u32) -> DateTime<Utc> {
    let fire_time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
    let days_ahead =
        (weekday.num_days_from_monday() + 7 - now.weekday().num_days_from_monday()) % 7;
    let candidate = now
        .date_naive()
        .checked_add_days(Days::new(u64::from(days_ahead)))
        .unwrap_or_else(|| now.date_naive());
    let mut fire_at = Utc.from_utc_datetime(&candidate.and_time(fire_time));
    if fire_at <= now {
        fire_at = Utc.from_utc_datetime(
            &candidate
                .checked_add_days(Days::new(7))
                .unwrap_or(candidate)
                .and_time(fire_time),
        );
    }
    fire_at
}

/// Run the export on the configured weekly cadence, forever. Each run's
/// outcome is logged; failures do not stop the schedule.
pub async fn run_weekly<S, D>(
    schedule: &ScheduleConfig,
    table: &MappingTable,
    source: &S,
    deliverer: &D,
    runlog: &RunLog,
) where
    S: OrderSource + ?Sized,
    D: Deliverer + ?Sized,
{
    loop {
        let now = Utc::now();
        let fire_at = next_run_after(now, schedule.weekday, schedule.hour);
        let wait = (fire_at - now)
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);
        info!(fire_at = %fire_at, "Sleeping until next scheduled export");
        tokio::time::sleep(wait).await;

        match run_export(table, source, deliverer, runlog).await {
            Ok(report) => info!(
                orders = report.order_count,
                rows = report.row_count,
                "Scheduled export run succeeded"
            ),
            Err(e) => error!(error = %e, "Scheduled export run failed"),
        }
    }
}
