//! Record command: the kiosk's capture path.
//!
//! The operator weighs a batch, picks the station and category, and this
//! appends one timestamped row to the shared log. For chopsticks the derived
//! metrics are estimated here, at capture time, so the log carries them the
//! way the dashboards expect.

use crate::api::Mode;
use crate::args::RecordArgs;
use crate::commands::Out;
use crate::model::{Category, Kilograms, Reading};
use crate::{api, Config, Result};
use chrono::Local;
use rust_decimal::Decimal;
use tracing::info;

/// Sums the per-load-cell channel weights into one reading, derives the
/// chopsticks metrics when applicable, and appends the row to the log.
pub async fn record(config: Config, mode: Mode, args: RecordArgs) -> Result<Out<Reading>> {
    // The scale reports one weight per load cell; the reading is their sum.
    let total: Decimal = args.channels().iter().map(|c| c.value()).sum();
    let weight = Kilograms::new(total).rounded();
    info!("Measured weight: {weight} kg");

    let category = Category::new(args.category());
    let (co2, count) = if category.is_chopsticks() {
        let estimate = config.calibration().estimate(weight);
        info!(
            "Estimated CO2 reduction {} kg for {} pair",
            estimate.co2.rounded(),
            estimate.count
        );
        (estimate.co2.rounded(), estimate.count)
    } else {
        (Kilograms::default(), 0)
    };

    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let reading = Reading::new(
        timestamp,
        args.station(),
        category.sheet_label(),
        weight.to_string(),
        co2.to_string(),
        count.to_string(),
    );

    let mut station = api::station(&config, mode).await?;
    station.append_reading(&reading).await?;

    Ok(Out::new(
        format!(
            "Recorded {weight} kg of {} from {}",
            category.sheet_label(),
            args.station()
        ),
        reading,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use std::str::FromStr;

    fn kg(s: &str) -> Kilograms {
        Kilograms::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn test_record_chopsticks_derives_metrics() {
        let env = TestEnv::new().await;
        let args = RecordArgs::new(
            "Station 2",
            "chopsticks",
            vec![kg("0.2"), kg("0.3"), kg("0.1")],
        );

        let out = record(env.config(), Mode::Test, args).await.unwrap();
        assert!(out.message().contains("Chopsticks"));

        let rows = env.state();
        let appended = rows.last().unwrap();
        assert_eq!(appended[1], "Station 2");
        assert_eq!(appended[2], "Chopsticks");
        assert_eq!(appended[3], "0.6");
        // 0.6 kg at 3 g per pair is 200 pair, at 50 g CO2 each
        assert_eq!(appended[4], "10.00");
        assert_eq!(appended[5], "200");
    }

    #[tokio::test]
    async fn test_record_recycle_has_no_metrics() {
        let env = TestEnv::new().await;
        let args = RecordArgs::new("Station 1", "  RECYCLE ", vec![kg("1.25")]);

        let out = record(env.config(), Mode::Test, args).await.unwrap();
        assert!(out.message().contains("Recycle"));

        let rows = env.state();
        let appended = rows.last().unwrap();
        assert_eq!(appended[2], "Recycle");
        assert_eq!(appended[3], "1.25");
        assert_eq!(appended[4], "0");
        assert_eq!(appended[5], "0");
    }

    #[tokio::test]
    async fn test_record_unknown_category_is_kept() {
        let env = TestEnv::new().await;
        let args = RecordArgs::new("Station 3", "Landfill", vec![kg("3.5")]);

        record(env.config(), Mode::Test, args).await.unwrap();

        let rows = env.state();
        let appended = rows.last().unwrap();
        assert_eq!(appended[2], "landfill");
        assert_eq!(appended[4], "0");
    }
}
