//! Estimate command: run the calibration model for one weight.
//!
//! The kiosk prints these numbers at capture time; this command answers the
//! same question ahead of time, e.g. to sanity-check a calibration change.

use crate::args::EstimateArgs;
use crate::commands::Out;
use crate::estimate::ChopsticksEstimate;
use crate::{Config, Result};

/// Prints the estimated chopsticks count and CO2 reduction for a weight,
/// using the calibration from `config.json`.
pub fn estimate(config: &Config, args: EstimateArgs) -> Result<Out<ChopsticksEstimate>> {
    let estimate = config.calibration().estimate(args.weight());
    println!("Estimated count:         {} pair", estimate.count);
    println!("Estimated CO2 reduction: {} kg", estimate.co2.rounded());
    Ok(Out::new(
        format!(
            "A weight of {} kg is about {} pair, reducing CO2 by about {} kg",
            args.weight(),
            estimate.count,
            estimate.co2.rounded()
        ),
        estimate,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use crate::model::Kilograms;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_estimate_uses_config_calibration() {
        let env = TestEnv::new().await;
        let args = EstimateArgs::new(Kilograms::from_str("0.5").unwrap());
        let out = estimate(&env.config(), args).unwrap();
        let estimate = out.structure().unwrap();
        // Default calibration: floor(0.5 / 0.003) = 166 pair at 50 g each
        assert_eq!(estimate.count, 166);
        assert_eq!(estimate.co2.rounded().to_string(), "8.30");
    }
}
