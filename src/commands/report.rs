//! Report command: aggregate the full log and print the totals.
//!
//! This re-reads the entire log and recomputes every total from scratch, the
//! same way the kiosk dashboards refresh. Nothing is cached between runs.

use crate::aggregate::{aggregate, Aggregation};
use crate::api::Mode;
use crate::args::ReportArgs;
use crate::commands::Out;
use crate::model::{Kilograms, Readings};
use crate::{api, Config, Result};
use anyhow::Context;
use rust_decimal::prelude::ToPrimitive;
use std::io::BufReader;
use std::path::Path;

/// Aggregates the current log and prints the totals.
///
/// The rows come from the sheet, or from a local CSV snapshot when `--file`
/// is given (useful offline, or against a `download` backup converted to CSV).
pub async fn report(config: Config, mode: Mode, args: ReportArgs) -> Result<Out<Aggregation>> {
    let readings = match args.file() {
        Some(path) => readings_from_csv(path)?,
        None => {
            let mut station = api::station(&config, mode).await?;
            station.get_data().await?.readings().clone()
        }
    };

    let aggregation = aggregate(&readings);
    println!("{}", render(&aggregation));

    Ok(Out::new(
        format!("Aggregated {} readings", readings.len()),
        aggregation,
    ))
}

/// Reads log rows from a CSV file. The first row must be the header row.
fn readings_from_csv(path: &Path) -> Result<Readings> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Unable to open file {}", path.display()))?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false) // Ensure headers are treated as part of the data
        .flexible(true)
        .from_reader(BufReader::new(file));

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result.context("Unable to read a CSV record")?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    Readings::new(rows)
}

/// Renders the aggregation as a plain-text report.
///
/// An empty log gets its own message; "no readings yet" and "zero diverted"
/// are different facts and must not look alike.
fn render(aggregation: &Aggregation) -> String {
    let totals = match aggregation {
        Aggregation::NoData => return "No readings have been recorded yet.".to_string(),
        Aggregation::Data(totals) => totals,
    };

    let mut lines = vec![
        "Waste Diversion Report".to_string(),
        "======================".to_string(),
    ];
    for (category, weight) in totals.categories() {
        lines.push(format!(
            "{:<22}{:>12} kg",
            category.sheet_label(),
            fmt_kg(weight)
        ));
    }
    lines.push(format!(
        "{:<22}{:>12} kg",
        "Total diverted",
        fmt_kg(totals.diverted_weight())
    ));
    lines.push(String::new());
    let chopsticks = totals.chopsticks();
    lines.push(format!(
        "{:<22}{:>12} pair",
        "Chopsticks count",
        chopsticks.count()
    ));
    lines.push(format!(
        "{:<22}{:>12} kg",
        "CO2 reduced",
        fmt_kg(chopsticks.co2())
    ));
    lines.join("\n")
}

fn fmt_kg(kg: Kilograms) -> String {
    format_num::format_num!(",.2", kg.value().to_f64().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn test_report_in_test_mode() {
        let env = TestEnv::new().await;
        let out = report(env.config(), Mode::Test, ReportArgs::new(None))
            .await
            .unwrap();
        let totals = out.structure().unwrap().totals().unwrap();
        assert_eq!(totals.category_weight("recycle").value(), dec("3.25"));
        assert_eq!(totals.category_weight("chopsticks").value(), dec("0.50"));
        assert_eq!(totals.category_weight("landfill").value(), dec("5.00"));
        assert_eq!(totals.diverted_weight().value(), dec("3.75"));
        assert_eq!(totals.chopsticks().count(), 166);
        assert_eq!(totals.chopsticks().co2().value(), dec("8.30"));
    }

    #[tokio::test]
    async fn test_report_from_csv_file() {
        let env = TestEnv::new().await;
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("snapshot.csv");
        let csv = "\
Time Stamp,Station,Category,Weight (kg),CO2 Emission (kg),Chopsticks Count (pair)
2026-08-02 10:00:00,Station 1,Recycle,2.0,0,0
2026-08-02 10:05:00,Station 1,Chopsticks,0.5,1.2,20
";
        std::fs::write(&path, csv).unwrap();

        let out = report(env.config(), Mode::Test, ReportArgs::new(Some(path)))
            .await
            .unwrap();
        let totals = out.structure().unwrap().totals().unwrap();
        assert_eq!(totals.diverted_weight().value(), dec("2.5"));
        assert_eq!(totals.chopsticks().count(), 20);
    }

    #[test]
    fn test_render_no_data() {
        let rendered = render(&Aggregation::NoData);
        assert_eq!(rendered, "No readings have been recorded yet.");
    }

    #[test]
    fn test_render_totals() {
        let readings = Readings::new(vec![
            vec!["Time Stamp", "Station", "Category", "Weight (kg)", "CO2 Emission (kg)", "Chopsticks Count (pair)"],
            vec!["t1", "Station 1", "Recycle", "2.0", "0", "0"],
            vec!["t2", "Station 1", "Chopsticks", "0.5", "1.2", "20"],
        ])
        .unwrap();
        let rendered = render(&aggregate(&readings));
        assert!(rendered.contains("Waste Diversion Report"));
        assert!(rendered.contains("Recycle"));
        assert!(rendered.contains("2.00 kg"));
        assert!(rendered.contains("Total diverted"));
        assert!(rendered.contains("2.50 kg"));
        assert!(rendered.contains("20 pair"));
        // Zero totals render differently from the no-data message.
        assert!(!rendered.contains("No readings"));
    }
}
