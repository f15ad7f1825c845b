//! Download command: fetch the full log, snapshot it, print it.

use crate::api::Mode;
use crate::backup::DOWNLOAD;
use crate::commands::Out;
use crate::model::StationData;
use crate::{api, Config, Result};
use tracing::debug;

/// Fetches every row of the readings log, saves a JSON snapshot backup under
/// `$STATION_HOME/.backups/`, and prints the data as pretty JSON.
pub async fn download(config: Config, mode: Mode) -> Result<Out<StationData>> {
    let mut station = api::station(&config, mode).await?;
    let data = station.get_data().await?;

    // Save backup immediately after download
    let backup_path = config.backup().save_json(DOWNLOAD, &data).await?;
    debug!("Saved backup to {}", backup_path.display());

    let s = serde_json::to_string_pretty(&data)?;
    println!("{s}");

    Ok(Out::new(
        format!("Downloaded {} readings", data.readings().len()),
        data,
    ))
}
