use std::io;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use tracing::info;

use crate::error::OutputError;
use crate::simulator::Trajectory;

use super::{output_file_name, write_artifact, Artifact};

/// Write the trajectory as `time,<compartment>...` rows to any writer
pub fn write_csv_to<W: io::Write>(trajectory: &Trajectory, writer: W) -> Result<(), OutputError> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);

    let mut header = Vec::with_capacity(trajectory.compartments().len() + 1);
    header.push("time");
    header.extend(trajectory.compartments().iter().map(String::as_str));
    writer.write_record(&header)?;

    let series = trajectory.all_series();
    for (i, time) in trajectory.times().iter().enumerate() {
        let mut row = Vec::with_capacity(series.len() + 1);
        row.push(time.to_string());
        row.extend(series.iter().map(|s| s[i].to_string()));
        writer.write_record(&row)?;
    }

    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// The trajectory as `simulation_<name>.csv`, in memory
pub fn csv_artifact(trajectory: &Trajectory) -> Result<Artifact, OutputError> {
    let mut buffer = Vec::new();
    write_csv_to(trajectory, &mut buffer)?;
    Ok(Artifact::new(
        output_file_name(trajectory.model_name(), "csv"),
        buffer,
    ))
}

/// Write `simulation_<name>.csv` into `dir` and return its path
pub fn write_csv(trajectory: &Trajectory, dir: &Path) -> Result<PathBuf, OutputError> {
    let artifact = csv_artifact(trajectory)?;
    let path = write_artifact(dir, &artifact)?;
    info!(path = %path.display(), rows = trajectory.len(), "trajectory written");
    Ok(path)
}
