use std::fmt::Display;
use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::info;

use crate::error::OutputError;
use crate::simulator::Trajectory;

use super::{
    ensure_directory, output_file_name, write_artifact, Artifact, ChartOptions, ImageFormat,
};

/// `<name> - Compartmental Model Simulation`
pub fn chart_title(model_name: &str) -> String {
    format!("{} - Compartmental Model Simulation", model_name)
}

/// Render all compartments of `trajectory` into `dir`
///
/// The file name is derived from the model name. Returns the written path.
pub fn render_chart(
    trajectory: &Trajectory,
    dir: &Path,
    options: &ChartOptions,
) -> Result<PathBuf, OutputError> {
    ensure_directory(dir)?;
    let artifact = chart_artifact(trajectory, options)?;
    let path = write_artifact(dir, &artifact)?;
    info!(path = %path.display(), format = %options.format, "chart written");
    Ok(path)
}

/// Render the chart in memory as `simulation_<name>.<format>`
pub fn chart_artifact(
    trajectory: &Trajectory,
    options: &ChartOptions,
) -> Result<Artifact, OutputError> {
    if trajectory.compartments().is_empty() || trajectory.is_empty() {
        return Err(OutputError::EmptyTrajectory);
    }

    let bytes = match options.format {
        ImageFormat::Svg => render_svg(trajectory, options)?.into_bytes(),
        ImageFormat::Png => render_png(trajectory, options)?,
    };
    Ok(Artifact::new(
        output_file_name(trajectory.model_name(), options.format.extension()),
        bytes,
    ))
}

/// Render the chart as an SVG document
pub fn render_svg(trajectory: &Trajectory, options: &ChartOptions) -> Result<String, OutputError> {
    let mut svg = String::new();
    {
        let root =
            SVGBackend::with_string(&mut svg, (options.width, options.height)).into_drawing_area();
        draw(root, trajectory)?;
    }
    Ok(svg)
}

/// Bitmap text needs a real font, so PNG output only exists with `ttf`
#[cfg(feature = "ttf")]
fn render_png(trajectory: &Trajectory, options: &ChartOptions) -> Result<Vec<u8>, OutputError> {
    use image::codecs::png::PngEncoder;
    use image::{ExtendedColorType, ImageEncoder};

    let (width, height) = (options.width, options.height);
    let mut pixels = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        draw(root, trajectory)?;
    }

    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(&pixels, width, height, ExtendedColorType::Rgb8)
        .map_err(render_error)?;
    Ok(png)
}

#[cfg(not(feature = "ttf"))]
fn render_png(_trajectory: &Trajectory, _options: &ChartOptions) -> Result<Vec<u8>, OutputError> {
    Err(OutputError::Render(
        "PNG output needs the `ttf` feature; use SVG instead".to_string(),
    ))
}

fn draw<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    trajectory: &Trajectory,
) -> Result<(), OutputError> {
    root.fill(&WHITE).map_err(render_error)?;

    let times = trajectory.times();
    let x_max = times.last().copied().unwrap_or(1.0);
    let y_max = (trajectory.max_value() * 1.05).max(1.0);

    let mut chart = ChartBuilder::on(&root)
        .caption(chart_title(trajectory.model_name()), ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..x_max, 0f64..y_max)
        .map_err(render_error)?;

    chart
        .configure_mesh()
        .x_desc("Time")
        .y_desc("Population")
        .draw()
        .map_err(render_error)?;

    for (i, (label, series)) in trajectory
        .labels()
        .iter()
        .zip(trajectory.all_series())
        .enumerate()
    {
        let color = Palette99::pick(i).to_rgba();
        chart
            .draw_series(LineSeries::new(
                times.iter().copied().zip(series.iter().copied()),
                color.stroke_width(2),
            ))
            .map_err(render_error)?
            .label(label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(render_error)?;

    root.present().map_err(render_error)?;
    Ok(())
}

fn render_error(e: impl Display) -> OutputError {
    OutputError::Render(e.to_string())
}
