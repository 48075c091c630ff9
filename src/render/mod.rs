//! Chart rendering for the analysis views.
//!
//! Every chart is written into the configured output directory, which
//! must already exist.

pub mod charts;
pub mod palette;

use crate::config::{ChartSpec, Config};
use crate::error::OutputError;
use crate::models::{month_name, Analysis};
use crate::report::format_currency;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Number of charts drawn per run.
pub const CHART_COUNT: usize = 6;

/// Renders every chart and returns the written paths in drawing order.
pub fn render_all(
    analysis: &Analysis,
    config: &Config,
    show_progress: bool,
) -> Result<Vec<PathBuf>, OutputError> {
    let dir = &config.output.directory;
    ensure_output_dir(dir)?;

    if analysis.overview.row_count == 0 {
        warn!("No records loaded, skipping charts");
        return Ok(Vec::new());
    }

    let size = (config.output.width, config.output.height);
    let specs = &config.charts;
    let mut writer = ChartWriter::new(dir, show_progress);

    let (labels, values) = split_totals(analysis.category_totals.iter());
    writer.draw("category", &specs.category, |path, spec| {
        charts::draw_totals_chart(path, size, spec, &spec.title, &labels, &values)
    })?;

    let (labels, values): (Vec<String>, Vec<f64>) = analysis
        .monthly_totals
        .iter()
        .map(|(&month, &total)| (month_name(month).to_string(), total))
        .unzip();
    writer.draw("monthly", &specs.monthly, |path, spec| {
        charts::draw_totals_chart(path, size, spec, &spec.title, &labels, &values)
    })?;

    writer.draw("top_profit", &specs.top_profit, |path, spec| {
        charts::draw_top_profit_chart(path, size, spec, &analysis.top_profitable)
    })?;

    let bins = config.analysis.histogram_bins;
    writer.draw("age", &specs.age, |path, spec| {
        charts::draw_age_histogram(path, size, spec, &analysis.ages, bins)
    })?;

    let (labels, values) = split_totals(analysis.region_totals.iter());
    let title = region_title(&specs.region.title, analysis);
    writer.draw("region", &specs.region, |path, spec| {
        charts::draw_totals_chart(path, size, spec, &title, &labels, &values)
    })?;

    writer.draw("correlation", &specs.correlation, |path, spec| {
        charts::draw_correlation_heatmap(path, size, spec, &analysis.correlation)
    })?;

    Ok(writer.finish())
}

/// Draws charts into one directory and tracks what was written.
struct ChartWriter<'a> {
    dir: &'a Path,
    progress: ProgressBar,
    written: Vec<PathBuf>,
}

impl<'a> ChartWriter<'a> {
    fn new(dir: &'a Path, show_progress: bool) -> Self {
        Self {
            dir,
            progress: progress_bar(show_progress),
            written: Vec::with_capacity(CHART_COUNT),
        }
    }

    fn draw<F>(&mut self, chart: &'static str, spec: &ChartSpec, f: F) -> Result<(), OutputError>
    where
        F: FnOnce(&Path, &ChartSpec) -> anyhow::Result<()>,
    {
        let path = self.dir.join(&spec.filename);
        self.progress.set_message(chart);
        debug!("Rendering {} chart ({}) to {}", chart, spec.kind, path.display());

        f(&path, spec).map_err(|e| OutputError::Render {
            chart,
            path: path.clone(),
            message: format!("{:#}", e),
        })?;

        self.progress.inc(1);
        self.written.push(path);
        Ok(())
    }

    fn finish(self) -> Vec<PathBuf> {
        self.progress.finish_and_clear();
        info!("Wrote {} charts to {}", self.written.len(), self.dir.display());
        self.written
    }
}

/// Fails unless `dir` is an existing directory.
pub fn ensure_output_dir(dir: &Path) -> Result<(), OutputError> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(OutputError::MissingDirectory(dir.to_path_buf()))
    }
}

/// Region chart title with the best region and its total appended.
pub fn region_title(base: &str, analysis: &Analysis) -> String {
    match &analysis.best_region {
        Some(best) => format!("{}: {} ({})", base, best.region, format_currency(best.total)),
        None => base.to_string(),
    }
}

fn split_totals<'a>(
    totals: impl Iterator<Item = (&'a String, &'a f64)>,
) -> (Vec<String>, Vec<f64>) {
    totals.map(|(label, &total)| (label.clone(), total)).unzip()
}

fn progress_bar(show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(CHART_COUNT as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::loader::{load_records, read_records};

    const CSV: &str = "\
order_id,product_category,sales_amount,profit,purchase_date,customer_age,region,rating
1,A,100,10,2024-01-05,30,North,4
2,B,50,5,2024-02-05,40,South,3
3,A,25,2,2024-02-15,50,North,5
";

    fn sample_analysis() -> Analysis {
        let records = read_records(CSV.as_bytes()).unwrap();
        analyze(&records, 5)
    }

    fn config_for(dir: &Path) -> Config {
        let mut config = Config::default();
        config.output.directory = dir.to_path_buf();
        config.output.width = 640;
        config.output.height = 480;
        config
    }

    fn assert_png(path: &Path) {
        let bytes = std::fs::read(path).unwrap();
        assert!(
            bytes.starts_with(b"\x89PNG"),
            "{} is not a PNG image",
            path.display()
        );
    }

    #[test]
    fn test_renders_every_chart() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_for(temp.path());

        let fixture = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/sales_sample.csv");
        let records = load_records(&fixture).unwrap();
        let written = render_all(&analyze(&records, 5), &config, false).unwrap();

        assert_eq!(written.len(), CHART_COUNT);
        for (_, spec) in config.charts.all() {
            let path = temp.path().join(&spec.filename);
            assert!(written.contains(&path), "missing {}", spec.filename);
            assert_png(&path);
        }
    }

    #[test]
    fn test_renders_single_record() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_for(temp.path());

        let csv = "\
order_id,product_category,sales_amount,profit,purchase_date,customer_age,region,rating
1,A,100,10,2024-01-05,30,North,4
";
        let records = read_records(csv.as_bytes()).unwrap();
        let written = render_all(&analyze(&records, 5), &config, false).unwrap();

        assert_eq!(written.len(), CHART_COUNT);
        for path in &written {
            assert_png(path);
        }
    }

    #[test]
    fn test_rerender_overwrites_charts() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_for(temp.path());
        let stale = temp.path().join(&config.charts.category.filename);
        std::fs::write(&stale, b"stale").unwrap();

        let analysis = sample_analysis();
        render_all(&analysis, &config, false).unwrap();
        assert_png(&stale);
        let first = std::fs::read(&stale).unwrap();

        render_all(&analysis, &config, false).unwrap();
        assert_eq!(std::fs::read(&stale).unwrap(), first);
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), CHART_COUNT);
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("Visualization");

        let mut config = Config::default();
        config.output.directory = missing.clone();

        let err = render_all(&sample_analysis(), &config, false).unwrap_err();
        assert!(matches!(err, OutputError::MissingDirectory(ref p) if *p == missing));
        // Never created implicitly.
        assert!(!missing.exists());
    }

    #[test]
    fn test_ensure_output_dir() {
        let temp = tempfile::tempdir().unwrap();
        assert!(ensure_output_dir(temp.path()).is_ok());

        let file = temp.path().join("file.png");
        std::fs::write(&file, b"x").unwrap();
        assert!(ensure_output_dir(&file).is_err());
    }

    #[test]
    fn test_empty_analysis_writes_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_for(temp.path());

        let analysis = analyze(&[], 5);
        let written = render_all(&analysis, &config, false).unwrap();
        assert!(written.is_empty());
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_region_title() {
        let analysis = sample_analysis();
        assert_eq!(
            region_title("Best Performing Region by Sales", &analysis),
            "Best Performing Region by Sales: North ($125)"
        );

        let empty = analyze(&[], 5);
        assert_eq!(region_title("Regions", &empty), "Regions");
    }

    #[test]
    fn test_split_totals() {
        let analysis = sample_analysis();
        let (labels, values) = split_totals(analysis.category_totals.iter());
        assert_eq!(labels, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(values, vec![125.0, 50.0]);
    }
}
