use crate::config::TargetRange;
use crate::dosing::{PatchWindow, ScheduleParams};
use crate::error::PKResult;
use crate::simulation::{SeriesPoint, SeriesSummary, Snapshot};
use serde::Serialize;
use std::path::Path;
use std::fs::File;
use log::info;

/// Writes the artefacts of a synthetic schedule run.
pub fn save_schedule_results<P: AsRef<Path>>(
    params: &ScheduleParams,
    windows: &[PatchWindow],
    series: &[SeriesPoint],
    output_dir: P,
) -> PKResult<()> {
    let output_path = output_dir.as_ref();
    let summary = SeriesSummary::from_series(series);

    save_windows(windows, output_path.join("windows.csv"))?;
    save_series(series, output_path.join("series.csv"))?;
    save_json(&summary, output_path.join("summary.json"))?;
    std::fs::write(output_path.join("report.md"), schedule_report(params, windows, summary.as_ref()))?;

    info!("Schedule results saved to {:?}", output_path);
    Ok(())
}

/// Writes the artefacts of a personal-history run.
pub fn save_personal_results<P: AsRef<Path>>(
    snapshot: &Snapshot,
    target: &TargetRange,
    output_dir: P,
) -> PKResult<()> {
    let output_path = output_dir.as_ref();

    save_series(&snapshot.series, output_path.join("series.csv"))?;
    save_series(&snapshot.projection, output_path.join("projection.csv"))?;
    save_json(&snapshot.recommendations, output_path.join("recommendations.json"))?;
    save_json(&snapshot.summary, output_path.join("summary.json"))?;
    std::fs::write(output_path.join("report.md"), personal_report(snapshot, target))?;

    info!("Personal results saved to {:?}", output_path);
    Ok(())
}

fn save_series<P: AsRef<Path>>(series: &[SeriesPoint], path: P) -> PKResult<()> {
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(["TIME", "CONCENTRATION"])?;
    for point in series {
        writer.write_record(&[point.time.to_string(), point.value.to_string()])?;
    }

    writer.flush()?;
    Ok(())
}

fn save_windows<P: AsRef<Path>>(windows: &[PatchWindow], path: P) -> PKResult<()> {
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(["INDEX", "APPLIED_AT", "REMOVED_AT"])?;
    for window in windows {
        writer.write_record(&[
            window.index.to_string(),
            window.applied_at.to_string(),
            window.removed_at.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn save_json<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> PKResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}

fn summary_section(summary: Option<&SeriesSummary>) -> String {
    match summary {
        Some(s) => format!(
            "- Cmax: {:.1} pg/mL at {:.0}h\n- Cmin: {:.1} pg/mL\n- Cavg: {:.1} pg/mL\n- AUC: {:.0} pg*h/mL\n",
            s.cmax, s.tmax, s.cmin, s.cavg, s.auc
        ),
        None => "- No concentration data\n".to_string(),
    }
}

fn schedule_report(params: &ScheduleParams, windows: &[PatchWindow], summary: Option<&SeriesSummary>) -> String {
    format!(
        r#"# Patch Schedule Simulation Report

## Schedule
- **Patches per application**: {}
- **Hours between applications**: {}
- **Hours worn per patch**: {}
- **Dose per patch**: {} mg/day
- **Simulated period**: {}h ({} patch windows)

## Serum E2
{}
## Files Generated
- `windows.csv`: Application and removal hour of every patch
- `series.csv`: Hourly estimated serum E2
- `summary.json`: Exposure metrics
"#,
        params.patches,
        params.spread_hours,
        params.worn_hours,
        params.dose_mg_per_day,
        params.period_hours,
        windows.len(),
        summary_section(summary),
    )
}

fn personal_report(snapshot: &Snapshot, target: &TargetRange) -> String {
    let recommendations = if snapshot.recommendations.is_empty() {
        "- No action needed\n".to_string()
    } else {
        snapshot.recommendations.iter()
            .map(|r| format!("- [{:?}/{:?}] {}\n", r.kind, r.urgency, r.message))
            .collect()
    };

    format!(
        r#"# Personal E2 Estimate Report

## Current Level
- **As of**: {}
- **Estimated serum E2**: {:.1} pg/mL
- **Target range**: {:.0}-{:.0} pg/mL

## History
{}
## Recommendations
{}
## Files Generated
- `series.csv`: Hourly estimate since the first recorded patch
- `projection.csv`: Hourly projection from now
- `recommendations.json`: Scheduling guidance
- `summary.json`: Exposure metrics over the history

## Notes
Estimates come from population-average absorption data for a 0.1 mg/day
patch and do not account for individual variation.
"#,
        snapshot.now.to_rfc3339(),
        snapshot.current_level,
        target.min,
        target.max,
        summary_section(snapshot.summary.as_ref()),
        recommendations,
    )
}
