//! Plain-text rendering of boundaries, farms and analysis results.

use std::fmt::Write;

use mesk_core::{Farm, ResultSource, UploadedImage};
use mesk_detect::QueueSummary;
use mesk_field::BoundaryCaptureSession;

pub fn boundary(session: &BoundaryCaptureSession) -> String {
    let mut out = String::new();
    let points = session.boundary().len();

    let _ = writeln!(out, "AOI Boundary: {points} points");
    if session.is_boundary_complete() {
        let _ = writeln!(out, "  ~{:.2} acres", session.current_area_acres());
        let _ = writeln!(out, "  AOI boundary complete");
    } else {
        let _ = writeln!(
            out,
            "  Click {} more points to complete boundary",
            session.points_remaining()
        );
    }

    out
}

pub fn farm(farm: &Farm) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Farm Created: {} has been saved with {:.2} acres",
        farm.name, farm.area_acres
    );
    let _ = writeln!(out, "  Location: {}", farm.location);
    let _ = writeln!(out, "  Boundary: {} points", farm.boundary.len());
    if !farm.description.is_empty() {
        let _ = writeln!(out, "  {}", farm.description);
    }

    out
}

pub fn image(image: &UploadedImage, display_limit: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} [{}]", image.name, image.status);

    let Some(result) = &image.result else {
        return out;
    };

    let verdict = if result.pest_detected {
        "Pest Detected"
    } else {
        "No Pests"
    };
    let _ = write!(out, "  {verdict} ({}%)", result.confidence);
    if let Some(pest_type) = &result.pest_type {
        let _ = write!(out, " {pest_type}");
    }
    if result.source == ResultSource::Simulated {
        let _ = write!(out, " (simulated)");
    }
    out.push('\n');

    let _ = writeln!(out, "  Recommendations:");
    for rec in &result.recommendations {
        let _ = writeln!(out, "    - {rec}");
    }

    let shown = result.top_detections(display_limit);
    if !shown.is_empty() {
        let _ = writeln!(out, "  Detections:");
        for detection in shown {
            let _ = writeln!(
                out,
                "    {} {}%",
                detection.label,
                (detection.score * 100.0).floor()
            );
        }
    }

    out
}

pub fn summary(summary: &QueueSummary) -> String {
    format!(
        "{} Images Analyzed, {} complete, {} with pests\n",
        summary.total, summary.complete, summary.pests_detected
    )
}
