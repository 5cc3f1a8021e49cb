use mesk_core::{DetectionResult, RawDetection, ResultSource};

/// Detections must score strictly above this to count as a pest sighting.
pub const SCORE_THRESHOLD: f64 = 0.3;

/// Confidence reported when there is no top detection to take it from.
///
/// In practice that means a clean verdict; a positive verdict always has at
/// least one detection to rank.
pub const FALLBACK_CONFIDENCE: u8 = 85;

/// Maps a model label onto the pest category shown to the operator.
pub fn pest_category(label: &str) -> Option<&'static str> {
    let category = match label {
        "person" => "Human Presence",
        "bird" => "Bird Pest",
        "car" | "truck" => "Equipment",
        "insect" => "Insect Pest",
        "aphid" => "Aphids",
        "caterpillar" => "Caterpillars",
        "spider" => "Spider Mites",
        "thrips" => "Thrips",
        "whitefly" => "Whiteflies",
        "beetle" => "Beetles",
        _ => return None,
    };
    Some(category)
}

/// Reduces raw model output with the default [`SCORE_THRESHOLD`].
pub fn reduce(raw: Vec<RawDetection>) -> DetectionResult {
    reduce_with_threshold(raw, SCORE_THRESHOLD)
}

/// Filters, ranks and summarises raw detections into a verdict.
///
/// Kept detections stay in model order; truncating them for display is the
/// caller's concern.
pub fn reduce_with_threshold(raw: Vec<RawDetection>, threshold: f64) -> DetectionResult {
    let detections: Vec<RawDetection> = raw.into_iter().filter(|d| d.score > threshold).collect();
    let pest_detected = !detections.is_empty();

    // first of equal scores wins
    let top = detections
        .iter()
        .fold(None::<&RawDetection>, |best, d| match best {
            Some(b) if b.score >= d.score => Some(b),
            _ => Some(d),
        });

    let confidence = top.map_or(FALLBACK_CONFIDENCE, |t| percent(t.score));
    let pest_type = top.map(|t| {
        pest_category(&t.label)
            .map(str::to_owned)
            .unwrap_or_else(|| t.label.clone())
    });

    let recommendations = recommendations(pest_type.as_deref(), confidence, pest_detected);

    DetectionResult {
        pest_detected,
        confidence,
        pest_type,
        detections,
        recommendations,
        source: ResultSource::Model,
    }
}

fn percent(score: f64) -> u8 {
    (score * 100.0).floor().clamp(0.0, 100.0) as u8
}

fn recommendations(pest_type: Option<&str>, confidence: u8, pest_detected: bool) -> Vec<String> {
    if pest_detected {
        vec![
            format!(
                "Detected {} with {confidence}% confidence",
                pest_type.unwrap_or("pest")
            ),
            "Monitor affected areas closely".into(),
            "Consider targeted treatment if infestation spreads".into(),
            "Document location for follow-up inspection".into(),
        ]
    } else {
        vec![
            "No significant pest activity detected".into(),
            "Continue regular monitoring schedule".into(),
            "Maintain current care practices".into(),
            "Re-scan if plant health changes".into(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use mesk_core::BoundingBox;

    use super::*;

    fn det(label: &str, score: f64) -> RawDetection {
        RawDetection {
            bbox: BoundingBox {
                xmin: 10.0,
                ymin: 10.0,
                xmax: 50.0,
                ymax: 40.0,
            },
            label: label.into(),
            score,
        }
    }

    #[test]
    fn threshold_is_exclusive() {
        let at = reduce(vec![det("aphid", 0.3)]);
        assert!(!at.pest_detected);
        assert!(at.detections.is_empty());
        assert_eq!(at.pest_type, None);

        let above = reduce(vec![det("aphid", 0.31)]);
        assert!(above.pest_detected);
        assert_eq!(above.detections.len(), 1);
        assert_eq!(above.confidence, 31);
    }

    #[test]
    fn confidence_is_floored_top_score() {
        let result = reduce(vec![det("bird", 0.45), det("aphid", 0.87), det("beetle", 0.6)]);
        assert_eq!(result.confidence, 87);
        assert_eq!(result.pest_type.as_deref(), Some("Aphids"));
        assert_eq!(result.detections.len(), 3);
        assert_eq!(result.detections[0].label, "bird");
    }

    #[test]
    fn ties_keep_the_first_detection() {
        let result = reduce(vec![det("thrips", 0.7), det("beetle", 0.7)]);
        assert_eq!(result.pest_type.as_deref(), Some("Thrips"));
    }

    #[test]
    fn unmapped_labels_pass_through() {
        let result = reduce(vec![det("potted plant", 0.92)]);
        assert_eq!(result.pest_type.as_deref(), Some("potted plant"));
        assert_eq!(
            result.recommendations[0],
            "Detected potted plant with 92% confidence"
        );
    }

    #[test]
    fn clean_template_when_nothing_passes() {
        let result = reduce(vec![det("aphid", 0.1), det("bird", 0.25)]);
        assert!(!result.pest_detected);
        assert_eq!(result.confidence, FALLBACK_CONFIDENCE);
        assert_eq!(result.recommendations.len(), 4);
        assert_eq!(
            result.recommendations[0],
            "No significant pest activity detected"
        );
        assert_eq!(result.source, ResultSource::Model);
    }

    #[test]
    fn empty_input_is_clean() {
        let result = reduce(vec![]);
        assert!(!result.pest_detected);
        assert!(result.detections.is_empty());
    }

    #[test]
    fn custom_threshold() {
        let result = reduce_with_threshold(vec![det("aphid", 0.4)], 0.5);
        assert!(!result.pest_detected);
    }

    #[test]
    fn label_table() {
        assert_eq!(pest_category("truck"), Some("Equipment"));
        assert_eq!(pest_category("whitefly"), Some("Whiteflies"));
        assert_eq!(pest_category("dog"), None);
    }
}
