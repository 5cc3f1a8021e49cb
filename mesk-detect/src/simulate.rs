use mesk_core::{DetectionResult, ResultSource};
use rand::Rng;

/// Pest types a simulated positive verdict is drawn from.
pub const PEST_CATALOG: [&str; 4] = ["Aphids", "Caterpillars", "Spider Mites", "Thrips"];

/// Produces a stand-in verdict when no model output is available.
///
/// Positive with probability 0.4, confidence in `70..100`. Never fabricates
/// raw detections.
pub fn simulate<R: Rng>(rng: &mut R) -> DetectionResult {
    let pest_detected = rng.random::<f64>() > 0.6;
    let confidence = rng.random_range(70..100u8);
    let pest_type =
        pest_detected.then(|| PEST_CATALOG[rng.random_range(0..PEST_CATALOG.len())].to_owned());

    let recommendations = if pest_detected {
        vec![
            "Apply targeted insecticide treatment",
            "Increase monitoring frequency",
            "Consider biological control methods",
            "Remove affected plant parts if necessary",
        ]
    } else {
        vec![
            "Continue regular monitoring",
            "Maintain current care practices",
            "No immediate action required",
        ]
    };

    DetectionResult {
        pest_detected,
        confidence,
        pest_type,
        detections: Vec::new(),
        recommendations: recommendations.into_iter().map(String::from).collect(),
        source: ResultSource::Simulated,
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn simulated_verdicts_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut positives = 0;

        for _ in 0..500 {
            let result = simulate(&mut rng);
            assert!((70..100).contains(&result.confidence));
            assert!(result.detections.is_empty());
            assert_eq!(result.source, ResultSource::Simulated);

            if result.pest_detected {
                positives += 1;
                let pest = result.pest_type.as_deref().unwrap();
                assert!(PEST_CATALOG.contains(&pest));
                assert_eq!(result.recommendations.len(), 4);
            } else {
                assert!(result.pest_type.is_none());
                assert_eq!(result.recommendations.len(), 3);
            }
        }

        // roughly 40% positive
        assert!((100..300).contains(&positives));
    }
}
