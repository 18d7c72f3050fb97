//! Human readable detection text.

use remote::Detection;

/// Render a probability as a percentage: `format_confidence(0.823, 1)` is
/// `"82.3%"`. Values outside `0..=1` are rendered as given.
pub fn format_confidence(confidence: f32, decimals: usize) -> String {
    format!("{:.*}%", decimals, confidence as f64 * 100.0)
}

/// `"deer detected (Confidence: 82.3%)"`
pub fn describe_detection(detection: &Detection) -> String {
    format!(
        "{} detected (Confidence: {})",
        detection.label,
        format_confidence(detection.confidence, 1)
    )
}

/// One line per detection, or a placeholder when there are none.
pub fn describe_detections(detections: &[Detection]) -> Vec<String> {
    if detections.is_empty() {
        return vec!["No detections".to_string()];
    }
    detections.iter().map(describe_detection).collect()
}
