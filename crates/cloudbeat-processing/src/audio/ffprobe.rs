use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;

use crate::error::ProbeError;

#[derive(Debug, Deserialize)]
struct FFprobeOutput {
    format: Option<FFprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FFprobeFormat {
    duration: Option<String>,
}

/// Container duration as reported by `ffprobe -show_format`.
#[tracing::instrument(skip(ffprobe_path, file_path), fields(service = "audio"))]
pub(crate) async fn duration(ffprobe_path: &str, file_path: &Path) -> Result<f64, ProbeError> {
    let output = Command::new(ffprobe_path)
        .args(["-v", "error", "-show_format", "-of", "json"])
        .arg(file_path)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| ProbeError::Ffprobe(format!("Failed to run ffprobe: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ProbeError::Ffprobe(stderr.trim().to_string()));
    }

    let parsed: FFprobeOutput = serde_json::from_slice(&output.stdout)
        .map_err(|e| ProbeError::Ffprobe(format!("Failed to parse ffprobe output: {}", e)))?;

    parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| ProbeError::Ffprobe("no duration in ffprobe output".to_string()))
}
