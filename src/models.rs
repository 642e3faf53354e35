use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};

/// One user-entered link request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkSpec {
    pub url: String,
    pub folder: String,
    pub rename_base: String,
    pub rename_ext: String,
    #[serde(alias = "allow_ext")]
    pub allow_extension_change: bool,
    pub notes: String,
}

impl LinkSpec {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// The combined rename the worker expects: `base.ext` when an extension
    /// change is allowed and given, otherwise just the base.
    pub fn rename(&self) -> String {
        if self.rename_base.is_empty() {
            return String::new();
        }
        if self.allow_extension_change && !self.rename_ext.is_empty() {
            format!("{}.{}", self.rename_base, self.rename_ext)
        } else {
            self.rename_base.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// No compression, fastest
    Store,
    /// Very fast
    Low,
    /// Balanced
    #[default]
    Mid,
    /// High compression
    High,
    /// Slowest, smallest size
    Ultra,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum ArchiveType {
    #[default]
    #[serde(rename = "zip")]
    #[value(name = "zip")]
    Zip,
    #[serde(rename = "7z")]
    #[value(name = "7z")]
    SevenZip,
    #[serde(rename = "tar.gz")]
    #[value(name = "tar.gz")]
    TarGz,
    #[serde(rename = "tar.bz2")]
    #[value(name = "tar.bz2")]
    TarBz2,
    #[serde(rename = "tar.xz")]
    #[value(name = "tar.xz")]
    TarXz,
    #[serde(rename = "gz")]
    #[value(name = "gz")]
    Gz,
    #[serde(rename = "bz2")]
    #[value(name = "bz2")]
    Bz2,
    #[serde(rename = "xz")]
    #[value(name = "xz")]
    Xz,
}

impl ArchiveType {
    pub const ALL: [ArchiveType; 8] = [
        ArchiveType::Zip,
        ArchiveType::SevenZip,
        ArchiveType::TarGz,
        ArchiveType::TarBz2,
        ArchiveType::TarXz,
        ArchiveType::Gz,
        ArchiveType::Bz2,
        ArchiveType::Xz,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveType::Zip => "zip",
            ArchiveType::SevenZip => "7z",
            ArchiveType::TarGz => "tar.gz",
            ArchiveType::TarBz2 => "tar.bz2",
            ArchiveType::TarXz => "tar.xz",
            ArchiveType::Gz => "gz",
            ArchiveType::Bz2 => "bz2",
            ArchiveType::Xz => "xz",
        }
    }

    /// Extension appended to planned file names. Only the part after the
    /// last dot is used, so `tar.gz` yields `gz`.
    pub fn extension(&self) -> &'static str {
        let name = self.as_str();
        match name.rfind('.') {
            Some(dot) => &name[dot + 1..],
            None => name,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub enabled: bool,
    pub level: CompressionLevel,
    #[serde(rename = "type")]
    pub archive_type: ArchiveType,
}

/// A link as submitted to the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkPayload {
    pub url: String,
    pub folder: String,
    pub rename: String,
    pub allow_ext: bool,
    pub notes: String,
    pub rename_base: String,
    pub rename_ext: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobRequest {
    pub job_id: String,
    pub links: Vec<LinkPayload>,
    pub notes: String,
    pub compression: CompressionConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetryRequest {
    pub job_id: String,
    pub run_id: String,
    pub files: Vec<String>,
}

/// Treats an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Byte counts may arrive as integers or floats; anything negative or
/// non-numeric reads as unknown.
fn lenient_bytes<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        }),
        _ => None,
    }))
}

/// Reply to both job submission and retry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SubmitResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub ok: bool,
    pub run_id: Option<String>,
}

/// Status value the worker reports once a run has ended.
pub const STATUS_COMPLETED: &str = "completed";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JobStatus {
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    pub conclusion: Option<String>,
    pub stage: Option<String>,
    pub files: Option<Vec<JobResultFile>>,
    pub summary: Option<JobSummary>,
}

impl JobStatus {
    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }

    /// Text shown for the job: the conclusion once completed, else the raw status.
    pub fn display_status(&self) -> &str {
        if self.is_completed() {
            self.conclusion.as_deref().unwrap_or(STATUS_COMPLETED)
        } else {
            &self.status
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobResultFile {
    #[serde(deserialize_with = "null_as_default")]
    pub original: String,
    #[serde(rename = "final", deserialize_with = "null_as_default")]
    pub final_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "lenient_bytes")]
    pub size: Option<u64>,
    pub download: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub folder: String,
    #[serde(deserialize_with = "null_as_default")]
    pub notes: String,
}

impl JobResultFile {
    pub fn is_failed(&self) -> bool {
        let status = self.status.to_lowercase();
        status.contains("fail") || status.contains("error")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct JobSummary {
    #[serde(alias = "bytes", deserialize_with = "lenient_bytes")]
    pub total_bytes: Option<u64>,
    #[serde(alias = "seconds", alias = "elapsed")]
    pub duration_seconds: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HistoryEntry {
    #[serde(deserialize_with = "null_as_default")]
    pub job_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    pub time: serde_json::Value,
    #[serde(deserialize_with = "null_as_default")]
    pub run_id: String,
}

impl HistoryEntry {
    pub fn time_label(&self) -> String {
        match &self.time {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}
