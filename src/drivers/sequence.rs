use std::fs;
use std::path::Path;
use crate::drivers::CaptureError;
/// Which directory entries count as earlier artifacts of one kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameFilter {
    pub prefix: Option<String>,
    pub suffix: Option<String>,
}
impl NameFilter {
    /// Matches `<stem>_*.<extension>`.
    pub fn artifact(stem: &str, extension: &str) -> Self {
        Self {
            prefix: Some(format!("{stem}_")),
            suffix: Some(format!(".{extension}")),
        }
    }
    pub fn matches(&self, name: &str) -> bool {
        let prefix_ok = self.prefix.as_deref().map_or(true, |p| name.starts_with(p));
        let suffix_ok = self.suffix.as_deref().map_or(true, |s| name.ends_with(s));
        prefix_ok && suffix_ok
    }
}
/// Numeric token between the last `_` and the extension, e.g. `7` for `run_b_0007.png`.
pub fn sequence_token(name: &str) -> Option<u32> {
    let stem = match name.rfind('.') {
        Some(dot) => &name[..dot],
        None => name,
    };
    let (_, token) = stem.rsplit_once('_')?;
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}
/// Scans `folder` and returns one past the highest sequence number in use, or 1.
///
/// Nothing is cached between calls, so numbering survives restarts. Two writers racing
/// on the same folder can still pick the same number; the export worker serializes
/// this process's exports to avoid that.
pub fn next_sequence(folder: &Path, filter: &NameFilter) -> Result<u32, CaptureError> {
    let entries = fs::read_dir(folder).map_err(|source| CaptureError::FolderScan {
        folder: folder.to_path_buf(),
        source,
    })?;
    let mut highest = 0u32;
    for entry in entries {
        let entry = entry.map_err(|source| CaptureError::FolderScan {
            folder: folder.to_path_buf(),
            source,
        })?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !filter.matches(name) {
            continue;
        }
        if let Some(seq) = sequence_token(name) {
            highest = highest.max(seq);
        }
    }
    Ok(highest.saturating_add(1))
}
pub fn artifact_name(stem: &str, sequence: u32, extension: &str) -> String {
    format!("{stem}_{sequence:04}.{extension}")
}
#[cfg(test)]
mod tests {
    use super::*;
    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }
    #[test]
    fn empty_folder_starts_at_one() {
        let dir = tempfile::tempdir().unwrap();
        let filter = NameFilter::artifact("dados", "csv");
        assert_eq!(next_sequence(dir.path(), &filter).unwrap(), 1);
    }
    #[test]
    fn continues_after_highest_number_despite_gaps() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["dados_0001.csv", "dados_0003.csv", "dados_0004.csv"] {
            touch(dir.path(), name);
        }
        let filter = NameFilter::artifact("dados", "csv");
        assert_eq!(next_sequence(dir.path(), &filter).unwrap(), 5);
    }
    #[test]
    fn ignores_other_kinds_and_unnumbered_names() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "dados_0002.csv",
            "dados_final.csv",
            "dados_0009.png",
            "Movimento_0011.png",
            "notes.txt",
        ] {
            touch(dir.path(), name);
        }
        let csv = NameFilter::artifact("dados", "csv");
        assert_eq!(next_sequence(dir.path(), &csv).unwrap(), 3);
        let png = NameFilter {
            prefix: Some("Movimento".into()),
            suffix: None,
        };
        assert_eq!(next_sequence(dir.path(), &png).unwrap(), 12);
        let any_csv = NameFilter {
            prefix: None,
            suffix: Some(".csv".into()),
        };
        assert_eq!(next_sequence(dir.path(), &any_csv).unwrap(), 3);
    }
    #[test]
    fn missing_folder_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = next_sequence(&missing, &NameFilter::artifact("dados", "csv")).unwrap_err();
        assert!(matches!(err, CaptureError::FolderScan { .. }));
    }
    #[test]
    fn token_and_name_formatting() {
        assert_eq!(sequence_token("dados_0042.csv"), Some(42));
        assert_eq!(sequence_token("Mov_a_0007.png"), Some(7));
        assert_eq!(sequence_token("dados_.csv"), None);
        assert_eq!(sequence_token("dados_-1.csv"), None);
        assert_eq!(sequence_token("dados.csv"), None);
        assert_eq!(artifact_name("dados", 1, "csv"), "dados_0001.csv");
        assert_eq!(artifact_name("Movimento", 12345, "png"), "Movimento_12345.png");
    }
}
