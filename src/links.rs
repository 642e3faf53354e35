use crate::models::{CompressionConfig, LinkPayload, LinkSpec};
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Editable list of link requests. Never empty: removing the last item
/// leaves a single blank one behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCollection {
    items: Vec<LinkSpec>,
}

impl Default for LinkCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkCollection {
    pub fn new() -> Self {
        Self {
            items: vec![LinkSpec::default()],
        }
    }

    /// Builds a collection from parsed links, falling back to one blank item.
    pub fn from_specs(specs: Vec<LinkSpec>) -> Self {
        if specs.is_empty() {
            Self::new()
        } else {
            Self { items: specs }
        }
    }

    /// Appends a blank item and returns its index.
    pub fn add(&mut self) -> usize {
        self.items.push(LinkSpec::default());
        self.items.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&LinkSpec> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut LinkSpec> {
        self.items.get_mut(index)
    }

    pub fn remove(&mut self, index: usize) -> Option<LinkSpec> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(index);
        if self.items.is_empty() {
            self.items.push(LinkSpec::default());
        }
        Some(removed)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LinkSpec> {
        self.items.iter()
    }

    /// Items with a URL, with url and folder trimmed.
    pub fn specs(&self) -> Vec<LinkSpec> {
        self.items
            .iter()
            .filter(|item| !item.url.trim().is_empty())
            .map(|item| LinkSpec {
                url: item.url.trim().to_string(),
                folder: item.folder.trim().to_string(),
                ..item.clone()
            })
            .collect()
    }

    /// Wire records for submission. Extension changes are switched off while
    /// compression is enabled since the archive decides the extension.
    pub fn payloads(&self, compression: &CompressionConfig) -> Vec<LinkPayload> {
        self.specs()
            .into_iter()
            .map(|mut spec| {
                if compression.enabled {
                    spec.allow_extension_change = false;
                }
                LinkPayload {
                    rename: spec.rename(),
                    url: spec.url,
                    folder: spec.folder,
                    allow_ext: spec.allow_extension_change,
                    notes: spec.notes,
                    rename_base: spec.rename_base,
                    rename_ext: spec.rename_ext,
                }
            })
            .collect()
    }
}

/// Reads links from a JSON array (`.json`) or a tab separated file with the
/// columns url, folder, rename_base, rename_ext, allow_ext, notes.
pub fn parse_link_file(path: &Path) -> Result<Vec<LinkSpec>> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        let content = fs::read_to_string(path).context("Failed to read link file")?;
        return serde_json::from_str(&content).context("Failed to parse link file");
    }

    let file = File::open(path).context("Failed to open link file")?;
    let reader = BufReader::new(file);

    let mut entries = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read line")?;

        // Skip header
        if idx == 0 && line.starts_with("url") {
            continue;
        }
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        entries.push(parse_link_line(&line));
    }

    Ok(entries)
}

fn parse_link_line(line: &str) -> LinkSpec {
    let parts: Vec<&str> = line.split('\t').collect();
    let column = |i: usize| parts.get(i).map(|s| s.trim().to_string()).unwrap_or_default();

    LinkSpec {
        url: column(0),
        folder: column(1),
        rename_base: column(2),
        rename_ext: column(3),
        allow_extension_change: matches!(
            column(4).to_lowercase().as_str(),
            "true" | "yes" | "1"
        ),
        notes: column(5),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArchiveType;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn new_collection_has_one_blank_item() {
        let links = LinkCollection::new();
        assert_eq!(links.len(), 1);
        assert_eq!(links.get(0), Some(&LinkSpec::default()));
    }

    #[test]
    fn removing_last_item_recreates_blank() {
        let mut links = LinkCollection::new();
        links.get_mut(0).unwrap().url = "https://x.com/a.zip".into();

        let removed = links.remove(0).unwrap();
        assert_eq!(removed.url, "https://x.com/a.zip");
        assert_eq!(links.len(), 1);
        assert_eq!(links.get(0), Some(&LinkSpec::default()));
    }

    #[test]
    fn remove_keeps_other_items_in_order() {
        let mut links = LinkCollection::new();
        let second = links.add();
        let third = links.add();
        links.get_mut(second).unwrap().url = "b".into();
        links.get_mut(third).unwrap().url = "c".into();

        links.remove(0);
        let urls: Vec<_> = links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, vec!["b", "c"]);
        assert!(links.remove(7).is_none());
    }

    #[test]
    fn specs_skip_blank_urls_and_trim() {
        let links = LinkCollection::from_specs(vec![
            LinkSpec::new("   "),
            LinkSpec {
                url: " https://x.com/a.zip ".into(),
                folder: " roms/14 ".into(),
                ..LinkSpec::default()
            },
        ]);
        let specs = links.specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].url, "https://x.com/a.zip");
        assert_eq!(specs[0].folder, "roms/14");
    }

    #[test]
    fn payloads_disable_extension_change_under_compression() {
        let links = LinkCollection::from_specs(vec![LinkSpec {
            url: "https://x.com/a.bin".into(),
            rename_base: "fw".into(),
            rename_ext: "img".into(),
            allow_extension_change: true,
            ..LinkSpec::default()
        }]);

        let plain = links.payloads(&CompressionConfig::default());
        assert!(plain[0].allow_ext);
        assert_eq!(plain[0].rename, "fw.img");

        let compression = CompressionConfig {
            enabled: true,
            archive_type: ArchiveType::SevenZip,
            ..CompressionConfig::default()
        };
        let packed = links.payloads(&compression);
        assert!(!packed[0].allow_ext);
        assert_eq!(packed[0].rename, "fw");
        assert_eq!(packed[0].rename_ext, "img");
    }

    #[test]
    fn parses_tab_separated_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "url\tfolder\trename_base\trename_ext\tallow_ext\tnotes").unwrap();
        writeln!(file, "https://x.com/a.pdf\tdocs").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "# skipped").unwrap();
        writeln!(file, "https://y.com/b.bin\tfw\tboot\timg\ttrue\tnightly").unwrap();
        file.flush().unwrap();

        let specs = parse_link_file(file.path()).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].folder, "docs");
        assert!(specs[0].rename_base.is_empty());
        assert_eq!(specs[1].rename_base, "boot");
        assert_eq!(specs[1].rename_ext, "img");
        assert!(specs[1].allow_extension_change);
        assert_eq!(specs[1].notes, "nightly");
    }

    #[test]
    fn parses_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[{{"url":"https://x.com/a.pdf","folder":"docs"}},
               {{"url":"https://y.com/b.bin","rename_base":"boot",
                 "rename_ext":"img","allow_ext":true}}]"#
        )
        .unwrap();
        file.flush().unwrap();

        let specs = parse_link_file(file.path()).unwrap();
        assert_eq!(specs.len(), 2);
        assert!(specs[1].allow_extension_change);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = parse_link_file(Path::new("/definitely/not/here.tsv")).unwrap_err();
        assert!(err.to_string().contains("Failed to open link file"));
    }
}
