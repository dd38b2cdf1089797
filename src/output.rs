//! Progress and instruction formatting for the b2t CLI.
//!
//! User-facing progress goes to an injected writer so that orchestration
//! code stays testable; formatting helpers here keep the wording in one
//! place. Terminal failure states always end with printed recovery
//! instructions, never a silent exit.

use crate::manifest::DataManifest;
use crate::verify::DirectoryReport;
use camino::Utf8Path;
use std::io::Write;

const BYTES_PER_MIB: u64 = 1024 * 1024;

/// Write a line to the injected stderr handle.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort reporting; ignore write failures.
    }
}

/// Render a byte count as megabytes with two decimal places.
///
/// # Examples
///
/// ```
/// use b2t::output::format_size_mb;
///
/// assert_eq!(format_size_mb(1_572_864), "1.50 MB");
/// assert_eq!(format_size_mb(0), "0.00 MB");
/// ```
#[must_use]
pub fn format_size_mb(bytes: u64) -> String {
    let hundredths = bytes * 100 / BYTES_PER_MIB;
    format!("{}.{:02} MB", hundredths / 100, hundredths % 100)
}

/// Lines listing each present file with its size.
#[must_use]
pub fn present_file_listing(report: &DirectoryReport) -> Vec<String> {
    report
        .present()
        .iter()
        .map(|status| {
            let size = status.size_bytes.map_or_else(String::new, format_size_mb);
            format!("  {}: {size}", status.name)
        })
        .collect()
}

/// Summary of a partially populated data directory.
///
/// Produces the "Found N/M files" line plus a listing of present files and
/// a `Missing:` line, matching what users see before a fetch starts.
#[must_use]
pub fn partial_state_summary(report: &DirectoryReport, manifest: &DataManifest) -> Vec<String> {
    let mut lines = vec![format!(
        "Found {}/{} data files:",
        report.present().len(),
        manifest.len()
    )];
    lines.extend(present_file_listing(report));
    lines.push(format!("Missing: {}", report.missing().join(", ")));
    lines
}

/// Instructions for acquiring the primary-source credential file.
#[must_use]
pub fn credential_instructions(path: &Utf8Path) -> String {
    format!(
        concat!(
            "Kaggle credentials not found.\n",
            "Download kaggle.json from https://www.kaggle.com/settings and place it at:\n",
            "  {}"
        ),
        path
    )
}

/// Manual-download instructions shown when no source could satisfy the
/// manifest.
///
/// This is a deliberate, user-facing terminal state: the run ends with a
/// non-zero exit, and these instructions are the recovery path.
#[derive(Debug)]
pub struct ManualInstructions<'a> {
    /// Directory the files must be placed in.
    pub data_dir: &'a Utf8Path,
    /// The required filenames.
    pub manifest: &'a DataManifest,
    /// Competition identifier on the primary source.
    pub competition: &'a str,
    /// Secondary-source landing page URL.
    pub secondary_url: &'a str,
}

impl ManualInstructions<'_> {
    /// Format the instructions for display.
    #[must_use]
    pub fn display_text(&self) -> String {
        format!(
            concat!(
                "MANUAL DOWNLOAD REQUIRED\n",
                "\n",
                "Download the data files manually:\n",
                "\n",
                "1. Kaggle competition page:\n",
                "   https://www.kaggle.com/competitions/{}/data\n",
                "   - Accept the competition rules\n",
                "   - Download: {}\n",
                "\n",
                "2. Or from Dryad:\n",
                "   {}\n",
                "\n",
                "3. Place the files in:\n",
                "   {}\n",
                "\n",
                "Then run `b2t fetch` again to verify."
            ),
            self.competition, self.manifest, self.secondary_url, self.data_dir
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::verify_directory;
    use camino::Utf8PathBuf;
    use rstest::rstest;

    #[rstest]
    #[case::exact_half(1_572_864, "1.50 MB")]
    #[case::zero(0, "0.00 MB")]
    #[case::one_mib(1_048_576, "1.00 MB")]
    #[case::sub_mib(524_288, "0.50 MB")]
    fn format_size_mb_rounds_down_to_hundredths(#[case] bytes: u64, #[case] expected: &str) {
        assert_eq!(format_size_mb(bytes), expected);
    }

    #[test]
    fn partial_state_summary_names_missing_files() {
        let temp = tempfile::tempdir().expect("temp dir");
        let dir = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
        std::fs::write(dir.join("a.bin").as_std_path(), b"data").expect("write file");
        let manifest = DataManifest::new(["a.bin", "b.bin", "c.bin"]);

        let report = verify_directory(&dir, &manifest);
        let lines = partial_state_summary(&report, &manifest);

        assert_eq!(lines.first().map(String::as_str), Some("Found 1/3 data files:"));
        assert_eq!(lines.last().map(String::as_str), Some("Missing: b.bin, c.bin"));
    }

    #[test]
    fn credential_instructions_include_path_and_settings_url() {
        let text = credential_instructions(Utf8Path::new("/home/user/.kaggle/kaggle.json"));
        assert!(text.contains("/home/user/.kaggle/kaggle.json"));
        assert!(text.contains("kaggle.com/settings"));
    }

    #[test]
    fn manual_instructions_cover_both_sources_and_target() {
        let manifest = DataManifest::competition();
        let instructions = ManualInstructions {
            data_dir: Utf8Path::new("/work/data"),
            manifest: &manifest,
            competition: "brain-to-text-25",
            secondary_url: "https://datadryad.org/dataset/doi:10.5061/dryad.dncjsxm85",
        };

        let text = instructions.display_text();
        assert!(text.contains("brain-to-text-25"));
        assert!(text.contains("datadryad.org"));
        assert!(text.contains("/work/data"));
        assert!(text.contains("data_train.hdf5"));
    }
}
