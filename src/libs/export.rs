//! File export of listings and reports.
//!
//! Anything that renders as a table ([`Tabular`]) and serializes can be
//! written as CSV, pretty JSON or an Excel workbook with a bold header row.

use super::view::Tabular;
use anyhow::Result;
use chrono::Local;
use rust_xlsxwriter::{Color, Format, Workbook};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    /// Comma-separated values
    Csv,
    /// Pretty-printed JSON array
    Json,
    /// Excel workbook (.xlsx)
    Excel,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Excel => "xlsx",
        }
    }
}

pub struct Exporter {
    format: ExportFormat,
    output_path: PathBuf,
}

impl Exporter {
    /// Without an explicit path the file is named `registrar_<name>_<timestamp>`.
    pub fn new(format: ExportFormat, name: &str, output_path: Option<PathBuf>) -> Self {
        let output_path = output_path.unwrap_or_else(|| {
            PathBuf::from(format!(
                "registrar_{}_{}.{}",
                name,
                Local::now().format("%Y%m%d_%H%M%S"),
                format.extension()
            ))
        });
        Self { format, output_path }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn export<T: Tabular + Serialize>(&self, sheet: &str, rows: &[T]) -> Result<()> {
        match self.format {
            ExportFormat::Csv => self.write_csv(rows)?,
            ExportFormat::Json => self.write_json(rows)?,
            ExportFormat::Excel => self.write_excel(sheet, rows)?,
        }
        tracing::info!(path = %self.output_path.display(), rows = rows.len(), "export written");
        Ok(())
    }

    fn write_csv<T: Tabular>(&self, rows: &[T]) -> Result<()> {
        let mut wtr = csv::Writer::from_path(&self.output_path)?;
        wtr.write_record(T::headers())?;
        for row in rows {
            wtr.write_record(row.cells())?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_json<T: Serialize>(&self, rows: &[T]) -> Result<()> {
        let json = serde_json::to_string_pretty(rows)?;
        File::create(&self.output_path)?.write_all(json.as_bytes())?;
        Ok(())
    }

    fn write_excel<T: Tabular>(&self, sheet: &str, rows: &[T]) -> Result<()> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet)?;

        let header_format = Format::new().set_bold().set_background_color(Color::Gray);
        for (col, header) in T::headers().iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
        }

        for (i, row) in rows.iter().enumerate() {
            let r = (i + 1) as u32;
            for (col, value) in row.cells().iter().enumerate() {
                match value.parse::<f64>() {
                    Ok(number) => worksheet.write_number(r, col as u16, number)?,
                    Err(_) => worksheet.write_string(r, col as u16, value)?,
                };
            }
        }

        worksheet.autofit();
        workbook.save(&self.output_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Serialize)]
    struct Line {
        code: String,
        value: u32,
    }

    impl Tabular for Line {
        fn headers() -> Vec<&'static str> {
            vec!["CODE", "VALUE"]
        }

        fn cells(&self) -> Vec<String> {
            vec![self.code.clone(), self.value.to_string()]
        }
    }

    fn lines() -> Vec<Line> {
        vec![
            Line {
                code: "BCA".into(),
                value: 3,
            },
            Line {
                code: "BBA".into(),
                value: 2,
            },
        ]
    }

    #[test]
    fn csv_has_header_row() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        Exporter::new(ExportFormat::Csv, "lines", Some(path.clone())).export("Lines", &lines()).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(text, "CODE,VALUE\nBCA,3\nBBA,2\n");
    }

    #[test]
    fn json_is_an_array_of_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        Exporter::new(ExportFormat::Json, "lines", Some(path.clone())).export("Lines", &lines()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value[1]["code"], "BBA");
    }

    #[test]
    fn excel_file_is_written() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.xlsx");
        Exporter::new(ExportFormat::Excel, "lines", Some(path.clone())).export("Lines", &lines()).unwrap();
        assert!(std::fs::metadata(path).unwrap().len() > 0);
    }

    #[test]
    fn default_name_uses_extension() {
        let exporter = Exporter::new(ExportFormat::Excel, "students", None);
        let name = exporter.output_path().to_string_lossy().to_string();
        assert!(name.starts_with("registrar_students_"));
        assert!(name.ends_with(".xlsx"));
    }
}
