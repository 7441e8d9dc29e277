use super::InputTable;
use crate::Result;
use crate::facts::ResultSet;
use crate::facts::compliance::ComplianceReport;
use crate::facts::downloads::DownloadRecord;
use chrono::NaiveDate;
use csv::Writer;
use std::io::Write;

const README_COLUMN: &str = "readme";

const COMPLIANCE_HEADERS: [&str; 7] = [
    "html_url",
    "howfairis_repository",
    "howfairis_license",
    "howfairis_registry",
    "howfairis_citation",
    "howfairis_checklist",
    "date",
];

const DOWNLOAD_HEADERS: [&str; 5] = ["repository_name", "owner", "registry", "last_month", "date"];

/// Write every input row with its README text in the `readme` column.
///
/// Rows without a result get an empty cell. An existing `readme` column is overwritten in place.
pub fn write_readme<W: Write>(table: &InputTable, readmes: &ResultSet<String>, writer: W) -> Result<()> {
    let mut csv_writer = Writer::from_writer(writer);

    let existing = table.column(README_COLUMN);
    let mut header: Vec<&str> = table.headers().iter().map(String::as_str).collect();
    if existing.is_none() {
        header.push(README_COLUMN);
    }
    csv_writer.write_record(&header)?;

    for row in 0..table.len() {
        let readme = readmes.get(row).map_or("", String::as_str);
        let mut cells: Vec<&str> = table.row_cells(row).collect();
        match existing {
            Some(column) => cells[column] = readme,
            None => cells.push(readme),
        }
        csv_writer.write_record(&cells)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write one line per repository with its compliance indicators.
pub fn write_compliance<W: Write>(reports: &ResultSet<ComplianceReport>, date: NaiveDate, writer: W) -> Result<()> {
    let mut csv_writer = Writer::from_writer(writer);
    csv_writer.write_record(COMPLIANCE_HEADERS)?;

    let date = date.format("%Y-%m-%d").to_string();
    for (_, report) in reports.iter() {
        let i = &report.indicators;
        csv_writer.write_record([
            report.url.as_str(),
            flag(i.repository),
            flag(i.license),
            flag(i.registry),
            flag(i.citation),
            flag(i.checklist),
            date.as_str(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write one line per package with last month's download count.
pub fn write_downloads<W: Write>(records: &[DownloadRecord], date: NaiveDate, writer: W) -> Result<()> {
    let mut csv_writer = Writer::from_writer(writer);
    csv_writer.write_record(DOWNLOAD_HEADERS)?;

    let date = date.format("%Y-%m-%d").to_string();
    for record in records {
        csv_writer.write_record([
            record.repository_name.as_str(),
            record.owner.as_str(),
            record.registry.to_string().as_str(),
            record.last_month.to_string().as_str(),
            date.as_str(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

// Spelled the way the downstream analysis notebooks expect.
const fn flag(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}
