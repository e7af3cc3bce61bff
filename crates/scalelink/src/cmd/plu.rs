use std::path::Path;

use scalelink_codec::{PluEntry, PluRecord};
use scalelink_session::{ScaleClient, ScaleError};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cmd::{LinkArgs, PluCommand};
use crate::exit::{io_error, scale_error, CliError, CliResult, DATA_INVALID, FAILURE, SUCCESS};
use crate::output::{money, new_table, optional, print_json, OutputFormat};

/// Upload file: a single entry or a list of entries.
#[derive(Deserialize)]
#[serde(untagged)]
enum PluDocument {
    Many(Vec<PluEntry>),
    One(Box<PluEntry>),
}

impl PluDocument {
    fn into_entries(self) -> Vec<PluEntry> {
        match self {
            PluDocument::Many(entries) => entries,
            PluDocument::One(entry) => vec![*entry],
        }
    }
}

#[derive(Serialize)]
struct ReadOutput<'a> {
    records: &'a [PluRecord],
    missing: &'a [u32],
}

#[derive(Serialize)]
struct Rejected {
    id: u32,
    error: String,
}

#[derive(Serialize)]
struct UploadOutput {
    uploaded: usize,
    total: usize,
    rejected: Vec<Rejected>,
}

#[derive(Serialize)]
struct DeleteOutput {
    deleted: u32,
}

pub fn run(command: PluCommand, link: &LinkArgs, format: OutputFormat) -> CliResult<i32> {
    match command {
        PluCommand::Get { ids } => {
            let mut client = link.connect()?;
            let code = get(&mut client, &ids, format)?;
            client.disconnect();
            Ok(code)
        }
        PluCommand::Put { file } => {
            let entries = load_entries(&file)?;
            let mut client = link.connect()?;
            let code = put(&mut client, &entries, format)?;
            client.disconnect();
            Ok(code)
        }
        PluCommand::Delete { id } => {
            let mut client = link.connect()?;
            client
                .delete_plu(id)
                .map_err(|err| scale_error(&format!("PLU {id} delete failed"), err))?;
            client.disconnect();
            match format {
                OutputFormat::Json => print_json(&DeleteOutput { deleted: id }),
                OutputFormat::Table | OutputFormat::Pretty => println!("PLU {id} deleted"),
            }
            Ok(SUCCESS)
        }
    }
}

/// Failures that say nothing about the scale as a whole.
fn is_per_record(err: &ScaleError) -> bool {
    matches!(
        err,
        ScaleError::EmptyResult | ScaleError::DeviceError { .. } | ScaleError::Validation(_)
    )
}

fn get(client: &mut ScaleClient, ids: &[u32], format: OutputFormat) -> CliResult<i32> {
    let mut records = Vec::with_capacity(ids.len());
    let mut missing = Vec::new();

    for &id in ids {
        match client.get_plu(id) {
            Ok(record) => records.push(record),
            Err(err) if is_per_record(&err) => {
                warn!(id, error = %err, "PLU not read");
                missing.push(id);
            }
            Err(err) => return Err(scale_error(&format!("PLU {id} read failed"), err)),
        }
    }

    print_records(&records, &missing, format);
    Ok(if missing.is_empty() { SUCCESS } else { FAILURE })
}

fn put(client: &mut ScaleClient, entries: &[PluEntry], format: OutputFormat) -> CliResult<i32> {
    let mut uploaded = 0usize;
    let mut rejected = Vec::new();

    for entry in entries {
        match client.create_plu(entry) {
            Ok(()) => uploaded += 1,
            Err(err) if is_per_record(&err) => {
                warn!(id = entry.id, error = %err, "PLU rejected");
                rejected.push(Rejected {
                    id: entry.id,
                    error: err.to_string(),
                });
            }
            Err(err) => return Err(scale_error(&format!("PLU {} upload failed", entry.id), err)),
        }
    }

    let out = UploadOutput {
        uploaded,
        total: entries.len(),
        rejected,
    };
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("uploaded {}/{} PLU", out.uploaded, out.total);
            for r in &out.rejected {
                println!("  {}: {}", r.id, r.error);
            }
        }
    }
    Ok(if out.rejected.is_empty() { SUCCESS } else { FAILURE })
}

fn load_entries(path: &Path) -> CliResult<Vec<PluEntry>> {
    let text = std::fs::read_to_string(path).map_err(|err| read_error(path, err))?;
    parse_entries(&text)
        .map_err(|err| CliError::new(DATA_INVALID, format!("{}: {err}", path.display())))
}

/// Unreadable upload files are bad input, except for permission problems.
fn read_error(path: &Path, err: std::io::Error) -> CliError {
    let context = format!("cannot read {}", path.display());
    match err.kind() {
        std::io::ErrorKind::PermissionDenied => io_error(&context, err),
        _ => CliError::new(DATA_INVALID, format!("{context}: {err}")),
    }
}

fn parse_entries(text: &str) -> serde_json::Result<Vec<PluEntry>> {
    serde_json::from_str::<PluDocument>(text).map(PluDocument::into_entries)
}

fn print_records(records: &[PluRecord], missing: &[u32], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&ReadOutput { records, missing }),
        OutputFormat::Table => {
            let mut table = new_table(&[
                "PLU", "CODE", "NAME", "PRICE", "EXPIRY", "TARE", "GROUP", "SALES", "LAST RESET",
            ]);
            for r in records {
                table.add_row(vec![
                    r.id.to_string(),
                    r.code.clone(),
                    display_name(r),
                    money(r.price),
                    r.expiry.to_string(),
                    r.tare.to_string(),
                    r.group_code.clone(),
                    r.sales_count.to_string(),
                    optional(r.last_reset),
                ]);
            }
            println!("{table}");
            if !missing.is_empty() {
                println!("not found: {}", join_ids(missing));
            }
        }
        OutputFormat::Pretty => {
            for r in records {
                println!(
                    "{} [{}] {} price={} expiry={} sales={}",
                    r.id,
                    r.code,
                    display_name(r),
                    money(r.price),
                    r.expiry,
                    r.sales_count
                );
            }
            if !missing.is_empty() {
                println!("not found: {}", join_ids(missing));
            }
        }
    }
}

fn display_name(record: &PluRecord) -> String {
    if record.name2.is_empty() {
        record.name1.clone()
    } else {
        format!("{} {}", record.name1, record.name2)
    }
}

fn join_ids(ids: &[u32]) -> String {
    ids.iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
