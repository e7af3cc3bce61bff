use scalelink_codec::TotalSales;
use serde::Serialize;

use crate::cmd::{LinkArgs, SalesCommand};
use crate::exit::{scale_error, CliResult, SUCCESS};
use crate::output::{money, new_table, print_json, OutputFormat};

#[derive(Serialize)]
struct ResetOutput {
    reset: bool,
}

pub fn run(command: SalesCommand, link: &LinkArgs, format: OutputFormat) -> CliResult<i32> {
    let mut client = link.connect()?;
    match command {
        SalesCommand::Get => {
            let totals = client
                .get_total_sales()
                .map_err(|err| scale_error("total sales read failed", err))?;
            print_totals(&totals, format);
        }
        SalesCommand::Reset => {
            client
                .reset_total_sales()
                .map_err(|err| scale_error("total sales reset failed", err))?;
            match format {
                OutputFormat::Json => print_json(&ResetOutput { reset: true }),
                OutputFormat::Table | OutputFormat::Pretty => println!("total sales reset"),
            }
        }
    }
    client.disconnect();
    Ok(SUCCESS)
}

fn print_totals(totals: &TotalSales, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(totals),
        OutputFormat::Table => {
            let mut table = new_table(&["COUNTER", "VALUE"]);
            for (name, value) in rows(totals) {
                table.add_row(vec![name.to_string(), value]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (name, value) in rows(totals) {
                println!("{name:<16} {value}");
            }
        }
    }
}

fn rows(totals: &TotalSales) -> Vec<(&'static str, String)> {
    vec![
        ("mileage", totals.mileage.to_string()),
        ("labels", totals.label_count.to_string()),
        ("total sum", money(totals.total_sum)),
        ("sales", totals.sales_count.to_string()),
        ("total weight", totals.total_weight.to_string()),
        ("PLU sum", money(totals.plu_sum)),
        ("PLU sales", totals.plu_sales_count.to_string()),
        ("PLU weight", totals.plu_weight.to_string()),
        ("free PLU slots", totals.free_plu.to_string()),
        ("free messages", totals.free_messages.to_string()),
    ]
}
