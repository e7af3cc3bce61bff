use serde::Serialize;

use crate::cmd::LinkArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{new_table, print_json, OutputFormat};

#[derive(Serialize)]
struct ProbeOutput {
    port: String,
    baud_rate: u32,
    state: String,
    ready: bool,
}

pub fn run(link: &LinkArgs, format: OutputFormat) -> CliResult<i32> {
    let mut client = link.connect()?;
    let config = client.session().config();
    let out = ProbeOutput {
        port: config.serial.port.clone(),
        baud_rate: config.serial.baud_rate,
        state: client.state().to_string(),
        ready: client.is_ready(),
    };
    client.disconnect();

    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => {
            let mut table = new_table(&["PORT", "BAUD", "STATE"]);
            table.add_row(vec![out.port, out.baud_rate.to_string(), out.state]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{} @ {} baud: {}", out.port, out.baud_rate, out.state),
    }
    Ok(SUCCESS)
}
