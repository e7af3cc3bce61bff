use scalelink_codec::SettingsBlock;

use crate::cmd::{LinkArgs, SettingsArgs, SettingsTarget};
use crate::exit::{scale_error, CliResult, SUCCESS};
use crate::output::{new_table, print_json, OutputFormat};

pub fn run(args: SettingsArgs, link: &LinkArgs, format: OutputFormat) -> CliResult<i32> {
    let mut client = link.connect()?;
    let block = match args.target {
        SettingsTarget::User => client.get_user_settings(),
        SettingsTarget::Factory => client.get_factory_settings(),
    }
    .map_err(|err| scale_error("settings read failed", err))?;
    client.disconnect();

    print_block(&block, format);
    Ok(SUCCESS)
}

fn print_block(block: &SettingsBlock, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(block),
        OutputFormat::Table => {
            let mut table = new_table(&["BLOCK", "SIZE", "BYTES"]);
            table.add_row(vec![
                format!("{:?}", block.kind).to_lowercase(),
                block.raw.len().to_string(),
                hex::encode(&block.raw),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{}: {}",
                format!("{:?}", block.kind).to_lowercase(),
                hex::encode(&block.raw)
            );
        }
    }
}
