use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use scalelink_codec::LiveStatus;
use scalelink_session::{ReconnectOutcome, ScaleClient};
use tracing::{info, warn};

use crate::cmd::{parse_duration, LinkArgs, StatusArgs};
use crate::exit::{scale_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{money, new_table, print_json, OutputFormat};

/// Granularity of the interruptible sleep between readings.
const TICK: Duration = Duration::from_millis(100);

pub fn run(args: StatusArgs, link: &LinkArgs, format: OutputFormat) -> CliResult<i32> {
    if !args.watch {
        let mut client = link.connect()?;
        let status = client
            .get_status()
            .map_err(|err| scale_error("status read failed", err))?;
        client.disconnect();
        print_status(&status, format);
        return Ok(SUCCESS);
    }

    let interval = parse_duration(&args.interval)?;
    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut client = ScaleClient::serial(link.config()?);
    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        if !client.is_ready() {
            reconnect(&mut client);
        }

        if client.is_ready() {
            match client.get_status() {
                Ok(status) => {
                    print_status(&status, format);
                    printed = printed.saturating_add(1);
                    if args.count.is_some_and(|count| printed >= count) {
                        break;
                    }
                }
                Err(err) => warn!(error = %err, "status read failed"),
            }
        }

        sleep_while(&running, interval);
    }

    client.disconnect();
    Ok(SUCCESS)
}

fn reconnect(client: &mut ScaleClient) {
    match client.try_reconnect() {
        ReconnectOutcome::NotYet => {}
        ReconnectOutcome::Connected => info!("scale connected"),
        ReconnectOutcome::Failed { attempts, error } => {
            warn!(attempts, error = %error, "scale unavailable");
        }
    }
}

fn sleep_while(running: &AtomicBool, total: Duration) {
    let deadline = Instant::now() + total;
    while running.load(Ordering::SeqCst) {
        let left = deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            return;
        }
        thread::sleep(left.min(TICK));
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

pub fn print_status(status: &LiveStatus, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(status),
        OutputFormat::Table => {
            let mut table = new_table(&["WEIGHT", "PRICE", "SUM", "PLU", "FLAGS"]);
            table.add_row(vec![
                status.weight.to_string(),
                money(status.price),
                money(status.sum),
                status.plu_number.to_string(),
                flag_list(status),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "weight={} price={} sum={} plu={} flags={}",
                status.weight,
                money(status.price),
                money(status.sum),
                status.plu_number,
                flag_list(status)
            );
        }
    }
}

fn flag_list(status: &LiveStatus) -> String {
    let flags = &status.flags;
    let names: Vec<&str> = [
        (flags.stable_weight, "stable"),
        (flags.zero_weight, "zero"),
        (flags.tare_mode, "tare"),
        (flags.dual_range, "dual-range"),
        (flags.overload, "overload"),
        (flags.minus_sign, "minus"),
    ]
    .into_iter()
    .filter_map(|(set, name)| set.then_some(name))
    .collect();

    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(",")
    }
}
