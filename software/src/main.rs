use anyhow::{Context, Result, bail};
use dacctl::console::{Console, report};
use dacctl::control::Controller;
use dacctl::link::Link;
use dacctl::settings::{LinkSettings, UploadSettings};
use dacctl::{convert, monitor};
use log::warn;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

const USAGE: &str = "\
Usage: dacctl <command> [options]

Commands:
  convert <csv>     convert a CSV voltage log into the binary waveform
  upload            upload the binary waveform to the board
  rate <hz>         set sample rate
  channels <n>      set channel count
  single <index>    select single channel, 0-39
  start | stop      start or stop streaming
  status            query board status
  console           interactive session with live board output

Options:
  --port <name>       serial port of the board
  --baud <n>          baud rate (default 921600)
  --timeout-ms <n>    serial timeout (default 1000)
  --pace-ms <n>       pause between upload chunks (default 2)
  --out, --bin <file> binary waveform path (default all_channels.bin)
  --listen-ms <n>     print board output for this long after a command
";

fn open_controller(port: Option<String>, baud: Option<u32>, timeout: Option<Duration>) -> Result<Controller> {
    let port = port.context("this command needs --port <name>")?;
    let mut settings = LinkSettings::new(port);
    if let Some(baud) = baud {
        settings.baud = baud;
    }
    if let Some(timeout) = timeout {
        settings.timeout = timeout;
    }
    Ok(Controller::new(Link::open(&settings)?))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let mut pargs = pico_args::Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{}", USAGE);
        return Ok(());
    }

    let Some(command) = pargs.subcommand()? else {
        print!("{}", USAGE);
        bail!("no command given");
    };

    let port: Option<String> = pargs.opt_value_from_str("--port")?;
    let baud: Option<u32> = pargs.opt_value_from_str("--baud")?;
    let timeout = pargs
        .opt_value_from_str("--timeout-ms")?
        .map(Duration::from_millis);
    let listen = pargs
        .opt_value_from_str("--listen-ms")?
        .map_or(Duration::ZERO, Duration::from_millis);

    let mut upload_settings = UploadSettings::default();
    if let Some(ms) = pargs.opt_value_from_str("--pace-ms")? {
        upload_settings.pacing = Duration::from_millis(ms);
    }
    let out: Option<String> = pargs.opt_value_from_str("--out")?;
    let bin: Option<String> = pargs.opt_value_from_str("--bin")?;
    if let Some(path) = out.or(bin) {
        upload_settings.source = PathBuf::from(path);
    }

    match command.as_str() {
        "convert" => {
            let csv_path: String = pargs.free_from_str().context("convert needs a CSV file")?;
            warn_unused(pargs);
            let report = convert::convert_file(Path::new(&csv_path), &upload_settings.source)?;
            println!(
                "BIN file saved as: {} ({} rows, {} bytes)",
                upload_settings.source.display(),
                report.rows_written,
                report.bytes_written
            );
        }
        "upload" => {
            warn_unused(pargs);
            let mut ctl = open_controller(port, baud, timeout)?;
            let report = ctl.upload(&upload_settings.source, upload_settings.pacing, |p| {
                print!("\rUpload {:3}%", p);
                let _ = io::stdout().flush();
            })?;
            println!();
            println!("Upload complete, {} bytes in {} chunks", report.bytes, report.chunks);
            monitor::listen(&mut ctl, listen, &mut io::stdout());
        }
        "rate" | "channels" | "single" => {
            let value: String = pargs
                .free_from_str()
                .with_context(|| format!("{} needs a value", command))?;
            warn_unused(pargs);
            let mut ctl = open_controller(port, baud, timeout)?;
            match command.as_str() {
                "rate" => report(ctl.set_sample_rate(&value)?, format!("Sample rate set to {} Hz", value)),
                "channels" => report(ctl.set_channel_count(&value)?, format!("Channel count set to {}", value)),
                _ => report(ctl.set_single_channel(&value)?, format!("Set to channel {}", value)),
            }
            monitor::listen(&mut ctl, listen, &mut io::stdout());
        }
        "start" | "stop" | "status" => {
            warn_unused(pargs);
            let mut ctl = open_controller(port, baud, timeout)?;
            match command.as_str() {
                "start" => report(ctl.start()?, "Streaming started".into()),
                "stop" => report(ctl.stop()?, "Streaming stopped".into()),
                _ => {
                    ctl.status()?;
                }
            }
            monitor::listen(&mut ctl, listen, &mut io::stdout());
        }
        "console" => {
            warn_unused(pargs);
            let ctl = open_controller(port, baud, timeout)?;
            Console::new(ctl, upload_settings)?.run(io::stdin().lock())?;
        }
        other => {
            print!("{}", USAGE);
            bail!("unknown command '{}'", other);
        }
    }

    Ok(())
}

fn warn_unused(pargs: pico_args::Arguments) {
    let rest = pargs.finish();
    if !rest.is_empty() {
        warn!("Ignoring unused arguments: {:?}", rest);
    }
}
