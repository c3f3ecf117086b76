//! Interactive console. Commands are read line by line from stdin while a
//! monitor thread prints whatever the board sends back.

use anyhow::{Context, Result, anyhow, bail};
use regex::Regex;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::control::Controller;
use crate::convert;
use crate::link::Dispatch;
use crate::monitor;
use crate::settings::UploadSettings;

const HELP: &str = "\
Commands:
  rate <hz>         set sample rate
  channels <n>      set channel count (1 enables single channel selection)
  single <index>    select single channel, 0-39
  start | stop      start or stop streaming
  status            ask the board for its status
  convert <csv>     convert a CSV voltage log into the binary file
  upload            upload the binary file
  help | quit
";

#[derive(Debug, PartialEq)]
pub enum ConsoleCommand {
    SampleRate(String),
    Channels(String),
    Single(String),
    Start,
    Stop,
    Status,
    Convert(PathBuf),
    Upload,
    Help,
    Quit,
}

pub struct Console {
    controller: Arc<Mutex<Controller>>,
    upload: UploadSettings,
    grammar: Regex,
}

/// Prints `message` if the command went out.
pub fn report(dispatch: Dispatch, message: String) {
    match dispatch {
        Dispatch::Sent => println!("{}", message),
        Dispatch::NotConnected => println!("Not connected, nothing sent"),
    }
}

impl Console {
    pub fn new(controller: Controller, upload: UploadSettings) -> Result<Self> {
        Ok(Self {
            controller: Arc::new(Mutex::new(controller)),
            upload,
            grammar: Regex::new(r"^\s*(\w+)(?:\s+(.+?))?\s*$")?,
        })
    }

    /// Returns `None` for blank lines.
    pub fn parse_line(&self, line: &str) -> Result<Option<ConsoleCommand>> {
        if line.trim().is_empty() {
            return Ok(None);
        }
        let captures = self
            .grammar
            .captures(line)
            .ok_or_else(|| anyhow!("Cannot understand '{}'", line.trim()))?;
        let name = captures.get(1).map_or("", |m| m.as_str());
        let arg = captures.get(2).map(|m| m.as_str().to_string());
        let value = |arg: Option<String>| arg.ok_or_else(|| anyhow!("'{}' needs a value", name));

        let command = match name.to_ascii_lowercase().as_str() {
            "rate" => ConsoleCommand::SampleRate(value(arg)?),
            "channels" => ConsoleCommand::Channels(value(arg)?),
            "single" => ConsoleCommand::Single(value(arg)?),
            "start" => ConsoleCommand::Start,
            "stop" => ConsoleCommand::Stop,
            "status" => ConsoleCommand::Status,
            "convert" => ConsoleCommand::Convert(PathBuf::from(value(arg)?)),
            "upload" => ConsoleCommand::Upload,
            "help" => ConsoleCommand::Help,
            "quit" | "exit" => ConsoleCommand::Quit,
            other => bail!("Unknown command '{}', try 'help'", other),
        };
        Ok(Some(command))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Controller>> {
        self.controller
            .lock()
            .map_err(|_| anyhow!("controller lock poisoned"))
    }

    pub fn execute(&self, command: ConsoleCommand) -> Result<()> {
        match command {
            ConsoleCommand::SampleRate(v) => {
                let dispatch = self.lock()?.set_sample_rate(&v)?;
                report(dispatch, format!("Sample rate set to {} Hz", v));
            }
            ConsoleCommand::Channels(v) => {
                let mut ctl = self.lock()?;
                let dispatch = ctl.set_channel_count(&v)?;
                report(dispatch, format!("Channel count set to {}", v));
                if ctl.single_channel_enabled() {
                    println!("Single channel selection enabled");
                }
            }
            ConsoleCommand::Single(v) => {
                let mut ctl = self.lock()?;
                if !ctl.single_channel_enabled() {
                    println!("Single channel selection is disabled, set the channel count to 1 first");
                    return Ok(());
                }
                let dispatch = ctl.set_single_channel(&v)?;
                report(dispatch, format!("Set to channel {}", v));
            }
            ConsoleCommand::Start => report(self.lock()?.start()?, "Streaming started".into()),
            ConsoleCommand::Stop => report(self.lock()?.stop()?, "Streaming stopped".into()),
            // The reply shows up through the monitor
            ConsoleCommand::Status => {
                if self.lock()?.status()? == Dispatch::NotConnected {
                    println!("Not connected, nothing sent");
                }
            }
            ConsoleCommand::Convert(csv) => {
                let report = convert::convert_file(&csv, &self.upload.source)?;
                println!(
                    "BIN file saved as: {} ({} bytes)",
                    self.upload.source.display(),
                    report.bytes_written
                );
            }
            ConsoleCommand::Upload => {
                // Lock held for the whole transfer, the monitor waits
                let mut ctl = self.lock()?;
                let report = ctl.upload(&self.upload.source, self.upload.pacing, |p| {
                    print!("\rUpload {:3}%", p);
                    let _ = io::stdout().flush();
                })?;
                println!();
                println!("Upload complete, {} bytes in {} chunks", report.bytes, report.chunks);
            }
            ConsoleCommand::Help => print!("{}", HELP),
            ConsoleCommand::Quit => {}
        }
        Ok(())
    }

    pub fn run<R: BufRead>(&self, input: R) -> Result<()> {
        let stop = Arc::new(AtomicBool::new(false));
        let poller = monitor::spawn(self.controller.clone(), stop.clone());

        print!("{}", HELP);
        for line in input.lines() {
            let line = line.context("failed to read console input")?;
            match self.parse_line(&line) {
                Ok(None) => {}
                Ok(Some(ConsoleCommand::Quit)) => break,
                Ok(Some(command)) => {
                    if let Err(e) = self.execute(command) {
                        println!("Error: {:#}", e);
                    }
                }
                Err(e) => println!("{}", e),
            }
        }

        stop.store(true, Ordering::Relaxed);
        poller
            .join()
            .map_err(|_| anyhow!("monitor thread panicked"))
    }
}
