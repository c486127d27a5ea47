// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: Copyright (c) 2025 Markus Zehnder

#![forbid(non_ascii_idents)]
#![deny(unsafe_code)]

use fbbmp::BITMAP_EXTENSION;
use fbbmp::cfg::{self, ViewerConfig};
use fbbmp::files::ImageDirectory;
use fbbmp::session::{Command, Session};
use fbbmp_device::{
    BitDepth, ButtonInput, ConsoleInput, ConsoleStatus, FramebufferBuilder, PushSwitch,
    RasterSurface, StatusDisplay, TextLcd,
};

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{debug, error, info};
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::sleep;
use std::time::{Duration, Instant};

/// Wait time before polling the button input again if no button is pressed.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Bitmap viewer for the Linux frame buffer.
///
/// Displays the .bmp files of the image directory, controlled with push switch buttons or
/// console input: 1 next image, 2 previous image, 3 clear, 4 brighter, 5 darker, 6 capture.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Frame buffer bits per pixel: 16 or 32. Default: 32
    #[arg(value_parser = BitDepth::from_str)]
    bit_depth: Option<BitDepth>,

    /// Use the push switch and text LCD devices instead of the console.
    #[arg(value_parser = ["device"])]
    device: Option<String>,

    /// Json configuration file with device paths and defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory containing the .bmp files to display. Default: `.`
    #[arg(short, long)]
    image_dir: Option<PathBuf>,

    /// Capture output file, relative to the image directory. Default: `output.bmp`
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Frame buffer device. Default: `/dev/fb0`
    #[arg(long)]
    fb_device: Option<PathBuf>,

    /// Simulate the frame buffer in memory, `--fb-device` is ignored.
    #[arg(long)]
    simulate: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let cfg = resolve_configuration(&args)?;
    let use_devices = args.device.is_some();

    let (mut input, status): (Box<dyn ButtonInput>, Box<dyn StatusDisplay>) = if use_devices {
        (
            Box::new(PushSwitch::open(&cfg.devices.push_switch)?),
            Box::new(TextLcd::open(&cfg.devices.text_lcd)?),
        )
    } else {
        (
            Box::new(ConsoleInput::new(io::stdin().lock())),
            Box::new(ConsoleStatus),
        )
    };

    let quit = Arc::new(AtomicBool::new(false));
    let quit_request = quit.clone();
    ctrlc::set_handler(move || {
        if quit_request.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
        info!("Quitting after the current command, press Ctrl+C again to exit immediately");
    })
    .with_context(|| "Error registering Ctrl+C handler")?;

    let mut builder = FramebufferBuilder::new();
    builder.bit_depth(cfg.bit_depth);
    let surface: Box<dyn RasterSurface> = if args.simulate {
        Box::new(builder.simulate(cfg.simulated_size))
    } else {
        Box::new(builder.open_device(&cfg.devices.frame_buffer)?)
    };

    let files = ImageDirectory::scan(&cfg.image_dir, BITMAP_EXTENSION)
        .with_context(|| format!("Error reading image directory {:?}", cfg.image_dir))?;
    info!("Found {} images in {:?}", files.len(), cfg.image_dir);

    let mut session = Session::new(surface, cfg.bit_depth, status, files, &cfg.output_file)?;

    run_command_loop(&mut session, input.as_mut(), &quit, !use_devices)?;

    info!("Bye bye!");

    Ok(())
}

fn resolve_configuration(args: &Args) -> anyhow::Result<ViewerConfig> {
    let mut cfg = match &args.config {
        Some(path) => cfg::load_cfg(path)?,
        None => ViewerConfig::default(),
    };

    if let Some(bit_depth) = args.bit_depth {
        cfg.bit_depth = bit_depth;
    }
    if let Some(image_dir) = &args.image_dir {
        cfg.image_dir = image_dir.clone();
    }
    if let Some(output) = &args.output {
        cfg.output_file = output.clone();
    }
    if let Some(fb_device) = &args.fb_device {
        cfg.devices.frame_buffer = fb_device.clone();
    }

    debug!("Configuration: {cfg:?}");

    Ok(cfg)
}

fn run_command_loop<S: RasterSurface>(
    session: &mut Session<S>,
    input: &mut dyn ButtonInput,
    quit: &AtomicBool,
    show_menu: bool,
) -> anyhow::Result<()> {
    while !quit.load(Ordering::SeqCst) {
        if show_menu {
            print_menu();
        }

        let Some(code) = input
            .read_code()
            .with_context(|| "Error reading button input")?
        else {
            info!("End of input");
            break;
        };

        if quit.load(Ordering::SeqCst) {
            break;
        }

        let Some(command) = Command::from_code(code) else {
            if code == 0 {
                sleep(IDLE_POLL_INTERVAL);
            } else {
                debug!("Ignoring unassigned button {code}");
            }
            continue;
        };

        info!("Command {code}: {command}");
        let start = Instant::now();
        if let Err(e) = session.execute(command) {
            error!("{command} failed: {e}");
        } else if is_timed(command) {
            info!("{command} done in {}ms", start.elapsed().as_millis());
        }
    }

    Ok(())
}

/// Commands loading or writing a whole image.
fn is_timed(command: Command) -> bool {
    matches!(
        command,
        Command::NextImage | Command::PreviousImage | Command::Capture
    )
}

fn print_menu() {
    for command in Command::ALL {
        println!("{} : {command}", command.code());
    }
    println!("Ctrl + c : quit");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Command::NextImage, true)]
    #[case(Command::PreviousImage, true)]
    #[case(Command::Capture, true)]
    #[case(Command::Clear, false)]
    #[case(Command::Brighten, false)]
    #[case(Command::Darken, false)]
    fn only_load_and_capture_are_timed(#[case] command: Command, #[case] expected: bool) {
        assert_eq!(expected, is_timed(command));
    }
}
