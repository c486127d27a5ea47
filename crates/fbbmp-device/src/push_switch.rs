// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: Copyright (c) 2025 Markus Zehnder

//! Button input: FPGA push switch device and console stand-in.

use anyhow::Context;
use log::{debug, info};
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, Read};
use std::path::Path;

pub const DEFAULT_PUSH_SWITCH_DEVICE: &str = "/dev/fpga_push_switch";

/// Number of switches reported by the push switch device.
const PUSH_SWITCH_COUNT: usize = 9;

/// Source of button command codes.
pub trait ButtonInput {
    /// Block until the next command code is available.
    ///
    /// Returns `None` at the end of input. A code of 0 means no button was pressed.
    fn read_code(&mut self) -> io::Result<Option<u8>>;
}

/// Push switch device reporting the state of all switches as one byte each.
///
/// A held button is reported once, subsequent reads return 0 until the state changes.
pub struct PushSwitch<R = File> {
    port: R,
    last: u8,
}

impl PushSwitch<File> {
    pub fn open(device: impl AsRef<Path>) -> anyhow::Result<Self> {
        let device = device.as_ref();
        let port = OpenOptions::new()
            .read(true)
            .write(true)
            .open(device)
            .with_context(|| format!("Error opening push switch: {device:?}"))?;
        info!("Opened push switch {device:?}");
        Ok(Self::from_reader(port))
    }
}

impl<R: Read> PushSwitch<R> {
    pub fn from_reader(port: R) -> Self {
        Self { port, last: 0 }
    }
}

impl<R: Read> ButtonInput for PushSwitch<R> {
    fn read_code(&mut self) -> io::Result<Option<u8>> {
        let mut state = [0u8; PUSH_SWITCH_COUNT];
        match self.port.read_exact(&mut state) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e),
        }

        let code = pressed_switch(&state);
        if code == self.last {
            return Ok(Some(0));
        }
        self.last = code;
        if code != 0 {
            debug!("Push switch state {state:?}: button {code}");
        }
        Ok(Some(code))
    }
}

/// 1-based index of the last pressed switch, 0 if none is pressed.
fn pressed_switch(state: &[u8]) -> u8 {
    state
        .iter()
        .rposition(|&s| s == 1)
        .map(|idx| idx as u8 + 1)
        .unwrap_or(0)
}

/// Reads one command code per line, e.g. from stdin.
pub struct ConsoleInput<R> {
    reader: R,
}

impl<R: BufRead> ConsoleInput<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> ButtonInput for ConsoleInput<R> {
    fn read_code(&mut self) -> io::Result<Option<u8>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        Ok(Some(line.trim().parse().unwrap_or(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Cursor;

    #[rstest]
    #[case([0, 0, 0, 0, 0, 0, 0, 0, 0], 0)]
    #[case([1, 0, 0, 0, 0, 0, 0, 0, 0], 1)]
    #[case([0, 0, 0, 0, 0, 1, 0, 0, 0], 6)]
    #[case([0, 0, 0, 0, 0, 0, 0, 0, 1], 9)]
    #[case([0, 1, 0, 1, 0, 0, 0, 0, 0], 4)]
    #[case([0, 2, 0, 0, 0, 0, 0, 0, 0], 0)]
    fn pressed_switch_index(#[case] state: [u8; 9], #[case] expected: u8) {
        assert_eq!(expected, pressed_switch(&state));
    }

    #[test]
    fn push_switch_reads_one_state_per_code() {
        let mut data = vec![0u8; 18];
        data[2] = 1;
        let mut input = PushSwitch::from_reader(Cursor::new(data));
        assert_eq!(Some(3), input.read_code().unwrap());
        assert_eq!(Some(0), input.read_code().unwrap());
        assert_eq!(None, input.read_code().unwrap());
    }

    #[test]
    fn push_switch_reports_held_button_once() {
        let mut data = vec![0u8; 45];
        data[0] = 1;
        data[9] = 1;
        data[27] = 1;
        data[40] = 1;
        let mut input = PushSwitch::from_reader(Cursor::new(data));
        assert_eq!(Some(1), input.read_code().unwrap());
        assert_eq!(Some(0), input.read_code().unwrap());
        assert_eq!(Some(0), input.read_code().unwrap());
        assert_eq!(Some(1), input.read_code().unwrap());
        assert_eq!(Some(5), input.read_code().unwrap());
        assert_eq!(None, input.read_code().unwrap());
    }

    #[test]
    fn console_input_parses_lines() {
        let mut input = ConsoleInput::new(Cursor::new("1\n 4 \nfoo\n-2\n6"));
        assert_eq!(Some(1), input.read_code().unwrap());
        assert_eq!(Some(4), input.read_code().unwrap());
        assert_eq!(Some(0), input.read_code().unwrap());
        assert_eq!(Some(0), input.read_code().unwrap());
        assert_eq!(Some(6), input.read_code().unwrap());
        assert_eq!(None, input.read_code().unwrap());
    }
}
