extern crate ansi_term;
extern crate ctrlc;
extern crate linefeed;

use ansi_term::Style;
use basic::error;
use basic::lang::Error;
use basic::mach::{Event, Program, Runtime};
use linefeed::{Completer, Completion, Interface, Prompter, ReadResult, Signal, Terminal};
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub fn main() {
    let interrupted = Arc::new(AtomicBool::new(false));
    let int_moved = interrupted.clone();
    ctrlc::set_handler(move || {
        int_moved.store(true, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");
    if let Err(error) = main_loop(interrupted) {
        eprintln!("{}", error);
    }
}

fn main_loop(interrupted: Arc<AtomicBool>) -> std::io::Result<()> {
    let mut runtime = Runtime::default();
    let command = Interface::new("badge-basic")?;
    let input = Interface::new("input")?;
    input.set_report_signal(Signal::Interrupt, true);
    command.write_fmt(format_args!(
        "BADGE BASIC {}\n{} BYTES FREE\nREADY.\n",
        env!("CARGO_PKG_VERSION"),
        runtime.free_bytes()
    ))?;

    loop {
        if interrupted.load(Ordering::SeqCst) {
            runtime.interrupt();
            interrupted.store(false, Ordering::SeqCst);
        }
        match runtime.execute(5000) {
            Event::Stopped => {
                let saved_completer = command.completer();
                command.set_completer(Arc::new(LineCompleter::new(runtime.program())));
                let string = match command.read_line()? {
                    ReadResult::Input(string) => string,
                    ReadResult::Signal(_) | ReadResult::Eof => break,
                };
                command.set_completer(saved_completer);
                if runtime.enter(&string) {
                    command.add_history_unique(string);
                }
            }
            Event::Input(prompt) => {
                input.set_prompt(&prompt)?;
                match input.read_line()? {
                    ReadResult::Input(string) => {
                        if runtime.enter(&string) {
                            input.add_history_unique(string);
                        }
                    }
                    ReadResult::Signal(Signal::Interrupt) => {
                        input.set_buffer("")?;
                        input.lock_reader().cancel_read_line()?;
                        runtime.interrupt();
                    }
                    ReadResult::Signal(_) | ReadResult::Eof => break,
                }
            }
            Event::Errors(errors) => {
                for error in errors.iter() {
                    report(&command, error)?;
                }
            }
            Event::Running => {}
            Event::Print(s) => {
                command.write_fmt(format_args!("{}", s))?;
            }
            Event::List(s) => {
                command.write_fmt(format_args!("{}\n", s))?;
            }
            Event::Cls => {
                command.write_fmt(format_args!("\x1b[2J\x1b[H"))?;
            }
            Event::ForeColor(c) => {
                let base = if c < 8 { 30 } else { 90 };
                command.write_fmt(format_args!("\x1b[{}m", base + ansi_colour_code(c)))?;
            }
            Event::BackColor(c) => {
                let base = if c < 8 { 40 } else { 100 };
                command.write_fmt(format_args!("\x1b[{}m", base + ansi_colour_code(c)))?;
            }
            Event::Led(index, level) => {
                command.write_fmt(format_args!("[LED {} = {}]\n", index, level))?;
            }
            Event::Move(channel, position) => {
                command.write_fmt(format_args!("[MOVE {} -> {}]\n", channel, position))?;
            }
            Event::Set(channel, level) => {
                command.write_fmt(format_args!("[SET {} = {}]\n", channel, level))?;
            }
            Event::Sleep(ms) => {
                sleep_sliced(ms, &interrupted);
            }
            Event::Load(name) => match load(&name) {
                Ok(program) => runtime.set_program(program),
                Err(error) => report(&command, &error)?,
            },
            Event::Save(name) => {
                if let Err(error) = save(runtime.program(), &name) {
                    report(&command, &error)?;
                }
            }
            Event::Dir => match dir() {
                Ok(names) => {
                    for name in names {
                        command.write_fmt(format_args!("{}\n", name))?;
                    }
                }
                Err(error) => report(&command, &error)?,
            },
            Event::Delete(name) => {
                if let Err(error) = del(&name) {
                    report(&command, &error)?;
                }
            }
            Event::FreeMemory => {
                command.write_fmt(format_args!("{} BYTES FREE\n", runtime.free_bytes()))?;
            }
            Event::Identity => {
                let id = identity();
                command.write_fmt(format_args!("{}\n{}\n", id, print_as_hex(&id)))?;
            }
        }
    }
    Ok(())
}

fn report<Term: Terminal>(command: &Interface<Term>, error: &Error) -> std::io::Result<()> {
    command.write_fmt(format_args!(
        "{}\n",
        Style::new().bold().paint(error.to_string())
    ))
}

/// Recalls a stored line into the edit buffer when its number is typed
/// and Tab is pressed.
struct LineCompleter {
    lines: Vec<(u16, String)>,
}

impl LineCompleter {
    fn new(program: &Program) -> LineCompleter {
        LineCompleter {
            lines: program
                .lines()
                .map(|(number, text)| (number, text.to_string()))
                .collect(),
        }
    }
}

impl<Term: Terminal> Completer<Term> for LineCompleter {
    fn complete(
        &self,
        _word: &str,
        prompter: &Prompter<Term>,
        _start: usize,
        _end: usize,
    ) -> Option<Vec<Completion>> {
        if let Ok(number) = prompter.buffer().parse::<u16>() {
            if let Ok(idx) = self.lines.binary_search_by_key(&number, |&(n, _)| n) {
                let (number, text) = &self.lines[idx];
                let mut comp = Completion::simple(format!("{} {}", number, text));
                comp.suffix = linefeed::complete::Suffix::None;
                return Some(vec![comp]);
            }
        }
        None
    }
}

/// Badge colour order to ANSI colour order, low three bits.
fn ansi_colour_code(c: u8) -> u8 {
    const MAP: [u8; 8] = [0, 4, 2, 6, 1, 5, 3, 7];
    MAP[(c & 7) as usize]
}

/// Sleep in bounded slices so a stop signal is never more than one
/// slice away.
fn sleep_sliced(ms: u64, interrupted: &AtomicBool) {
    let mut remaining = ms;
    while remaining > 0 {
        if interrupted.load(Ordering::SeqCst) {
            return;
        }
        let slice = remaining.min(50);
        std::thread::sleep(Duration::from_millis(slice));
        remaining -= slice;
    }
}

fn identity() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "BADGE-0000".to_string())
}

fn print_as_hex(s: &str) -> String {
    let mut out = String::new();
    for byte in s.bytes() {
        out.push_str(&format!("{:02X} ", byte));
    }
    out.trim_end().to_string()
}

fn store_dir() -> PathBuf {
    match std::env::var("BADGE_BASIC_STORE") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => PathBuf::from("storage"),
    }
}

fn store_path(name: &str) -> Result<PathBuf, Error> {
    let clean = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !clean {
        return Err(error!(BadFileName));
    }
    Ok(store_dir().join(format!("{}.bas", name.to_ascii_uppercase())))
}

fn load(name: &str) -> Result<Program, Error> {
    let mut program = Program::new();
    if name.starts_with("http://") || name.starts_with("https://") {
        let body = reqwest::blocking::get(name)
            .and_then(|response| response.text())
            .map_err(|_| error!(StorageError; "FETCH FAILED"))?;
        for line in body.lines() {
            program.load_str(line)?;
        }
        return Ok(program);
    }
    let path = store_path(name)?;
    let file = match File::open(&path) {
        Ok(file) => file,
        Err(error) => {
            return Err(match error.kind() {
                ErrorKind::NotFound => error!(FileNotFound),
                _ => error!(StorageError),
            })
        }
    };
    for line in BufReader::new(file).lines() {
        match line {
            Ok(line) => program.load_str(&line)?,
            Err(_) => return Err(error!(StorageError)),
        }
    }
    Ok(program)
}

fn save(program: &Program, name: &str) -> Result<(), Error> {
    if program.is_empty() {
        return Err(error!(StorageError; "NOTHING TO SAVE"));
    }
    let path = store_path(name)?;
    if let Some(parent) = path.parent() {
        if std::fs::create_dir_all(parent).is_err() {
            return Err(error!(StorageError));
        }
    }
    let mut file = match File::create(&path) {
        Ok(file) => file,
        Err(_) => return Err(error!(StorageError)),
    };
    for (number, text) in program.lines() {
        if writeln!(file, "{} {}", number, text).is_err() {
            return Err(error!(StorageError));
        }
    }
    Ok(())
}

fn dir() -> Result<Vec<String>, Error> {
    let mut names = vec![];
    let entries = match std::fs::read_dir(store_dir()) {
        Ok(entries) => entries,
        Err(error) => {
            return match error.kind() {
                ErrorKind::NotFound => Ok(names),
                _ => Err(error!(StorageError)),
            }
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("bas") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

fn del(name: &str) -> Result<(), Error> {
    let path = store_path(name)?;
    std::fs::remove_file(&path).map_err(|error| match error.kind() {
        ErrorKind::NotFound => error!(FileNotFound),
        _ => error!(StorageError),
    })
}
