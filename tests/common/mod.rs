use basic::mach::{Event, Runtime};

pub fn exec(runtime: &mut Runtime) -> String {
    exec_n(runtime, 5000)
}

/// Pump the runtime until it stops or asks for input, folding every
/// event into a transcript. Device events become bracketed traces so
/// tests can assert on the order the host would see.
pub fn exec_n(runtime: &mut Runtime, cycles: usize) -> String {
    let mut s = String::new();
    let mut prev_running = false;
    loop {
        let event = runtime.execute(cycles);
        match &event {
            Event::Stopped => {
                break;
            }
            Event::Errors(errors) => {
                for error in errors.iter() {
                    s.push_str(&format!("{}\n", error));
                }
            }
            Event::Running => {
                if prev_running {
                    s.push_str(&format!("\n{} Execution cycles exceeded.\n", cycles));
                    break;
                }
            }
            Event::Print(ps) => {
                s.push_str(ps);
            }
            Event::Input(prompt) => {
                s.push_str(prompt);
                break;
            }
            Event::List(ls) => {
                s.push_str(&format!("{}\n", ls));
            }
            Event::Cls => s.push_str("[CLS]\n"),
            Event::ForeColor(c) => s.push_str(&format!("[FG {}]\n", c)),
            Event::BackColor(c) => s.push_str(&format!("[BG {}]\n", c)),
            Event::Led(index, level) => s.push_str(&format!("[LED {} = {}]\n", index, level)),
            Event::Move(channel, position) => {
                s.push_str(&format!("[MOVE {} -> {}]\n", channel, position))
            }
            Event::Set(channel, level) => s.push_str(&format!("[SET {} = {}]\n", channel, level)),
            Event::Sleep(ms) => s.push_str(&format!("[SLEEP {}]\n", ms)),
            Event::Load(name) => s.push_str(&format!("[LOAD {}]\n", name)),
            Event::Save(name) => s.push_str(&format!("[SAVE {}]\n", name)),
            Event::Dir => s.push_str("[DIR]\n"),
            Event::Delete(name) => s.push_str(&format!("[DEL {}]\n", name)),
            Event::FreeMemory => s.push_str("[MEM]\n"),
            Event::Identity => s.push_str("[INFO]\n"),
        }
        match event {
            Event::Running => prev_running = true,
            _ => prev_running = false,
        }
    }
    s.trim_end_matches("READY.\n").to_string()
}
