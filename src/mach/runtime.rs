use super::{Address, Eval, Function, Program, Stack, Val, Var};
use crate::error;
use crate::lang::{Cursor, Error, LineNumber, MaxValue, MAX_LINE_LEN};
use std::collections::VecDeque;
use std::ops::RangeInclusive;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// What the engine asks of its host. The host performs the effect and
/// pumps `execute` again; replies come back through `enter` (input
/// lines) and `set_program` (loaded listings), never mid-statement.
#[derive(Debug)]
pub enum Event {
    /// Nothing to do; the host should prompt for a line.
    Stopped,
    /// The cycle budget ran out; a good moment to poll for interrupts.
    Running,
    Errors(Vec<Error>),
    Print(String),
    /// Read one line from the session and feed it to `enter`.
    Input(String),
    List(String),
    Cls,
    ForeColor(u8),
    BackColor(u8),
    Led(u16, u16),
    Move(u16, i32),
    Set(u16, f64),
    /// Sleep in bounded slices, honoring the stop signal.
    Sleep(u64),
    Load(String),
    Save(String),
    Dir,
    Delete(String),
    FreeMemory,
    Identity,
}

/// Execution position: a direct buffer offset, or a line-index address
/// plus an offset into that line's text.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Pos {
    Direct(usize),
    Stored(Address, usize),
}

#[derive(Debug)]
struct ForFrame {
    var: Rc<str>,
    limit: f64,
    step: f64,
    body: Pos,
}

#[derive(Debug)]
struct DoFrame {
    body: Pos,
}

#[derive(Debug, PartialEq)]
enum State {
    Idle,
    Running,
    AwaitInput,
}

/// How a statement handler left the cursor.
enum Flow {
    /// Consumed exactly its tokens; a boundary must follow.
    Continue,
    /// The cursor rests at the start of another statement (IF arms).
    Inline,
    /// The program counter was redirected; the cursor is dead.
    Jumped,
    /// Execution ended (END, RUN of an empty program).
    Halted,
}

const HELP: &str = "\
BADGE BASIC
  LINES      10 PRINTLN \"HI\"   (a bare number deletes its line)
  RUN  LIST [n[-m]]  NEW  END
  LET A=1   MSG$=\"HI\"   PRINT/PRINTLN items   INPUT [\"prompt\";] V
  IF e THEN ... [ELSE ...]   GOTO n   GOSUB n ... RETURN
  FOR I=a TO b [STEP c] ... NEXT [I]   DO ... LOOP [UNTIL e|WHILE e]
  DEVICE     CLS  COLOR f[,b]  LED i,v  MOVE c,p  SET c,v  SLEEP ms
  STORAGE    SAVE \"name\"  LOAD \"name\"  DIR  DEL \"name\"
  OTHER      HELP  MEM  INFO  REM
  FUNCTIONS  ABS ATN COS EXP INT LOG MAX MIN RND SGN SIN SQR TAN TIMER
";

/// ## The interpreter
///
/// Owns every piece of interpreter state; independent instances are
/// independent interpreters. The host pumps `execute`, which runs at
/// most `cycles` statements before yielding, and returns early with
/// any event the host must act on.
pub struct Runtime {
    program: Program,
    vars: Var,
    functions: Function,
    gosub_stack: Stack<Pos>,
    for_stack: Stack<ForFrame>,
    do_stack: Stack<DoFrame>,
    state: State,
    pos: Pos,
    direct: Rc<str>,
    events: VecDeque<Event>,
    listing: Option<RangeInclusive<u16>>,
    print_col: usize,
    input_vars: Vec<Rc<str>>,
    input_prompt: String,
    interrupted: bool,
}

impl Default for Runtime {
    fn default() -> Runtime {
        Runtime {
            program: Program::new(),
            vars: Var::new(),
            functions: Function::new(),
            gosub_stack: Stack::new("GOSUB STACK FULL"),
            for_stack: Stack::new("FOR STACK FULL"),
            do_stack: Stack::new("DO STACK FULL"),
            state: State::Idle,
            pos: Pos::Direct(0),
            direct: "".into(),
            events: VecDeque::new(),
            listing: None,
            print_col: 0,
            input_vars: vec![],
            input_prompt: String::new(),
            interrupted: false,
        }
    }
}

impl Runtime {
    pub fn new() -> Runtime {
        Runtime::default()
    }

    /// Accept one line from the session: an input reply, a numbered
    /// line to store or delete, or a direct statement to execute.
    /// Returns whether the line is worth keeping in history.
    pub fn enter(&mut self, line: &str) -> bool {
        if self.state == State::AwaitInput {
            self.accept_input(line);
            return !line.is_empty();
        }
        if line.len() > MAX_LINE_LEN {
            self.events
                .push_back(Event::Errors(vec![error!(LineBufferOverflow)]));
            return false;
        }
        let mut cursor = Cursor::new(line);
        if let Some(number) = cursor.match_line_number() {
            let text = line[cursor.pos()..].trim();
            if let Err(error) = self.program.insert(number, text) {
                self.events.push_back(Event::Errors(vec![error]));
            }
            return true;
        }
        if cursor.match_eol() {
            return false;
        }
        self.direct = line.into();
        self.pos = Pos::Direct(0);
        self.state = State::Running;
        true
    }

    /// Ask a running program to stop at the next statement boundary.
    pub fn interrupt(&mut self) {
        self.interrupted = true;
    }

    /// Replace the stored program (a completed LOAD). Any run in
    /// progress is abandoned.
    pub fn set_program(&mut self, program: Program) {
        self.program = program;
        self.halt();
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Unused program store capacity, for the MEM diagnostic.
    pub fn free_bytes(&self) -> usize {
        self.program.free_bytes()
    }

    pub fn execute(&mut self, cycles: usize) -> Event {
        for _ in 0..cycles {
            if self.interrupted {
                self.interrupted = false;
                if self.state != State::Idle || self.listing.is_some() {
                    let line = self.current_line_number();
                    self.listing = None;
                    self.halt();
                    self.events.push_back(Event::Errors(vec![error!(Break, line)]));
                    self.events.push_back(Event::Print("READY.\n".into()));
                    self.events.push_back(Event::Stopped);
                }
            }
            if let Some(range) = self.listing.as_mut() {
                match self.program.list_line(range) {
                    Some(text) => return Event::List(text),
                    None => self.listing = None,
                }
            }
            if let Some(event) = self.events.pop_front() {
                return event;
            }
            match self.state {
                State::Idle => return Event::Stopped,
                State::AwaitInput => return Event::Input(self.input_prompt.clone()),
                State::Running => {
                    if let Err(error) = self.step() {
                        self.run_error(error);
                    }
                }
            }
        }
        Event::Running
    }

    fn run_error(&mut self, error: Error) {
        let error = if error.is_direct() {
            error.in_line_number(self.current_line_number())
        } else {
            error
        };
        self.halt();
        self.events.push_back(Event::Errors(vec![error]));
        self.events.push_back(Event::Print("READY.\n".into()));
        self.events.push_back(Event::Stopped);
    }

    fn halt(&mut self) {
        self.state = State::Idle;
        self.gosub_stack.clear();
        self.for_stack.clear();
        self.do_stack.clear();
        self.input_vars.clear();
    }

    fn finish(&mut self) {
        self.halt();
        self.events.push_back(Event::Print("READY.\n".into()));
        self.events.push_back(Event::Stopped);
    }

    fn text_at_pos(&self) -> Rc<str> {
        match self.pos {
            Pos::Direct(_) => self.direct.clone(),
            Pos::Stored(addr, _) => match self.program.line_at(addr) {
                Some((_, text)) => text,
                None => "".into(),
            },
        }
    }

    fn offset(&self) -> usize {
        match self.pos {
            Pos::Direct(offset) | Pos::Stored(_, offset) => offset,
        }
    }

    fn set_offset(&mut self, offset: usize) {
        match &mut self.pos {
            Pos::Direct(o) | Pos::Stored(_, o) => *o = offset,
        }
    }

    fn pos_at(&self, offset: usize) -> Pos {
        match self.pos {
            Pos::Direct(_) => Pos::Direct(offset),
            Pos::Stored(addr, _) => Pos::Stored(addr, offset),
        }
    }

    fn current_line_number(&self) -> LineNumber {
        match self.pos {
            Pos::Direct(_) => None,
            Pos::Stored(addr, _) => self.program.line_at(addr).map(|(number, _)| number),
        }
    }

    /// Run exactly one statement.
    fn step(&mut self) -> Result<()> {
        // settle on the next statement, crossing separators and line
        // boundaries
        loop {
            let text = self.text_at_pos();
            // NEW or LOAD may have emptied the line under our feet
            let offset = self.offset().min(text.len());
            let mut cursor = Cursor::with_pos(&text, offset);
            if cursor.match_eol() {
                match self.pos {
                    Pos::Direct(_) => {
                        self.finish();
                        return Ok(());
                    }
                    Pos::Stored(addr, _) => {
                        if self.program.line_at(addr + 1).is_some() {
                            self.pos = Pos::Stored(addr + 1, 0);
                            continue;
                        }
                        self.finish();
                        return Ok(());
                    }
                }
            }
            if cursor.match_literal(":") {
                self.set_offset(cursor.pos());
                continue;
            }
            self.set_offset(cursor.pos());
            break;
        }
        let text = self.text_at_pos();
        let offset = self.offset().min(text.len());
        let mut cursor = Cursor::with_pos(&text, offset);
        match self.statement(&mut cursor)? {
            Flow::Continue => {
                let boundary = cursor.pos();
                if !cursor.match_eol() {
                    cursor.set_pos(boundary);
                    if !cursor.match_literal(":") {
                        return Err(error!(SyntaxError; "UNEXPECTED TEXT AFTER STATEMENT"));
                    }
                }
                self.set_offset(boundary);
            }
            Flow::Inline => self.set_offset(cursor.pos()),
            Flow::Jumped | Flow::Halted => {}
        }
        Ok(())
    }

    fn statement(&mut self, cursor: &mut Cursor) -> Result<Flow> {
        if cursor.match_literal("?") {
            return self.parse_print(cursor, false);
        }
        if cursor.match_literal("'") {
            cursor.seek_eol();
            return Ok(Flow::Continue);
        }
        let save = cursor.pos();
        if let Some(word) = cursor.match_word() {
            match &*word {
                "REM" => {
                    cursor.seek_eol();
                    return Ok(Flow::Continue);
                }
                "LET" => return self.parse_assign(cursor),
                "PRINT" => return self.parse_print(cursor, false),
                "PRINTLN" => return self.parse_print(cursor, true),
                "IF" => return self.parse_if(cursor),
                // a surviving ELSE means the THEN arm just finished
                "ELSE" => {
                    cursor.seek_eol();
                    return Ok(Flow::Continue);
                }
                "GOTO" => return self.parse_goto(cursor),
                "GOSUB" => return self.parse_gosub(cursor),
                "RETURN" => return self.parse_return(cursor),
                "END" => {
                    self.finish();
                    return Ok(Flow::Halted);
                }
                "DO" => return self.parse_do(cursor),
                "LOOP" => return self.parse_loop(cursor),
                "FOR" => return self.parse_for(cursor),
                "NEXT" => return self.parse_next(cursor),
                "INPUT" => return self.parse_input(cursor),
                "CLS" => {
                    self.print_col = 0;
                    self.events.push_back(Event::Cls);
                    return Ok(Flow::Continue);
                }
                "COLOR" => return self.parse_color(cursor),
                "LED" => return self.parse_led(cursor),
                "MOVE" => return self.parse_move(cursor),
                "SET" => return self.parse_set(cursor),
                "SLEEP" => return self.parse_sleep(cursor),
                "RUN" => return self.parse_run(),
                "LIST" => return self.parse_list(cursor),
                "NEW" => {
                    self.program.clear();
                    self.vars.clear();
                    return Ok(Flow::Continue);
                }
                "LOAD" => {
                    let name = Self::filename(cursor)?;
                    self.events.push_back(Event::Load(name));
                    return Ok(Flow::Continue);
                }
                "SAVE" => {
                    let name = Self::filename(cursor)?;
                    self.events.push_back(Event::Save(name));
                    return Ok(Flow::Continue);
                }
                "DIR" => {
                    self.events.push_back(Event::Dir);
                    return Ok(Flow::Continue);
                }
                "DEL" => {
                    let name = Self::filename(cursor)?;
                    self.events.push_back(Event::Delete(name));
                    return Ok(Flow::Continue);
                }
                "HELP" => {
                    self.print(HELP.to_string());
                    return Ok(Flow::Continue);
                }
                "MEM" => {
                    self.events.push_back(Event::FreeMemory);
                    return Ok(Flow::Continue);
                }
                "INFO" => {
                    self.events.push_back(Event::Identity);
                    return Ok(Flow::Continue);
                }
                _ => cursor.set_pos(save),
            }
        }
        self.parse_assign(cursor)
    }

    fn filename(cursor: &mut Cursor) -> Result<String> {
        match cursor.match_string() {
            Some(name) => Ok(name),
            None => Err(error!(SyntaxError; "EXPECTED QUOTED NAME")),
        }
    }

    fn eval_number(&mut self, cursor: &mut Cursor) -> Result<f64> {
        Eval::new(cursor, &self.vars, &mut self.functions).expression()
    }

    fn eval_text(&mut self, cursor: &mut Cursor) -> Result<Rc<str>> {
        Eval::new(cursor, &self.vars, &mut self.functions).text_expression()
    }

    fn item_is_text(&mut self, cursor: &mut Cursor) -> bool {
        Eval::new(cursor, &self.vars, &mut self.functions).at_text()
    }

    fn expect_boundary(cursor: &mut Cursor) -> Result<()> {
        let save = cursor.pos();
        let ok = cursor.match_eol() || {
            cursor.set_pos(save);
            cursor.match_literal(":")
        };
        cursor.set_pos(save);
        if ok {
            Ok(())
        } else {
            Err(error!(SyntaxError; "UNEXPECTED TEXT AFTER STATEMENT"))
        }
    }

    fn print(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        match text.rfind('\n') {
            Some(idx) => self.print_col = text[idx + 1..].chars().count(),
            None => self.print_col += text.chars().count(),
        }
        self.events.push_back(Event::Print(text));
    }

    fn parse_assign(&mut self, cursor: &mut Cursor) -> Result<Flow> {
        if let Some(name) = cursor.match_text_varname() {
            if !cursor.match_literal("=") {
                return Err(error!(SyntaxError; "EXPECTED ="));
            }
            let value = self.eval_text(cursor)?;
            self.vars.store(&name, Val::Text(value))?;
            return Ok(Flow::Continue);
        }
        if let Some(name) = cursor.match_numeric_varname() {
            if !cursor.match_literal("=") {
                return Err(error!(SyntaxError; "EXPECTED ="));
            }
            let value = self.eval_number(cursor)?;
            self.vars.store(&name, Val::Number(value))?;
            return Ok(Flow::Continue);
        }
        Err(error!(SyntaxError))
    }

    fn parse_print(&mut self, cursor: &mut Cursor, newline: bool) -> Result<Flow> {
        let mut out = String::new();
        let mut expect_item = true;
        loop {
            let save = cursor.pos();
            if cursor.match_eol() {
                break;
            }
            cursor.set_pos(save);
            if cursor.match_literal(":") {
                cursor.set_pos(save);
                break;
            }
            if expect_item {
                if self.item_is_text(cursor) {
                    out.push_str(&self.eval_text(cursor)?);
                } else {
                    let n = self.eval_number(cursor)?;
                    out.push_str(&Val::Number(n).to_string());
                }
                expect_item = false;
            } else if cursor.match_literal(",") {
                let col = self.print_col + out.chars().count();
                let pad = (14 - col % 14) % 14;
                for _ in 0..pad {
                    out.push(' ');
                }
                expect_item = true;
            } else if cursor.match_literal(";") {
                expect_item = true;
            } else {
                return Err(error!(SyntaxError; "EXPECTED SEPARATOR"));
            }
        }
        if newline {
            out.push('\n');
        }
        self.print(out);
        Ok(Flow::Continue)
    }

    fn parse_if(&mut self, cursor: &mut Cursor) -> Result<Flow> {
        let guard = self.eval_number(cursor)?;
        if !cursor.match_keyword("THEN") {
            return Err(error!(SyntaxError; "EXPECTED THEN"));
        }
        if guard != 0.0 {
            if let Some(number) = cursor.match_line_number() {
                return self.jump_to(number);
            }
            return Ok(Flow::Inline);
        }
        if cursor.seek_else() {
            if let Some(number) = cursor.match_line_number() {
                return self.jump_to(number);
            }
            return Ok(Flow::Inline);
        }
        cursor.seek_eol();
        Ok(Flow::Inline)
    }

    fn jump_to(&mut self, number: u16) -> Result<Flow> {
        let addr = self.program.address_of(number)?;
        self.pos = Pos::Stored(addr, 0);
        Ok(Flow::Jumped)
    }

    fn parse_goto(&mut self, cursor: &mut Cursor) -> Result<Flow> {
        let number = match cursor.match_line_number() {
            Some(number) => number,
            None => return Err(error!(SyntaxError; "EXPECTED LINE NUMBER")),
        };
        Self::expect_boundary(cursor)?;
        self.jump_to(number)
    }

    fn parse_gosub(&mut self, cursor: &mut Cursor) -> Result<Flow> {
        let number = match cursor.match_line_number() {
            Some(number) => number,
            None => return Err(error!(SyntaxError; "EXPECTED LINE NUMBER")),
        };
        Self::expect_boundary(cursor)?;
        let ret = self.pos_at(cursor.pos());
        self.gosub_stack.push(ret)?;
        self.jump_to(number)
    }

    fn parse_return(&mut self, cursor: &mut Cursor) -> Result<Flow> {
        Self::expect_boundary(cursor)?;
        match self.gosub_stack.pop() {
            Some(pos) => {
                self.pos = pos;
                Ok(Flow::Jumped)
            }
            None => Err(error!(ReturnWithoutGosub)),
        }
    }

    fn parse_do(&mut self, cursor: &mut Cursor) -> Result<Flow> {
        Self::expect_boundary(cursor)?;
        let body = self.pos_at(cursor.pos());
        self.do_stack.push(DoFrame { body })?;
        Ok(Flow::Continue)
    }

    fn parse_loop(&mut self, cursor: &mut Cursor) -> Result<Flow> {
        let body = match self.do_stack.last() {
            Some(frame) => frame.body,
            None => return Err(error!(LoopWithoutDo)),
        };
        let jump_back = if cursor.match_keyword("UNTIL") {
            self.eval_number(cursor)? == 0.0
        } else if cursor.match_keyword("WHILE") {
            self.eval_number(cursor)? != 0.0
        } else {
            true
        };
        Self::expect_boundary(cursor)?;
        if jump_back {
            self.pos = body;
            Ok(Flow::Jumped)
        } else {
            self.do_stack.pop();
            Ok(Flow::Continue)
        }
    }

    fn parse_for(&mut self, cursor: &mut Cursor) -> Result<Flow> {
        let var = match cursor.match_numeric_varname() {
            Some(name) => name,
            None => return Err(error!(SyntaxError; "EXPECTED NUMERIC VARIABLE")),
        };
        if !cursor.match_literal("=") {
            return Err(error!(SyntaxError; "EXPECTED ="));
        }
        let start = self.eval_number(cursor)?;
        if !cursor.match_keyword("TO") {
            return Err(error!(SyntaxError; "EXPECTED TO"));
        }
        let limit = self.eval_number(cursor)?;
        let step = if cursor.match_keyword("STEP") {
            self.eval_number(cursor)?
        } else {
            1.0
        };
        Self::expect_boundary(cursor)?;
        self.vars.store(&var, Val::Number(start))?;
        let body = self.pos_at(cursor.pos());
        self.for_stack.push(ForFrame {
            var,
            limit,
            step,
            body,
        })?;
        Ok(Flow::Continue)
    }

    fn parse_next(&mut self, cursor: &mut Cursor) -> Result<Flow> {
        let name = cursor.match_numeric_varname();
        Self::expect_boundary(cursor)?;
        let (var, limit, step, body) = match self.for_stack.last() {
            Some(frame) => (frame.var.clone(), frame.limit, frame.step, frame.body),
            None => return Err(error!(NextWithoutFor)),
        };
        if let Some(name) = name {
            if name != var {
                return Err(error!(NextWithoutFor));
            }
        }
        let current = match self.vars.fetch(&var) {
            Val::Number(n) => n,
            Val::Text(_) => return Err(error!(InternalError; "LOOP VARIABLE HELD TEXT")),
        };
        let next = current + step;
        if !next.is_finite() {
            return Err(error!(Overflow));
        }
        self.vars.store(&var, Val::Number(next))?;
        let done = if step < 0.0 {
            next < limit
        } else {
            next > limit
        };
        if done {
            self.for_stack.pop();
            Ok(Flow::Continue)
        } else {
            self.pos = body;
            Ok(Flow::Jumped)
        }
    }

    fn parse_input(&mut self, cursor: &mut Cursor) -> Result<Flow> {
        let mut prompt = String::new();
        let save = cursor.pos();
        if let Some(text) = cursor.match_string() {
            if cursor.match_literal(";") {
                prompt = text;
            } else {
                cursor.set_pos(save);
                return Err(error!(SyntaxError; "EXPECTED ; AFTER PROMPT"));
            }
        }
        let mut vars: Vec<Rc<str>> = vec![];
        loop {
            let name = match cursor
                .match_text_varname()
                .or_else(|| cursor.match_numeric_varname())
            {
                Some(name) => name,
                None => return Err(error!(SyntaxError; "EXPECTED VARIABLE")),
            };
            vars.push(name);
            if !cursor.match_literal(",") {
                break;
            }
        }
        Self::expect_boundary(cursor)?;
        prompt.push_str("? ");
        self.input_prompt = prompt;
        self.input_vars = vars;
        self.state = State::AwaitInput;
        Ok(Flow::Continue)
    }

    fn accept_input(&mut self, reply: &str) {
        let mut cursor = Cursor::new(reply);
        let mut values: Vec<Val> = vec![];
        for (i, name) in self.input_vars.iter().enumerate() {
            if i > 0 && !cursor.match_literal(",") {
                break;
            }
            if name.ends_with('$') {
                match cursor.match_string() {
                    Some(text) => values.push(Val::Text(text.into())),
                    None => values.push(Val::Text(cursor.take_until(',').into())),
                }
            } else {
                match cursor.match_number() {
                    Some(n) => values.push(Val::Number(n)),
                    None => break,
                }
            }
        }
        if values.len() != self.input_vars.len() {
            self.events
                .push_back(Event::Print("?REDO FROM START\n".into()));
            return;
        }
        if !cursor.match_eol() {
            self.events
                .push_back(Event::Print("?EXTRA IGNORED\n".into()));
        }
        let names = std::mem::take(&mut self.input_vars);
        for (name, value) in names.iter().zip(values) {
            if let Err(error) = self.vars.store(name, value) {
                self.run_error(error);
                return;
            }
        }
        self.state = State::Running;
    }

    fn parse_sleep(&mut self, cursor: &mut Cursor) -> Result<Flow> {
        let ms = self.eval_number(cursor)?;
        if ms < 0.0 {
            return Err(error!(IllegalFunctionCall));
        }
        self.events.push_back(Event::Sleep(ms as u64));
        Ok(Flow::Continue)
    }

    fn device_arg(&mut self, cursor: &mut Cursor, lo: f64, hi: f64) -> Result<f64> {
        let value = self.eval_number(cursor)?.round();
        if value < lo || value > hi {
            return Err(error!(IllegalFunctionCall));
        }
        Ok(value)
    }

    fn parse_color(&mut self, cursor: &mut Cursor) -> Result<Flow> {
        let fore = self.device_arg(cursor, 0.0, 15.0)? as u8;
        self.events.push_back(Event::ForeColor(fore));
        if cursor.match_literal(",") {
            let back = self.device_arg(cursor, 0.0, 15.0)? as u8;
            self.events.push_back(Event::BackColor(back));
        }
        Ok(Flow::Continue)
    }

    fn parse_led(&mut self, cursor: &mut Cursor) -> Result<Flow> {
        let index = self.device_arg(cursor, 0.0, 65535.0)? as u16;
        if !cursor.match_literal(",") {
            return Err(error!(SyntaxError; "EXPECTED ,"));
        }
        let level = self.device_arg(cursor, 0.0, 65535.0)? as u16;
        self.events.push_back(Event::Led(index, level));
        Ok(Flow::Continue)
    }

    fn parse_move(&mut self, cursor: &mut Cursor) -> Result<Flow> {
        let channel = self.device_arg(cursor, 0.0, 65535.0)? as u16;
        if !cursor.match_literal(",") {
            return Err(error!(SyntaxError; "EXPECTED ,"));
        }
        let position = self.device_arg(cursor, -32768.0, 32767.0)? as i32;
        self.events.push_back(Event::Move(channel, position));
        Ok(Flow::Continue)
    }

    fn parse_set(&mut self, cursor: &mut Cursor) -> Result<Flow> {
        let channel = self.device_arg(cursor, 0.0, 65535.0)? as u16;
        if !cursor.match_literal(",") {
            return Err(error!(SyntaxError; "EXPECTED ,"));
        }
        let level = self.eval_number(cursor)?;
        self.events.push_back(Event::Set(channel, level));
        Ok(Flow::Continue)
    }

    fn parse_run(&mut self) -> Result<Flow> {
        self.vars.clear();
        self.gosub_stack.clear();
        self.for_stack.clear();
        self.do_stack.clear();
        self.functions.reseed();
        self.print_col = 0;
        match self.program.first() {
            Some(addr) => {
                self.pos = Pos::Stored(addr, 0);
                self.state = State::Running;
                Ok(Flow::Jumped)
            }
            None => {
                self.finish();
                Ok(Flow::Halted)
            }
        }
    }

    fn parse_list(&mut self, cursor: &mut Cursor) -> Result<Flow> {
        let range = if let Some(from) = cursor.match_line_number() {
            if cursor.match_literal("-") {
                match cursor.match_line_number() {
                    Some(to) => from..=to,
                    None => from..=LineNumber::max_value(),
                }
            } else {
                from..=from
            }
        } else {
            0..=LineNumber::max_value()
        };
        Self::expect_boundary(cursor)?;
        self.listing = Some(range);
        Ok(Flow::Continue)
    }
}
