use std::path::PathBuf;

use gide_debug::presenter::Intent;

/// Command typed at the console.
#[derive(Debug, PartialEq, Eq)]
pub enum Line {
    /// Nothing to do.
    Empty,

    /// Forwarded to the controller as is.
    Intent(Intent),

    /// Read-only request, answered from the session state or the backend.
    Query(Query),

    /// Prints the available commands.
    Help,

    /// Ends the session and exits.
    Quit,
}

/// Read-only request typed at the console.
#[derive(Debug, PartialEq, Eq)]
pub enum Query {
    Breaks,
    Stack,
    Vars,
    Threads,
    Tasks,
    Pid,
    Print(String),
    Set { name: String, value: String },
    Globals(String),
    Sources(String),
    Funcs(String),
    Types(String),
}

/// Error of a malformed console command.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command {0:?} (try `help`)")]
    Unknown(String),

    #[error("`{0}` expects {1}")]
    Usage(&'static str, &'static str),
}

pub const HELP: &str = "\
b, break FILE:LINE         add a breakpoint
clear FILE:LINE            delete a breakpoint
enable|disable FILE:LINE   turn a breakpoint on or off
cond FILE:LINE [EXPR]      set (or remove) the condition of a breakpoint
trace FILE:LINE [off]      make a breakpoint a tracepoint (or not)
c, continue                resume execution
rw, rewind                 resume execution backwards
n, next                    step over
s, step                    step into
so, stepout                step out
si, stepi                  step a single instruction
stop                       suspend the running process
cancel                     cancel an interrupted step
frame N                    select a frame
thread ID                  select a thread (or goroutine)
bt, stack                  print the stack
vars, locals               print the variables of the selected frame
threads, tasks             print the threads or goroutines
breaks                     print the breakpoints
p, print EXPR              print a variable
set NAME = VALUE           change a variable
globals|sources|funcs|types [FILTER]
pid                        print the process ID
restart                    restart the process
detach [kill]              detach from the process
disconnect [cont]          leave the debugger server running
q, quit                    kill the process and exit";

/// Parses a console line.
pub fn parse(line: &str) -> Result<Line, ParseError> {
    let line = line.trim();

    let (cmd, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(cmd, rest)| (cmd, rest.trim()));

    let intent = match cmd {
        "" => return Ok(Line::Empty),
        "help" | "h" | "?" => return Ok(Line::Help),
        "quit" | "q" | "exit" => return Ok(Line::Quit),

        "b" | "break" => {
            let (file, line) = location("break", rest)?;
            Intent::AddBreak { file, line }
        }
        "clear" => {
            let (file, line) = location("clear", rest)?;
            Intent::DeleteBreak { file, line }
        }
        "enable" | "disable" => {
            let on = cmd == "enable";
            let (file, line) = location(if on { "enable" } else { "disable" }, rest)?;
            Intent::EnableBreak { file, line, on }
        }
        "cond" => {
            let (loc, cond) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let (file, line) = location("cond", loc)?;
            Intent::AmendBreak {
                file,
                line,
                cond: cond.trim().to_owned(),
                trace: false,
            }
        }
        "trace" => {
            let (loc, flag) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let (file, line) = location("trace", loc)?;
            Intent::AmendBreak {
                file,
                line,
                cond: String::new(),
                trace: flag.trim() != "off",
            }
        }

        "c" | "continue" => Intent::Continue,
        "rw" | "rewind" => Intent::Rewind,
        "n" | "next" => Intent::Next,
        "s" | "step" => Intent::Step,
        "so" | "stepout" => Intent::StepOut,
        "si" | "stepi" => Intent::SingleStep,
        "stop" | "halt" => Intent::Stop,
        "cancel" => Intent::CancelNext,
        "restart" | "r" => Intent::Restart,
        "detach" => Intent::Detach {
            kill: rest == "kill",
        },
        "disconnect" => Intent::Disconnect {
            cont: rest == "cont",
        },

        "frame" | "f" => Intent::SetFrame(
            rest.parse()
                .map_err(|_| ParseError::Usage("frame", "a frame depth"))?,
        ),
        "thread" | "tr" | "goroutine" | "gr" => Intent::SetThread(
            rest.parse()
                .map_err(|_| ParseError::Usage("thread", "a thread ID"))?,
        ),

        _ => return query(cmd, rest).map(Line::Query),
    };

    Ok(Line::Intent(intent))
}

fn query(cmd: &str, rest: &str) -> Result<Query, ParseError> {
    let query = match cmd {
        "breaks" | "bl" => Query::Breaks,
        "bt" | "stack" => Query::Stack,
        "vars" | "locals" => Query::Vars,
        "threads" => Query::Threads,
        "tasks" | "goroutines" => Query::Tasks,
        "pid" => Query::Pid,
        "p" | "print" if !rest.is_empty() => Query::Print(rest.to_owned()),
        "p" | "print" => return Err(ParseError::Usage("print", "an expression")),
        "set" => {
            let (name, value) = rest
                .split_once('=')
                .map(|(name, value)| (name.trim(), value.trim()))
                .filter(|(name, value)| !name.is_empty() && !value.is_empty())
                .ok_or(ParseError::Usage("set", "NAME = VALUE"))?;
            Query::Set {
                name: name.to_owned(),
                value: value.to_owned(),
            }
        }
        "globals" => Query::Globals(rest.to_owned()),
        "sources" => Query::Sources(rest.to_owned()),
        "funcs" => Query::Funcs(rest.to_owned()),
        "types" => Query::Types(rest.to_owned()),
        other => return Err(ParseError::Unknown(other.to_owned())),
    };

    Ok(query)
}

/// Parses a `FILE:LINE` location.
fn location(cmd: &'static str, arg: &str) -> Result<(PathBuf, u32), ParseError> {
    arg.rsplit_once(':')
        .filter(|(file, _)| !file.is_empty())
        .and_then(|(file, line)| Some((PathBuf::from(file), line.parse().ok()?)))
        .ok_or(ParseError::Usage(cmd, "a FILE:LINE location"))
}
