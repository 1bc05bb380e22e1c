//! In-memory stand-in for a tmux server.
//!
//! `FakeTmux` implements `CommandRunner` and interprets the subset of tmux
//! subcommands the adapter issues, so orchestration logic can be tested
//! without a real server. Panes behave like a line-echoing program: every
//! submitted line is appended to the pane buffer, and `echo <text>` also
//! appends `<text>`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use crate::error::Result;
use crate::shell::{CommandOutput, CommandRunner};

#[derive(Debug, Default)]
struct FakePane {
    id: String,
    buffer: Vec<String>,
    pending: String,
    pipe: Option<String>,
    in_mode: bool,
    interrupts: usize,
}

#[derive(Debug, Default)]
struct FakeWindow {
    id: String,
    index: u32,
    name: String,
    command: Vec<String>,
    cwd: Option<String>,
    options: HashMap<String, String>,
    panes: Vec<FakePane>,
}

#[derive(Debug, Default)]
struct FakeSession {
    windows: Vec<FakeWindow>,
}

#[derive(Debug, Default)]
struct State {
    sessions: BTreeMap<String, FakeSession>,
    next_window: u32,
    next_pane: u32,
    clients: Vec<(String, String)>,
    broken_clients: HashSet<String>,
    failing: HashSet<String>,
    calls: Vec<Vec<String>>,
}

/// Parsed `tmux <sub> [flags] [positional]` invocation
struct Parsed {
    flags: HashMap<char, Option<String>>,
    positional: Vec<String>,
}

impl Parsed {
    fn value(&self, flag: char) -> Option<&str> {
        self.flags.get(&flag).and_then(|v| v.as_deref())
    }

    fn has(&self, flag: char) -> bool {
        self.flags.contains_key(&flag)
    }
}

const VALUE_FLAGS: &[char] = &['t', 's', 'c', 'n', 'F', 'S', 'E'];

fn parse(args: &[String]) -> Parsed {
    let mut flags = HashMap::new();
    let mut positional = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--" {
            positional.extend(iter.by_ref().cloned());
            break;
        }
        if arg.len() == 2 && arg.starts_with('-') {
            let flag = arg.chars().nth(1).unwrap_or('-');
            if VALUE_FLAGS.contains(&flag) {
                flags.insert(flag, iter.next().cloned());
            } else {
                flags.insert(flag, None);
            }
            continue;
        }
        positional.push(arg.clone());
        positional.extend(iter.by_ref().cloned());
        break;
    }
    Parsed { flags, positional }
}

/// Expand the `#{...}` variables the adapter asks for in `-F` formats
fn render_window(format: &str, w: &FakeWindow) -> String {
    let mut out = String::new();
    let mut rest = format;
    while let Some(start) = rest.find("#{") {
        out.push_str(&rest[..start]);
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let var = &rest[start + 2..start + len];
        match var {
            "window_id" => out.push_str(&w.id),
            "window_index" => out.push_str(&w.index.to_string()),
            "window_name" => out.push_str(&w.name),
            opt => out.push_str(w.options.get(opt).map(String::as_str).unwrap_or("")),
        }
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);
    out.push('\n');
    out
}

fn not_found(what: &str) -> CommandOutput {
    CommandOutput::failed(1, format!("can't find {}", what))
}

impl State {
    fn window_mut(&mut self, target: &str) -> Option<&mut FakeWindow> {
        self.sessions
            .values_mut()
            .flat_map(|s| s.windows.iter_mut())
            .find(|w| w.id == target)
    }

    fn pane_mut(&mut self, target: &str) -> Option<&mut FakePane> {
        self.sessions
            .values_mut()
            .flat_map(|s| s.windows.iter_mut())
            .flat_map(|w| w.panes.iter_mut())
            .find(|p| p.id == target)
    }

    fn new_window(&mut self, index: u32, name: &str) -> FakeWindow {
        self.next_window += 1;
        self.next_pane += 1;
        FakeWindow {
            id: format!("@{}", self.next_window),
            index,
            name: name.to_string(),
            panes: vec![FakePane {
                id: format!("%{}", self.next_pane),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn dispatch(&mut self, sub: &str, p: Parsed) -> CommandOutput {
        match sub {
            "has-session" => {
                let name = p.value('t').unwrap_or("").trim_start_matches('=');
                if self.sessions.contains_key(name) {
                    CommandOutput::ok("")
                } else {
                    not_found(&format!("session: {}", name))
                }
            }
            "list-sessions" => {
                if self.sessions.is_empty() {
                    return CommandOutput::failed(1, "no server running on /tmp/tmux-0/fake");
                }
                let out: String = self.sessions.keys().map(|k| format!("{}\n", k)).collect();
                CommandOutput::ok(out)
            }
            "new-session" => {
                let name = p.value('s').unwrap_or("0").to_string();
                if self.sessions.contains_key(&name) {
                    return CommandOutput::failed(1, format!("duplicate session: {}", name));
                }
                let mut first = self.new_window(0, "shell");
                first.cwd = p.value('c').map(str::to_string);
                self.sessions.insert(name, FakeSession { windows: vec![first] });
                CommandOutput::ok("")
            }
            "kill-session" => {
                let name = p.value('t').unwrap_or("").trim_start_matches('=');
                if self.sessions.remove(name).is_some() {
                    self.clients.retain(|(_, s)| s != name);
                    CommandOutput::ok("")
                } else {
                    not_found(&format!("session: {}", name))
                }
            }
            "new-window" => {
                let target = p.value('t').unwrap_or("");
                let session = target.trim_start_matches('=').trim_end_matches(':').to_string();
                let index = match self.sessions.get(&session) {
                    Some(s) => s.windows.iter().map(|w| w.index + 1).max().unwrap_or(0),
                    None => return not_found(&format!("session: {}", session)),
                };
                let mut window = self.new_window(index, p.value('n').unwrap_or("shell"));
                window.cwd = p.value('c').map(str::to_string);
                window.command = p.positional.clone();
                let line = render_window(p.value('F').unwrap_or("#{window_id}"), &window);
                if let Some(s) = self.sessions.get_mut(&session) {
                    s.windows.push(window);
                }
                CommandOutput::ok(if p.has('P') { line } else { String::new() })
            }
            "list-windows" => {
                let name = p.value('t').unwrap_or("").trim_start_matches('=');
                let format = p.value('F').unwrap_or("#{window_index}: #{window_name}");
                match self.sessions.get(name) {
                    Some(s) => CommandOutput::ok(
                        s.windows.iter().map(|w| render_window(format, w)).collect::<String>(),
                    ),
                    None => not_found(&format!("session: {}", name)),
                }
            }
            "kill-window" => {
                let target = p.value('t').unwrap_or("");
                for session in self.sessions.values_mut() {
                    if let Some(pos) = session.windows.iter().position(|w| w.id == target) {
                        session.windows.remove(pos);
                        return CommandOutput::ok("");
                    }
                }
                not_found(&format!("window: {}", target))
            }
            "list-panes" => {
                let target = p.value('t').unwrap_or("").to_string();
                match self.window_mut(&target) {
                    Some(w) => CommandOutput::ok(
                        w.panes.iter().map(|p| format!("{}\n", p.id)).collect::<String>(),
                    ),
                    None => not_found(&format!("window: {}", target)),
                }
            }
            "set-option" => {
                let target = p.value('t').unwrap_or("").to_string();
                let key = p.positional.first().cloned().unwrap_or_default();
                let value = p.positional.get(1).cloned().unwrap_or_default();
                match self.window_mut(&target) {
                    Some(w) => {
                        w.options.insert(key, value);
                        CommandOutput::ok("")
                    }
                    None => not_found(&format!("window: {}", target)),
                }
            }
            "show-options" => {
                let target = p.value('t').unwrap_or("").to_string();
                let key = p.positional.first().cloned().unwrap_or_default();
                match self.window_mut(&target).and_then(|w| w.options.get(&key).cloned()) {
                    Some(v) => CommandOutput::ok(format!("{}\n", v)),
                    None => CommandOutput::failed(1, format!("invalid option: {}", key)),
                }
            }
            "pipe-pane" => {
                let target = p.value('t').unwrap_or("").to_string();
                let only_if_not_running = p.has('o');
                let command = p.positional.first().cloned();
                match self.pane_mut(&target) {
                    Some(pane) => {
                        if !(only_if_not_running && pane.pipe.is_some()) {
                            pane.pipe = command;
                        }
                        CommandOutput::ok("")
                    }
                    None => not_found(&format!("pane: {}", target)),
                }
            }
            "display-message" => {
                let target = p.value('t').unwrap_or("").to_string();
                match self.pane_mut(&target) {
                    Some(pane) => CommandOutput::ok(if pane.in_mode { "1\n" } else { "0\n" }),
                    None => not_found(&format!("pane: {}", target)),
                }
            }
            "send-keys" => {
                let target = p.value('t').unwrap_or("").to_string();
                let literal = p.has('l');
                let copy_mode_cmd = p.has('X');
                let pane = match self.pane_mut(&target) {
                    Some(pane) => pane,
                    None => return not_found(&format!("pane: {}", target)),
                };
                if copy_mode_cmd {
                    pane.in_mode = false;
                } else if literal {
                    pane.pending.push_str(&p.positional.concat());
                } else {
                    for key in &p.positional {
                        match key.as_str() {
                            "Enter" | "C-m" => {
                                let line = std::mem::take(&mut pane.pending);
                                if let Some(rest) = line.strip_prefix("echo ") {
                                    let rest = rest.to_string();
                                    pane.buffer.push(line);
                                    pane.buffer.push(rest);
                                } else {
                                    pane.buffer.push(line);
                                }
                            }
                            "C-c" => {
                                pane.pending.clear();
                                pane.interrupts += 1;
                                pane.buffer.push("^C".to_string());
                            }
                            other => pane.pending.push_str(other),
                        }
                    }
                }
                CommandOutput::ok("")
            }
            "capture-pane" => {
                let target = p.value('t').unwrap_or("").to_string();
                let history: usize = p
                    .value('S')
                    .and_then(|s| s.trim_start_matches('-').parse().ok())
                    .unwrap_or(0);
                match self.pane_mut(&target) {
                    Some(pane) => {
                        let skip = pane.buffer.len().saturating_sub(history);
                        let mut out: String = pane.buffer[skip..]
                            .iter()
                            .map(|l| format!("{}\n", l))
                            .collect();
                        // visible area below the cursor renders as blank lines
                        out.push_str("\n\n\n");
                        CommandOutput::ok(out)
                    }
                    None => not_found(&format!("pane: {}", target)),
                }
            }
            "list-clients" => {
                if self.sessions.is_empty() {
                    return CommandOutput::failed(1, "no server running");
                }
                CommandOutput::ok(
                    self.clients
                        .iter()
                        .map(|(tty, _)| format!("{}\n", tty))
                        .collect::<String>(),
                )
            }
            "switch-client" => {
                let tty = p.value('c').unwrap_or("").to_string();
                let session = p.value('t').unwrap_or("").trim_start_matches('=').to_string();
                if self.broken_clients.contains(&tty) {
                    return CommandOutput::failed(1, format!("can't find client: {}", tty));
                }
                if !self.sessions.contains_key(&session) {
                    return not_found(&format!("session: {}", session));
                }
                match self.clients.iter_mut().find(|(t, _)| *t == tty) {
                    Some(client) => {
                        client.1 = session;
                        CommandOutput::ok("")
                    }
                    None => CommandOutput::failed(1, format!("can't find client: {}", tty)),
                }
            }
            "select-window" => {
                let target = p.value('t').unwrap_or("").to_string();
                match self.window_mut(&target) {
                    Some(_) => CommandOutput::ok(""),
                    None => not_found(&format!("window: {}", target)),
                }
            }
            other => CommandOutput::failed(1, format!("unknown command: {}", other)),
        }
    }
}

/// Fake tmux server; clone the `Arc` to inspect state after handing it to `Tmux`
#[derive(Debug, Default)]
pub struct FakeTmux {
    state: Mutex<State>,
}

impl CommandRunner for FakeTmux {
    fn run(&self, _program: &str, args: &[String]) -> Result<CommandOutput> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(args.to_vec());

        // args: -L <socket> <subcommand> ...
        let rest = args.get(2..).unwrap_or(&[]);
        let sub = match rest.first() {
            Some(sub) => sub.clone(),
            None => return Ok(CommandOutput::failed(1, "usage")),
        };
        if state.failing.contains(&sub) {
            return Ok(CommandOutput::failed(1, format!("injected failure: {}", sub)));
        }
        Ok(state.dispatch(&sub, parse(&rest[1..])))
    }
}

impl FakeTmux {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every invocation's argument vector, including the `-L <socket>` prefix
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count_calls(&self, sub: &str) -> usize {
        self.calls().iter().filter(|c| c.get(2).map(String::as_str) == Some(sub)).count()
    }

    pub fn last_call(&self, sub: &str) -> Option<Vec<String>> {
        self.calls()
            .into_iter()
            .rev()
            .find(|c| c.get(2).map(String::as_str) == Some(sub))
    }

    /// Make every invocation of `sub` exit non-zero
    pub fn fail_subcommand(&self, sub: &str) {
        self.state.lock().unwrap().failing.insert(sub.to_string());
    }

    pub fn heal_subcommand(&self, sub: &str) {
        self.state.lock().unwrap().failing.remove(sub);
    }

    /// Remove a window behind the orchestrator's back
    pub fn kill_window_out_of_band(&self, window_id: &str) {
        let mut state = self.state.lock().unwrap();
        for session in state.sessions.values_mut() {
            session.windows.retain(|w| w.id != window_id);
        }
    }

    /// Simulate the server exiting and a fresh one starting: every session
    /// and client is gone and window/pane ids count up from the start again
    pub fn restart_server(&self) {
        let mut state = self.state.lock().unwrap();
        state.sessions.clear();
        state.clients.clear();
        state.next_window = 0;
        state.next_pane = 0;
    }

    /// Remove a session behind the orchestrator's back
    pub fn kill_session_out_of_band(&self, session: &str) {
        self.state.lock().unwrap().sessions.remove(session);
    }

    pub fn strip_panes(&self, window_id: &str) {
        if let Some(w) = self.state.lock().unwrap().window_mut(window_id) {
            w.panes.clear();
        }
    }

    pub fn window_ids(&self, session: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .sessions
            .get(session)
            .map(|s| s.windows.iter().map(|w| w.id.clone()).collect())
            .unwrap_or_default()
    }

    pub fn window_command(&self, window_id: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .window_mut(window_id)
            .map(|w| w.command.clone())
            .unwrap_or_default()
    }

    pub fn window_cwd(&self, window_id: &str) -> Option<String> {
        self.state.lock().unwrap().window_mut(window_id).and_then(|w| w.cwd.clone())
    }

    pub fn window_option(&self, window_id: &str, key: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .window_mut(window_id)
            .and_then(|w| w.options.get(key).cloned())
    }

    pub fn pending_input(&self, pane: &str) -> String {
        self.state
            .lock()
            .unwrap()
            .pane_mut(pane)
            .map(|p| p.pending.clone())
            .unwrap_or_default()
    }

    pub fn pane_buffer(&self, pane: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .pane_mut(pane)
            .map(|p| p.buffer.clone())
            .unwrap_or_default()
    }

    pub fn interrupts(&self, pane: &str) -> usize {
        self.state.lock().unwrap().pane_mut(pane).map(|p| p.interrupts).unwrap_or(0)
    }

    pub fn push_output(&self, pane: &str, line: &str) {
        if let Some(p) = self.state.lock().unwrap().pane_mut(pane) {
            p.buffer.push(line.to_string());
        }
    }

    pub fn pipe_command(&self, pane: &str) -> Option<String> {
        self.state.lock().unwrap().pane_mut(pane).and_then(|p| p.pipe.clone())
    }

    pub fn set_copy_mode(&self, pane: &str, on: bool) {
        if let Some(p) = self.state.lock().unwrap().pane_mut(pane) {
            p.in_mode = on;
        }
    }

    pub fn in_copy_mode(&self, pane: &str) -> bool {
        self.state.lock().unwrap().pane_mut(pane).map(|p| p.in_mode).unwrap_or(false)
    }

    pub fn add_client(&self, tty: &str, session: &str) {
        self.state
            .lock()
            .unwrap()
            .clients
            .push((tty.to_string(), session.to_string()));
    }

    /// Client that is listed but rejects switch-client
    pub fn break_client(&self, tty: &str) {
        self.state.lock().unwrap().broken_clients.insert(tty.to_string());
    }

    pub fn client_session(&self, tty: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .clients
            .iter()
            .find(|(t, _)| t == tty)
            .map(|(_, s)| s.clone())
    }
}
