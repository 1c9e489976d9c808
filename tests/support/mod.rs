#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};

use chatterm::Terminal;

type InputHandler = Box<dyn FnMut(String) + Send>;
type ResizeHandler = Box<dyn FnMut() + Send>;

#[derive(Default)]
pub struct TerminalTrace {
    pub writes: Vec<String>,
    pub start_calls: usize,
    pub stop_calls: usize,
    pub drain_calls: Vec<(u64, u64)>,
    pub on_input: Option<InputHandler>,
    pub on_resize: Option<ResizeHandler>,
    pub columns: u16,
    pub rows: u16,
}

pub struct SharedTerminal {
    state: Arc<Mutex<TerminalTrace>>,
}

impl SharedTerminal {
    pub fn new(columns: u16, rows: u16) -> (Self, Arc<Mutex<TerminalTrace>>) {
        let state = Arc::new(Mutex::new(TerminalTrace {
            columns,
            rows,
            ..TerminalTrace::default()
        }));
        (
            Self {
                state: Arc::clone(&state),
            },
            state,
        )
    }
}

impl Terminal for SharedTerminal {
    fn start(&mut self, on_input: InputHandler, on_resize: ResizeHandler) -> std::io::Result<()> {
        let mut state = lock_unpoisoned(&self.state);
        state.start_calls += 1;
        state.on_input = Some(on_input);
        state.on_resize = Some(on_resize);
        Ok(())
    }

    fn stop(&mut self) -> std::io::Result<()> {
        let mut state = lock_unpoisoned(&self.state);
        state.stop_calls += 1;
        state.on_input = None;
        state.on_resize = None;
        Ok(())
    }

    fn drain_input(&mut self, max_ms: u64, idle_ms: u64) {
        lock_unpoisoned(&self.state)
            .drain_calls
            .push((max_ms, idle_ms));
    }

    fn write(&mut self, data: &str) {
        lock_unpoisoned(&self.state).writes.push(data.to_string());
    }

    fn columns(&self) -> u16 {
        lock_unpoisoned(&self.state).columns
    }

    fn rows(&self) -> u16 {
        lock_unpoisoned(&self.state).rows
    }
}

pub fn inject_input(state: &Arc<Mutex<TerminalTrace>>, data: &str) {
    let mut state = lock_unpoisoned(state);
    let Some(on_input) = state.on_input.as_mut() else {
        panic!("terminal input handler is not registered");
    };

    on_input(data.to_string());
}

pub fn resize(state: &Arc<Mutex<TerminalTrace>>, columns: u16, rows: u16) {
    let mut state = lock_unpoisoned(state);
    state.columns = columns;
    state.rows = rows;
    let Some(on_resize) = state.on_resize.as_mut() else {
        panic!("terminal resize handler is not registered");
    };
    on_resize();
}

pub fn rendered_output(state: &Arc<Mutex<TerminalTrace>>) -> String {
    lock_unpoisoned(state).writes.join("")
}

pub fn take_output(state: &Arc<Mutex<TerminalTrace>>) -> String {
    std::mem::take(&mut lock_unpoisoned(state).writes).join("")
}

pub fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
