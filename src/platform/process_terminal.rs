//! Process-backed terminal: raw mode on stdin, writes to stdout.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use libc::{self, c_int};
use signal_hook::iterator::Signals;

use crate::config::TerminalConfig;
use crate::core::terminal::Terminal;

type InputHandler = Box<dyn FnMut(String) + Send>;
type ResizeHandler = Box<dyn FnMut() + Send>;

const INPUT_POLL_MS: i32 = 50;

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_all_fd(fd: c_int, mut bytes: &[u8]) -> std::io::Result<()> {
    while !bytes.is_empty() {
        let result = unsafe { libc::write(fd, bytes.as_ptr().cast::<libc::c_void>(), bytes.len()) };
        if result < 0 {
            let err = std::io::Error::last_os_error();
            match err.kind() {
                std::io::ErrorKind::Interrupted => continue,
                std::io::ErrorKind::WouldBlock => {
                    poll_fd(fd, libc::POLLOUT, -1);
                    continue;
                }
                _ => return Err(err),
            }
        }
        if result == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                "write returned 0",
            ));
        }
        bytes = &bytes[result as usize..];
    }
    Ok(())
}

fn poll_fd(fd: c_int, events: libc::c_short, timeout_ms: i32) -> bool {
    let mut fds = libc::pollfd {
        fd,
        events,
        revents: 0,
    };
    let result = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
    result > 0 && (fds.revents & events) != 0
}

fn read_winsize(fd: c_int) -> Option<(u16, u16)> {
    let mut size = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut size) };
    if result == 0 && size.ws_col > 0 && size.ws_row > 0 {
        Some((size.ws_col, size.ws_row))
    } else {
        None
    }
}

fn get_termios(fd: c_int) -> std::io::Result<libc::termios> {
    let mut termios = unsafe { std::mem::zeroed::<libc::termios>() };
    if unsafe { libc::tcgetattr(fd, &mut termios) } != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(termios)
}

fn set_termios(fd: c_int, termios: &libc::termios) -> std::io::Result<()> {
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) } != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

pub struct ProcessTerminal {
    stdin_fd: c_int,
    stdout_fd: c_int,
    original_termios: Option<libc::termios>,
    input_handler: Arc<Mutex<Option<InputHandler>>>,
    resize_handler: Arc<Mutex<Option<ResizeHandler>>>,
    input_thread: Option<JoinHandle<()>>,
    stop_flag: Arc<AtomicBool>,
    drain_mode: Arc<AtomicBool>,
    last_input_time: Arc<AtomicU64>,
    write_log_path: Option<PathBuf>,
    write_log_failed: bool,
    resize_signal_handle: Option<signal_hook::iterator::Handle>,
    resize_thread: Option<JoinHandle<()>>,
}

impl ProcessTerminal {
    pub fn new() -> Self {
        Self::with_config(&TerminalConfig::from_env())
    }

    pub fn with_config(config: &TerminalConfig) -> Self {
        Self {
            stdin_fd: libc::STDIN_FILENO,
            stdout_fd: libc::STDOUT_FILENO,
            original_termios: None,
            input_handler: Arc::new(Mutex::new(None)),
            resize_handler: Arc::new(Mutex::new(None)),
            input_thread: None,
            stop_flag: Arc::new(AtomicBool::new(false)),
            drain_mode: Arc::new(AtomicBool::new(false)),
            last_input_time: Arc::new(AtomicU64::new(now_ms())),
            write_log_path: config.write_log.clone(),
            write_log_failed: false,
            resize_signal_handle: None,
            resize_thread: None,
        }
    }

    fn enable_raw_mode(&mut self) -> std::io::Result<()> {
        let original = match self.original_termios {
            Some(original) => original,
            None => {
                let original = get_termios(self.stdin_fd)?;
                self.original_termios = Some(original);
                original
            }
        };
        let mut raw = original;
        unsafe {
            libc::cfmakeraw(&mut raw);
        }
        set_termios(self.stdin_fd, &raw)
    }

    fn restore_raw_mode(&mut self) -> std::io::Result<()> {
        if let Some(original) = self.original_termios.as_ref() {
            set_termios(self.stdin_fd, original)?;
        }
        Ok(())
    }

    fn start_input_thread(&mut self) -> std::io::Result<()> {
        let stdin_fd = self.stdin_fd;
        let input_handler = Arc::clone(&self.input_handler);
        let stop_flag = Arc::clone(&self.stop_flag);
        let drain_mode = Arc::clone(&self.drain_mode);
        let last_input_time = Arc::clone(&self.last_input_time);

        let handle = thread::Builder::new()
            .name("chatterm-input".to_string())
            .spawn(move || {
                let mut buffer = [0u8; 4096];
                // Holds the tail of a UTF-8 character split across reads.
                let mut pending = Vec::new();

                while !stop_flag.load(Ordering::SeqCst) {
                    if !poll_fd(stdin_fd, libc::POLLIN, INPUT_POLL_MS) {
                        continue;
                    }
                    let read_len = unsafe {
                        libc::read(stdin_fd, buffer.as_mut_ptr().cast::<libc::c_void>(), buffer.len())
                    };
                    if read_len <= 0 {
                        continue;
                    }
                    last_input_time.store(now_ms(), Ordering::SeqCst);
                    if drain_mode.load(Ordering::SeqCst) {
                        pending.clear();
                        continue;
                    }

                    pending.extend_from_slice(&buffer[..read_len as usize]);
                    let valid_up_to = match std::str::from_utf8(&pending) {
                        Ok(_) => pending.len(),
                        Err(error) if error.error_len().is_none() => error.valid_up_to(),
                        Err(_) => pending.len(),
                    };
                    let chunk = String::from_utf8_lossy(&pending[..valid_up_to]).into_owned();
                    pending.drain(..valid_up_to);

                    if chunk.is_empty() {
                        continue;
                    }
                    if let Some(handler) = lock_unpoisoned(&input_handler).as_mut() {
                        handler(chunk);
                    }
                }
            })?;
        self.input_thread = Some(handle);
        Ok(())
    }

    fn stop_input_thread(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.input_thread.take() {
            let _ = handle.join();
        }
    }

    fn start_resize_thread(&mut self) -> std::io::Result<()> {
        let mut signals = Signals::new([libc::SIGWINCH])?;
        let handle = signals.handle();
        let resize_handler = Arc::clone(&self.resize_handler);

        let thread = thread::Builder::new()
            .name("chatterm-resize".to_string())
            .spawn(move || {
                for _ in signals.forever() {
                    if let Some(handler) = lock_unpoisoned(&resize_handler).as_mut() {
                        handler();
                    }
                }
            })?;

        self.resize_signal_handle = Some(handle);
        self.resize_thread = Some(thread);
        Ok(())
    }

    fn stop_resize_thread(&mut self) {
        if let Some(handle) = self.resize_signal_handle.take() {
            handle.close();
        }
        if let Some(thread) = self.resize_thread.take() {
            let _ = thread.join();
        }
    }

    fn clear_handlers(&self) {
        *lock_unpoisoned(&self.input_handler) = None;
        *lock_unpoisoned(&self.resize_handler) = None;
    }

    fn append_write_log(&mut self, data: &str) {
        if self.write_log_failed {
            return;
        }
        if let Some(path) = self.write_log_path.as_ref() {
            let result = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut file| file.write_all(data.as_bytes()));
            if result.is_err() {
                self.write_log_failed = true;
            }
        }
    }
}

impl Default for ProcessTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal for ProcessTerminal {
    fn start(&mut self, on_input: InputHandler, on_resize: ResizeHandler) -> std::io::Result<()> {
        *lock_unpoisoned(&self.input_handler) = Some(on_input);
        *lock_unpoisoned(&self.resize_handler) = Some(on_resize);

        self.stop_flag.store(false, Ordering::SeqCst);
        self.drain_mode.store(false, Ordering::SeqCst);
        self.last_input_time.store(now_ms(), Ordering::SeqCst);

        if let Err(err) = self.enable_raw_mode() {
            self.clear_handlers();
            return Err(err);
        }
        if let Err(err) = self
            .start_resize_thread()
            .and_then(|()| self.start_input_thread())
        {
            self.stop_resize_thread();
            self.clear_handlers();
            let _ = self.restore_raw_mode();
            return Err(err);
        }

        Ok(())
    }

    fn stop(&mut self) -> std::io::Result<()> {
        self.stop_input_thread();
        self.stop_resize_thread();
        self.clear_handlers();

        // Flush input before leaving raw mode so buffered bytes never reach the shell.
        let _ = unsafe { libc::tcflush(self.stdin_fd, libc::TCIFLUSH) };

        self.restore_raw_mode()
    }

    fn drain_input(&mut self, max_ms: u64, idle_ms: u64) {
        self.drain_mode.store(true, Ordering::SeqCst);
        self.last_input_time.store(now_ms(), Ordering::SeqCst);

        let end_time = now_ms().saturating_add(max_ms);
        loop {
            let now = now_ms();
            if now >= end_time {
                break;
            }
            let last_input = self.last_input_time.load(Ordering::SeqCst);
            if now.saturating_sub(last_input) >= idle_ms {
                break;
            }

            let sleep_for = idle_ms.min(end_time.saturating_sub(now)).max(1);
            thread::sleep(Duration::from_millis(sleep_for));
        }

        self.drain_mode.store(false, Ordering::SeqCst);
    }

    fn write(&mut self, data: &str) {
        if data.is_empty() {
            return;
        }
        // A closed stdout leaves nothing useful to report to.
        let _ = write_all_fd(self.stdout_fd, data.as_bytes());
        self.append_write_log(data);
    }

    fn columns(&self) -> u16 {
        read_winsize(self.stdout_fd).map_or(80, |(cols, _)| cols)
    }

    fn rows(&self) -> u16 {
        read_winsize(self.stdout_fd).map_or(24, |(_, rows)| rows)
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
