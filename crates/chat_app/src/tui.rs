//! Render layer: a pure function from [`App`] to terminal lines.

use chat_store::Room;
use chatterm::{fit_to_width, truncate_to_width, visible_width, Component};

use crate::app::App;
use crate::room_list::ROWS_PER_ROOM;
use crate::session::{SessionState, SyncProgress};
use crate::summary::{format_stamp, preview_text};

/// Narrowest terminal that shows the list and the detail pane side by side.
const SPLIT_MIN_WIDTH: usize = 60;
const PANE_SEPARATOR: &str = " │ ";
const PROGRESS_BAR_WIDTH: usize = 20;
const ROOM_HINTS: &str = "j/k move · gg/G top/bottom · enter open · esc close · q quit · ctrl+q log out";

fn ansi_wrap(text: &str, prefix: &str, suffix: &str) -> String {
    format!("{prefix}{text}{suffix}")
}

fn dim(text: &str) -> String {
    ansi_wrap(text, "\x1b[2m", "\x1b[22m")
}

fn bold(text: &str) -> String {
    ansi_wrap(text, "\x1b[1m", "\x1b[22m")
}

fn cyan(text: &str) -> String {
    ansi_wrap(text, "\x1b[36m", "\x1b[39m")
}

fn green(text: &str) -> String {
    ansi_wrap(text, "\x1b[32m", "\x1b[39m")
}

fn yellow(text: &str) -> String {
    ansi_wrap(text, "\x1b[33m", "\x1b[39m")
}

fn red(text: &str) -> String {
    ansi_wrap(text, "\x1b[31m", "\x1b[39m")
}

/// Borrowing view handed to the terminal for one frame.
pub struct AppView<'a> {
    app: &'a App,
}

impl<'a> AppView<'a> {
    pub fn new(app: &'a App) -> Self {
        Self { app }
    }
}

impl Component for AppView<'_> {
    fn render(&mut self, width: usize, height: usize) -> Vec<String> {
        render_app(self.app, width, height)
    }
}

/// Header, banner, body and footer for the current state.
pub fn render_app(app: &App, width: usize, height: usize) -> Vec<String> {
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let mut lines = vec![render_header(app, width)];
    if height < 4 {
        lines.resize(height, String::new());
        return lines;
    }

    lines.push(render_banner(app, width));
    let body_height = height - 3;
    let mut body = match app.state() {
        SessionState::Loading => vec![String::new(), "  ⠋ Loading...".to_string()],
        SessionState::Welcome { notice } => render_welcome(notice.as_deref()),
        SessionState::Connecting => vec![String::new(), "  Connecting...".to_string()],
        SessionState::Pairing { code, status } => render_pairing(code.as_deref(), status),
        SessionState::HistorySync(_) | SessionState::Ready { .. } => {
            render_rooms(app, width, body_height)
        }
        SessionState::Error(message) => vec![
            String::new(),
            format!("  {}", red(&bold("Error"))),
            format!("  {message}"),
            String::new(),
            format!("  {}", dim("Press q to quit.")),
        ],
        SessionState::Exiting { message } => vec![String::new(), format!("  {message}")],
    };
    body.resize(body_height, String::new());
    lines.extend(body);
    lines.push(render_footer(app, width));
    lines
}

fn render_header(app: &App, width: usize) -> String {
    let count = app.rooms().len();
    let chats = match count {
        0 => String::new(),
        1 => " · 1 chat".to_string(),
        count => format!(" · {count} chats"),
    };
    truncate_to_width(
        &format!(" {}{}", bold("chatterm"), dim(&chats)),
        width,
        "…",
    )
}

fn render_banner(app: &App, width: usize) -> String {
    let banner = match app.state() {
        SessionState::HistorySync(progress) => {
            let label = sync_label(progress);
            format!(
                " {} {}",
                yellow(&format!("{label} · {} chats", app.rooms().len())),
                progress_bar(progress.percent)
            )
        }
        SessionState::Ready {
            overlay: Some(progress),
        } => yellow(&format!(" {} in background {}%", sync_label(progress), progress.percent)),
        _ => dim(&"─".repeat(width)),
    };
    truncate_to_width(&banner, width, "…")
}

fn sync_label(progress: &SyncProgress) -> String {
    if progress.sync_type.is_empty() {
        "Syncing history".to_string()
    } else {
        format!("Syncing {}", progress.sync_type)
    }
}

fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * PROGRESS_BAR_WIDTH / 100;
    format!(
        "[{}{}] {percent}%",
        green(&"#".repeat(filled)),
        dim(&".".repeat(PROGRESS_BAR_WIDTH - filled))
    )
}

fn render_welcome(notice: Option<&str>) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        format!("  {}", bold("Welcome to chatterm")),
        String::new(),
        "  Link this terminal to your messaging account.".to_string(),
        "  Press Enter to start pairing.".to_string(),
    ];
    if let Some(notice) = notice {
        lines.push(String::new());
        lines.push(format!("  {}", red(notice)));
    }
    lines
}

fn render_pairing(code: Option<&str>, status: &str) -> Vec<String> {
    let code_line = match code {
        Some(code) => format!("  Pairing code: {}", cyan(&bold(code))),
        None => format!("  {}", dim("Waiting for a pairing code...")),
    };
    vec![
        String::new(),
        format!("  {}", bold("Pairing")),
        format!("  {status}"),
        String::new(),
        code_line,
    ]
}

fn render_rooms(app: &App, width: usize, height: usize) -> Vec<String> {
    let rooms = app.rooms();
    let opened = rooms.opened_room();

    let Some(opened) = opened else {
        return render_room_list(app, width, height);
    };
    if width < SPLIT_MIN_WIDTH {
        return render_detail(app, opened, width, height);
    }

    let separator_width = visible_width(PANE_SEPARATOR);
    let list_width = width * 2 / 5;
    let detail_width = width - list_width - separator_width;
    let list = render_room_list(app, list_width, height);
    let detail = render_detail(app, opened, detail_width, height);

    list.iter()
        .zip(detail.iter())
        .map(|(left, right)| {
            format!(
                "{}{}{}",
                fit_to_width(left, list_width),
                dim(PANE_SEPARATOR),
                right
            )
        })
        .collect()
}

fn render_room_list(app: &App, width: usize, height: usize) -> Vec<String> {
    let rooms = app.rooms();
    let mut lines = Vec::with_capacity(height);

    if rooms.is_empty() {
        let waiting = if matches!(app.state(), SessionState::HistorySync(_)) {
            "Waiting for history..."
        } else {
            "No chats yet"
        };
        lines.push(String::new());
        lines.push(format!("  {}", dim(waiting)));
    }

    for index in rooms.visible_range(height) {
        let room = &rooms.rooms()[index];
        let selected = rooms.cursor() == Some(index);
        let opened = rooms.opened_index() == Some(index);
        lines.extend(render_room(room, selected, opened, width));
    }

    lines.resize(height, String::new());
    lines
}

fn render_room(room: &Room, selected: bool, opened: bool, width: usize) -> [String; ROWS_PER_ROOM] {
    let marker = if selected { cyan("›") } else { " ".to_string() };
    let title = if opened {
        cyan(&bold(&room.title))
    } else if room.unread_count > 0 {
        bold(&room.title)
    } else {
        room.title.clone()
    };
    let stamp = room.time.map(format_stamp).unwrap_or_default();

    let stamp_width = visible_width(&stamp);
    let title_budget = width.saturating_sub(stamp_width + 3);
    let left = format!("{marker} {}", truncate_to_width(&title, title_budget, "…"));
    let gap = width.saturating_sub(visible_width(&left) + stamp_width);
    let title_line = format!("{left}{}{}", " ".repeat(gap), dim(&stamp));

    let mut preview_line = format!("  {}", dim(&preview_text(&room.last_message)));
    if room.unread_count > 0 {
        preview_line.push(' ');
        preview_line.push_str(&green(&format!("({})", room.unread_count)));
    }

    [
        title_line,
        truncate_to_width(&preview_line, width, "…"),
        String::new(),
    ]
}

fn render_detail(app: &App, room: &Room, width: usize, height: usize) -> Vec<String> {
    let mut lines = vec![
        truncate_to_width(&bold(&room.title), width, "…"),
        dim(&"─".repeat(width)),
    ];
    let capacity = height.saturating_sub(lines.len());
    let history: Vec<&str> = app.summaries().lines(&room.id).collect();
    if history.is_empty() {
        lines.push(dim("No recent messages"));
    } else {
        let skip = history.len().saturating_sub(capacity);
        lines.extend(
            history[skip..]
                .iter()
                .map(|line| truncate_to_width(line, width, "…")),
        );
    }
    lines.resize(height, String::new());
    lines
}

fn render_footer(app: &App, width: usize) -> String {
    let footer = match (app.status(), app.state()) {
        (Some(status), _) => yellow(status),
        (None, state) if state.shows_rooms() => dim(ROOM_HINTS),
        (None, SessionState::Welcome { .. }) => dim("enter pair · q quit"),
        (None, _) => dim("q quit"),
    };
    truncate_to_width(&format!(" {footer}"), width, "…")
}
