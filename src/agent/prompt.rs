//! Default prompt and interactive hints.

/// System message seeded into every session unless configured otherwise.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a calendar assistant. You can create, list, and cancel \
Google Calendar events using the provided tools. Prefer ISO 8601 for times; default timezone is \
Asia/Colombo. Ask for any missing required fields before creating or canceling events.";

/// Example request shown after connecting.
pub const USAGE_HINT: &str =
    "Type your request (e.g., \u{201c}Create a 1-hour Meet \u{2018}OU workshop prep\u{2019} today 3pm, invite a@x.com\u{201d}).";

pub const QUIT_HINT: &str = "Type 'quit' to exit.";

pub const PROMPT: &str = "> ";

/// Whether an input line ends the session.
pub fn is_quit_command(line: &str) -> bool {
    let line = line.trim();
    line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit")
}
