//! Printers: text and markdown (termimad), plus status and error lines.

use owo_colors::OwoColorize;
use termimad::MadSkin;

pub struct TextPrinter {
    pub color: Option<&'static str>,
}

impl TextPrinter {
    pub fn print(&self, text: &str) {
        if let Some(c) = self.color {
            match c {
                "green" => println!("{}", text.green()),
                "cyan" => println!("{}", text.cyan()),
                "magenta" => println!("{}", text.magenta()),
                "yellow" => println!("{}", text.yellow()),
                _ => println!("{}", text),
            }
        } else {
            println!("{}", text);
        }
    }
}

pub struct MarkdownPrinter {
    pub skin: MadSkin,
}

impl Default for MarkdownPrinter {
    fn default() -> Self {
        Self { skin: MadSkin::default() }
    }
}

impl MarkdownPrinter {
    pub fn print(&self, text: &str) {
        self.skin.print_text(text);
        println!();
    }
}

/// Print a titled block, as Markdown or as plain text.
pub fn print_section(title: &str, body: &str, markdown: bool) {
    if markdown {
        MarkdownPrinter::default().print(&format!("## {}\n\n{}", title, body));
    } else {
        TextPrinter { color: Some("cyan") }.print(title);
        println!("{}\n", body);
    }
}

/// Section header printed before streamed text.
pub fn print_heading(title: &str) {
    TextPrinter { color: Some("cyan") }.print(title);
}

pub fn print_error(message: &str) {
    eprintln!("{}", message.red());
}

pub fn print_warning(message: &str) {
    eprintln!("{}", message.yellow());
}

/// Progress line on stderr, only when stderr is a terminal.
pub fn print_status(message: &str) {
    use is_terminal::IsTerminal;
    if std::io::stderr().is_terminal() {
        eprintln!("{}", message.dimmed());
    }
}
