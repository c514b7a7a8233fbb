//! Terminal rendering of transcript bubbles.
//!
//! `ChatRenderer` combines `termimad` for prose and `syntect` for fenced code
//! blocks. Synthetic warning messages are printed as-is in yellow.

use std::time::Duration;

use console::style;
use crossterm::style::Color;
use indicatif::{ProgressBar, ProgressStyle};
use parley_core::client::controller::ERROR_MARKER;
use parley_types::history::{ChatMessage, MessageRole};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Style, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::as_24_bit_terminal_escaped;
use termimad::MadSkin;

const CODE_THEME: &str = "base16-ocean.dark";

pub struct ChatRenderer {
    skin: MadSkin,
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

impl ChatRenderer {
    /// Create a renderer with an accent color for headers and bold text.
    pub fn new(accent_color: Color) -> Self {
        let mut skin = MadSkin::default_dark();

        let tc = Self::crossterm_to_termimad(accent_color);
        skin.bold.set_fg(tc);
        skin.headers[0].set_fg(tc);
        skin.headers[1].set_fg(tc);
        skin.inline_code
            .set_fg(termimad::crossterm::style::Color::Yellow);

        Self {
            skin,
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
        }
    }

    /// Print one transcript message as a labelled bubble.
    pub fn print_message(&self, message: &ChatMessage) {
        let text = message
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        match message.role {
            MessageRole::User => {
                println!("  {} {}", style("You >").green().bold(), text);
            }
            MessageRole::Model if text.starts_with(ERROR_MARKER) => {
                println!("  {} {}", style("Model >").cyan().bold(), style(text).yellow());
            }
            MessageRole::Model => {
                let rendered = self.render_final(&text);
                println!("  {} {}", style("Model >").cyan().bold(), rendered.trim());
            }
        }
        println!();
    }

    /// Print a whole transcript.
    pub fn print_transcript(&self, messages: &[ChatMessage]) {
        for message in messages {
            self.print_message(message);
        }
    }

    /// Render markdown with syntax-highlighted code blocks.
    ///
    /// Code fences with a language tag are highlighted via syntect; everything
    /// else is rendered through termimad.
    pub fn render_final(&self, markdown: &str) -> String {
        let mut output = String::new();
        let mut in_code_block = false;
        let mut code_lang = String::new();
        let mut code_buf = String::new();

        for line in markdown.lines() {
            if line.starts_with("```") {
                if in_code_block {
                    output.push_str(&self.highlight_code(&code_buf, &code_lang));
                    output.push('\n');
                } else {
                    code_lang = line.trim_start_matches('`').trim().to_string();
                    code_buf.clear();
                }
                in_code_block = !in_code_block;
            } else if in_code_block {
                code_buf.push_str(line);
                code_buf.push('\n');
            } else {
                output.push_str(&self.skin.term_text(line).to_string());
            }
        }

        // Unclosed fence
        if in_code_block && !code_buf.is_empty() {
            output.push_str(&self.highlight_code(&code_buf, &code_lang));
        }

        output
    }

    fn highlight_code(&self, code: &str, lang: &str) -> String {
        let syntax = if lang.is_empty() {
            self.syntax_set.find_syntax_plain_text()
        } else {
            self.syntax_set
                .find_syntax_by_token(lang)
                .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
        };

        let mut output = String::new();
        output.push_str(&format!("  {}\n", style(format!("--- {lang} ---")).dim()));

        let Some(theme) = self.theme_set.themes.get(CODE_THEME) else {
            for line in code.lines() {
                output.push_str(&format!("  {line}\n"));
            }
            return output;
        };
        let mut h = HighlightLines::new(syntax, theme);

        for line in code.lines() {
            let ranges: Vec<(Style, &str)> = h
                .highlight_line(line, &self.syntax_set)
                .unwrap_or_default();
            let escaped = as_24_bit_terminal_escaped(&ranges[..], false);
            output.push_str(&format!("  {escaped}\x1b[0m\n"));
        }

        output
    }

    fn crossterm_to_termimad(color: Color) -> termimad::crossterm::style::Color {
        match color {
            Color::Cyan => termimad::crossterm::style::Color::Cyan,
            Color::Green => termimad::crossterm::style::Color::Green,
            Color::Yellow => termimad::crossterm::style::Color::Yellow,
            Color::Magenta => termimad::crossterm::style::Color::Magenta,
            Color::Blue => termimad::crossterm::style::Color::Blue,
            Color::Rgb { r, g, b } => termimad::crossterm::style::Color::Rgb { r, g, b },
            _ => termimad::crossterm::style::Color::Cyan,
        }
    }
}

/// Spinner shown while a message is in flight.
pub fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("thinking...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}
