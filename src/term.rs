use crate::{TermInt, Coords};
use std::{io::{Stdout, Write, stdout}, time::Duration};

use crossterm::{cursor, execute, queue, style, terminal};
use crossterm::style::Color;
use crossterm::terminal::{ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::event::{Event, KeyEvent, read, poll};

/// Buffer marker for the second column of a double-width glyph.
const WIDE_TAIL: char = '\0';
const BLANK: (char, Color) = (' ', Color::Reset);

pub struct TermManager {
    width: TermInt,
    height: TermInt,
    stdout: Stdout,
    screen: Vec<(char, Color)>,
    current_msg: Option<Message>,
}

struct Message {
    top_left: Coords,
    width: TermInt,
    height: TermInt,
}

impl TermManager {
    pub fn new() -> crossterm::Result<Self> {
        let (width, height) = terminal::size()?;
        let stdout = stdout();
        let screen = vec![BLANK; width as usize * height as usize];
        Ok(TermManager { width, height, stdout, screen, current_msg: None })
    }

    pub fn setup(&mut self) -> crossterm::Result<()> {
        execute!(self.stdout, EnterAlternateScreen)?;
        terminal::enable_raw_mode()?;
        execute!(self.stdout, cursor::Hide, cursor::DisableBlinking)
    }

    pub fn restore(&mut self) -> crossterm::Result<()> {
        terminal::disable_raw_mode()?;
        execute!(self.stdout, cursor::Show, cursor::EnableBlinking, LeaveAlternateScreen)
    }

    pub fn read_key_blocking(&self) -> crossterm::Result<KeyEvent> {
        loop {
            if let Event::Key(ev) = read()? {
                return Ok(ev);
            }
        }
    }

    pub fn read_key_events_queue(&self) -> crossterm::Result<Vec<KeyEvent>> {
        let mut events = vec![];

        while poll(Duration::from_millis(1))? {
            if let Event::Key(ev) = read()? {
                events.push(ev);
            }
        }

        Ok(events)
    }

    pub fn get_terminal_size(&self) -> Coords {
        (self.width, self.height)
    }

    /// Draws a box whose outer corners are `top_left` and `top_left + size - 1`.
    pub fn draw_borders(&mut self, top_left: Coords, size: Coords) -> crossterm::Result<()> {
        let (x0, y0) = top_left;
        let (width, height) = size;
        let end_x = x0 + width - 1;
        let end_y = y0 + height - 1;

        for x in x0..=end_x {
            let ch = if x == x0 || x == end_x {'+'} else {'-'};
            self.print_at((x, y0), ch, Color::Reset)?;
            self.print_at((x, end_y), ch, Color::Reset)?;
        }

        for y in y0 + 1..end_y {
            self.print_at((x0, y), '|', Color::Reset)?;
            self.print_at((end_x, y), '|', Color::Reset)?;
        }

        self.flush()
    }

    pub fn show_message(&mut self, lines: &[&str]) -> crossterm::Result<()> {
        if self.has_message() {
            self.hide_message()?;
        }

        let msg_height = (lines.len() + 2) as TermInt;
        let msg_width = (lines.iter().map(|x| x.chars().count()).max().unwrap_or(0) + 2) as TermInt;
        let center = (self.width / 2, self.height / 2);
        let top_left = (center.0.saturating_sub(msg_width / 2), center.1.saturating_sub(msg_height / 2));

        // Print the top and bottom empty lines
        for y in [top_left.1, top_left.1 + msg_height - 1].iter() {
            for x_diff in 0..msg_width {
                self.print_at_no_save((top_left.0 + x_diff, *y), ' ')?;
            }
        }

        // Print the message lines
        for (i, line) in lines.iter().enumerate() {
            let padded_line = format!("{line: ^width$}", line = line, width = msg_width as usize);
            let y = top_left.1 + i as TermInt + 1;
            for (x_diff, ch) in padded_line.chars().enumerate() {
                self.print_at_no_save((top_left.0 + x_diff as TermInt, y), ch)?;
            }
        }

        self.current_msg = Some(Message::new(msg_width, msg_height, top_left));
        self.flush()
    }

    pub fn hide_message(&mut self) -> crossterm::Result<()> {
        let msg = match self.current_msg.take() {
            Some(msg) => msg,
            None => return Ok(()),
        };
        let top_left = msg.top_left();

        // Restore the content from the screen buffer
        for y_diff in 0..msg.height() {
            for x_diff in 0..msg.width() {
                let (x, y) = (top_left.0 + x_diff, top_left.1 + y_diff);
                if x >= self.width || y >= self.height {
                    continue;
                }

                let (ch, color) = self.screen[self.index((x, y))];
                if ch != WIDE_TAIL {
                    self.put((x, y), ch, color)?;
                } else if x_diff == 0 && x > 0 {
                    // The glyph this column belongs to starts left of the box
                    let (head, color) = self.screen[self.index((x - 1, y))];
                    self.put((x - 1, y), head, color)?;
                }
            }
        }

        self.flush()
    }

    /// Prints a single column character, skipping it if it is already shown.
    pub fn print_at(&mut self, pos: Coords, ch: char, color: Color) -> crossterm::Result<()> {
        if !self.in_bounds(pos) {
            return Ok(());
        }

        let i = self.index(pos);
        if self.screen[i] == (ch, color) {
            return Ok(());
        }

        self.put(pos, ch, color)?;
        self.screen[i] = (ch, color);
        Ok(())
    }

    /// Prints a glyph spanning two columns: either two characters or a single
    /// double-width one such as an emoji.
    pub fn print_glyph(&mut self, pos: Coords, glyph: &str, color: Color) -> crossterm::Result<()> {
        let mut chars = glyph.chars();
        let first = chars.next().unwrap_or(' ');

        match chars.next() {
            Some(second) => {
                self.print_at(pos, first, color)?;
                self.print_at((pos.0 + 1, pos.1), second, color)
            }
            None => {
                let tail = (pos.0 + 1, pos.1);
                if !self.in_bounds(tail) {
                    return Ok(());
                }

                let (i, j) = (self.index(pos), self.index(tail));
                if self.screen[i] == (first, color) && self.screen[j].0 == WIDE_TAIL {
                    return Ok(());
                }

                self.put(pos, first, color)?;
                self.screen[i] = (first, color);
                self.screen[j] = (WIDE_TAIL, color);
                Ok(())
            }
        }
    }

    pub fn print_text(&mut self, pos: Coords, text: &str, color: Color) -> crossterm::Result<()> {
        for (x_diff, ch) in text.chars().enumerate() {
            self.print_at((pos.0 + x_diff as TermInt, pos.1), ch, color)?;
        }
        Ok(())
    }

    pub fn clear(&mut self) -> crossterm::Result<()> {
        execute!(self.stdout, terminal::Clear(ClearType::All))?;
        self.screen = vec![BLANK; self.width as usize * self.height as usize];
        Ok(())
    }

    pub fn flush(&mut self) -> crossterm::Result<()> {
        self.stdout.flush()?;
        Ok(())
    }

    pub fn has_message(&self) -> bool {
        self.current_msg.is_some()
    }

    /// The screen content as text, one line per row, message boxes excluded.
    pub fn snapshot_text(&self) -> String {
        self.screen
            .chunks(self.width as usize)
            .map(|row| {
                let line: String = row.iter().map(|(ch, _)| *ch).filter(|ch| *ch != WIDE_TAIL).collect();
                line.trim_end().to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    ///////////////////////////////////////////////////////////////////////////

    fn put(&mut self, pos: Coords, ch: char, color: Color) -> crossterm::Result<()> {
        queue!(
            self.stdout,
            cursor::MoveTo(pos.0, pos.1),
            style::SetForegroundColor(color),
            style::Print(ch),
            style::ResetColor
        )
    }

    fn print_at_no_save(&mut self, pos: Coords, ch: char) -> crossterm::Result<()> {
        // To be used for printing messages, where we don't wanna overwrite our
        // local buffer to restore it when the message is hidden
        if !self.in_bounds(pos) {
            return Ok(());
        }
        queue!(self.stdout, cursor::MoveTo(pos.0, pos.1), style::Print(ch))
    }

    fn in_bounds(&self, pos: Coords) -> bool {
        pos.0 < self.width && pos.1 < self.height
    }

    fn index(&self, pos: Coords) -> usize {
        self.width as usize * pos.1 as usize + pos.0 as usize
    }
}

impl Message {
    pub fn new(width: TermInt, height: TermInt, top_left: Coords) -> Self {
        Message { width, height, top_left }
    }

    pub fn width(&self) -> TermInt {
        self.width
    }

    pub fn height(&self) -> TermInt {
        self.height
    }

    pub fn top_left(&self) -> Coords {
        self.top_left
    }
}
