use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{NewBook, NewMember};

/// Render one `Label: value` line, highlighting the focused field and showing a
/// dim placeholder for empty ones.
fn field_line(label: &str, value: &str, placeholder: &str, is_active: bool) -> Line<'static> {
    let display = if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    };

    let style = if is_active {
        Style::default().fg(Color::Yellow)
    } else if value.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::raw(format!("{label}: ")),
        Span::styled(display, style),
    ])
}

/// Fields of the "Add Book" form, in tab order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum BookField {
    #[default]
    Title,
    Author,
    Genre,
    Year,
    Copies,
}

impl BookField {
    pub(crate) const ALL: [BookField; 5] = [
        BookField::Title,
        BookField::Author,
        BookField::Genre,
        BookField::Year,
        BookField::Copies,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            BookField::Title => "Book Title",
            BookField::Author => "Author",
            BookField::Genre => "Genre",
            BookField::Year => "Published Year",
            BookField::Copies => "Available Copies",
        }
    }

    fn is_numeric(self) -> bool {
        matches!(self, BookField::Year | BookField::Copies)
    }
}

/// Input state for a new book.
#[derive(Clone, Debug)]
pub(crate) struct BookForm {
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) genre: String,
    pub(crate) year: String,
    pub(crate) copies: String,
    pub(crate) active: BookField,
    pub(crate) error: Option<String>,
}

impl Default for BookForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            author: String::new(),
            genre: String::new(),
            year: String::new(),
            copies: "1".to_string(),
            active: BookField::Title,
            error: None,
        }
    }
}

impl BookForm {
    fn value(&self, field: BookField) -> &String {
        match field {
            BookField::Title => &self.title,
            BookField::Author => &self.author,
            BookField::Genre => &self.genre,
            BookField::Year => &self.year,
            BookField::Copies => &self.copies,
        }
    }

    fn value_mut(&mut self, field: BookField) -> &mut String {
        match field {
            BookField::Title => &mut self.title,
            BookField::Author => &mut self.author,
            BookField::Genre => &mut self.genre,
            BookField::Year => &mut self.year,
            BookField::Copies => &mut self.copies,
        }
    }

    /// Move focus forward (`step = 1`) or backward (`step = -1`), wrapping.
    pub(crate) fn cycle_field(&mut self, step: isize) {
        let len = BookField::ALL.len() as isize;
        let current = BookField::ALL
            .iter()
            .position(|field| *field == self.active)
            .unwrap_or(0) as isize;
        self.active = BookField::ALL[(current + step).rem_euclid(len) as usize];
    }

    /// Append a character to the focused field. Year and copies take digits
    /// only. Returns whether the input was accepted.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        let field = self.active;
        let accepted = if field.is_numeric() {
            ch.is_ascii_digit()
        } else {
            !ch.is_control()
        };
        if accepted {
            self.value_mut(field).push(ch);
        }
        accepted
    }

    pub(crate) fn backspace(&mut self) {
        let field = self.active;
        self.value_mut(field).pop();
    }

    /// Turn the raw inputs into a `NewBook`. Text fields are stored as typed;
    /// the numeric fields must parse. Range checks happen in the controller.
    pub(crate) fn parse_inputs(&self) -> Result<NewBook> {
        let year_raw = self.year.trim();
        if year_raw.is_empty() {
            return Err(anyhow!("Published year is required."));
        }
        let published_year = year_raw
            .parse::<i64>()
            .map_err(|_| anyhow!("Published year must be a number."))?;

        let copies_raw = self.copies.trim();
        if copies_raw.is_empty() {
            return Err(anyhow!("Available copies is required."));
        }
        let copies = copies_raw
            .parse::<i64>()
            .map_err(|_| anyhow!("Available copies must be a number."))?;

        Ok(NewBook {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            genre: self.genre.trim().to_string(),
            published_year,
            copies,
        })
    }

    pub(crate) fn build_line(&self, field: BookField) -> Line<'static> {
        let placeholder = match field {
            BookField::Year => "<1000-9999>",
            BookField::Copies => "<at least 1>",
            _ => "",
        };
        field_line(
            field.label(),
            self.value(field),
            placeholder,
            self.active == field,
        )
    }

    /// Cursor position within the form: (column, row).
    pub(crate) fn cursor(&self) -> (u16, u16) {
        let row = BookField::ALL
            .iter()
            .position(|field| *field == self.active)
            .unwrap_or(0);
        let column = self.active.label().len() + 2 + self.value(self.active).chars().count();
        (column as u16, row as u16)
    }
}

/// Fields of the member form, in tab order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum MemberField {
    #[default]
    Name,
    Email,
    Phone,
}

impl MemberField {
    pub(crate) const ALL: [MemberField; 3] =
        [MemberField::Name, MemberField::Email, MemberField::Phone];

    pub(crate) fn label(self) -> &'static str {
        match self {
            MemberField::Name => "Member Name",
            MemberField::Email => "Email",
            MemberField::Phone => "Phone Number",
        }
    }
}

/// Input state for a new member.
#[derive(Default, Clone, Debug)]
pub(crate) struct MemberForm {
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) phone: String,
    pub(crate) active: MemberField,
    pub(crate) error: Option<String>,
}

impl MemberForm {
    fn value(&self, field: MemberField) -> &String {
        match field {
            MemberField::Name => &self.name,
            MemberField::Email => &self.email,
            MemberField::Phone => &self.phone,
        }
    }

    pub(crate) fn cycle_field(&mut self, step: isize) {
        let len = MemberField::ALL.len() as isize;
        let current = MemberField::ALL
            .iter()
            .position(|field| *field == self.active)
            .unwrap_or(0) as isize;
        self.active = MemberField::ALL[(current + step).rem_euclid(len) as usize];
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            MemberField::Name => self.name.push(ch),
            MemberField::Email => self.email.push(ch),
            MemberField::Phone => self.phone.push(ch),
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            MemberField::Name => {
                self.name.pop();
            }
            MemberField::Email => {
                self.email.pop();
            }
            MemberField::Phone => {
                self.phone.pop();
            }
        }
    }

    /// Email is the one column the schema requires to be unique and present.
    pub(crate) fn parse_inputs(&self) -> Result<NewMember> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err(anyhow!("Email is required."));
        }
        Ok(NewMember {
            name: self.name.trim().to_string(),
            email: email.to_string(),
            phone: self.phone.trim().to_string(),
        })
    }

    pub(crate) fn build_line(&self, field: MemberField) -> Line<'static> {
        let placeholder = match field {
            MemberField::Email => "<required>",
            _ => "",
        };
        field_line(
            field.label(),
            self.value(field),
            placeholder,
            self.active == field,
        )
    }

    pub(crate) fn cursor(&self) -> (u16, u16) {
        let row = MemberField::ALL
            .iter()
            .position(|field| *field == self.active)
            .unwrap_or(0);
        let column = self.active.label().len() + 2 + self.value(self.active).chars().count();
        (column as u16, row as u16)
    }
}
