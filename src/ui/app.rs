use anyhow::Result;
use chrono::{Local, NaiveDate};
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, Wrap,
};
use ratatui::Frame;
use tracing::warn;

use crate::config::LendingPolicy;
use crate::db::Database;
use crate::models::{Book, Member, OverdueLoan};
use crate::screens::{self, Menu, Notice, ScreenView, Submission};

use super::forms::{BookField, BookForm, MemberField, MemberForm};
use super::helpers::{centered_rect, notice_style, or_blank, surface_error};
use super::screens::{IssueList, IssueScreen, Picker, ReturnScreen};

/// Width of the menu column on the left.
const SIDEBAR_WIDTH: u16 = 24;
/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Rows taken by the member form above the member table.
const MEMBER_FORM_HEIGHT: u16 = 7;

/// Where keystrokes go: the sidebar or the body of the selected screen.
#[derive(Copy, Clone, PartialEq, Eq)]
enum Focus {
    Menu,
    Screen,
}

/// Per-screen UI state, rebuilt from a fresh [`ScreenView`] on every load.
enum Screen {
    Books(Vec<Book>),
    AddBook(BookForm),
    IssueBook(IssueScreen),
    ReturnBook(ReturnScreen),
    ManageMembers {
        form: MemberForm,
        members: Vec<Member>,
    },
    OverdueBooks(Vec<OverdueLoan>),
}

impl Screen {
    fn from_view(view: ScreenView) -> Self {
        match view {
            ScreenView::Books(books) => Screen::Books(books),
            ScreenView::AddBook => Screen::AddBook(BookForm::default()),
            ScreenView::IssueBook { books, members } => {
                Screen::IssueBook(IssueScreen::new(books, members))
            }
            ScreenView::ReturnBook(loans) => Screen::ReturnBook(Picker::new(loans)),
            ScreenView::ManageMembers(members) => Screen::ManageMembers {
                form: MemberForm::default(),
                members,
            },
            ScreenView::OverdueBooks(loans) => Screen::OverdueBooks(loans),
        }
    }

    /// The screen for `menu` with nothing loaded, shown when a load fails.
    fn blank(menu: Menu) -> Self {
        match menu {
            Menu::ViewBooks => Screen::Books(Vec::new()),
            Menu::AddBook => Screen::AddBook(BookForm::default()),
            Menu::IssueBook => Screen::IssueBook(IssueScreen::new(Vec::new(), Vec::new())),
            Menu::ReturnBook => Screen::ReturnBook(Picker::new(Vec::new())),
            Menu::ManageMembers => Screen::ManageMembers {
                form: MemberForm::default(),
                members: Vec::new(),
            },
            Menu::OverdueBooks => Screen::OverdueBooks(Vec::new()),
        }
    }

    /// Screens with something to type into or pick from.
    fn accepts_focus(&self) -> bool {
        match self {
            Screen::AddBook(_) | Screen::ManageMembers { .. } => true,
            Screen::IssueBook(issue) => issue.selection().is_some(),
            Screen::ReturnBook(picker) => !picker.is_empty(),
            Screen::Books(_) | Screen::OverdueBooks(_) => false,
        }
    }
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Notice(Notice),
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Notice(notice) => notice_style(notice),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    db: Database,
    policy: LendingPolicy,
    menu: Menu,
    focus: Focus,
    screen: Screen,
    /// Message explaining an empty screen, recomputed on each load.
    empty_notice: Option<Notice>,
    status: Option<StatusMessage>,
}

impl App {
    /// Build the app and load the first screen. A database that cannot be read
    /// at startup is an error; later load failures only reach the footer.
    pub fn new(db: Database, policy: LendingPolicy) -> Result<Self> {
        let mut app = Self {
            db,
            policy,
            menu: Menu::ViewBooks,
            focus: Focus::Menu,
            screen: Screen::Books(Vec::new()),
            empty_notice: None,
            status: None,
        };
        app.load_screen()?;
        Ok(app)
    }

    /// Process one key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        match self.focus {
            Focus::Menu => self.handle_menu_key(code),
            Focus::Screen => {
                if code == KeyCode::Esc {
                    self.focus = Focus::Menu;
                } else {
                    self.handle_screen_key(code);
                }
                false
            }
        }
    }

    fn handle_menu_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => self.select_menu(self.menu.index().saturating_sub(1)),
            KeyCode::Down => self.select_menu(self.menu.index() + 1),
            KeyCode::Home => self.select_menu(0),
            KeyCode::End => self.select_menu(Menu::ALL.len() - 1),
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.clear_status();
                self.reload();
            }
            KeyCode::Enter | KeyCode::Tab | KeyCode::Right => {
                if self.screen.accepts_focus() {
                    self.focus = Focus::Screen;
                }
            }
            _ => {}
        }
        false
    }

    fn handle_screen_key(&mut self, code: KeyCode) {
        let mut submission = None;

        match &mut self.screen {
            Screen::AddBook(form) => match code {
                KeyCode::Tab | KeyCode::Down => form.cycle_field(1),
                KeyCode::BackTab | KeyCode::Up => form.cycle_field(-1),
                KeyCode::Backspace => form.backspace(),
                KeyCode::Enter => match form.parse_inputs() {
                    Ok(book) => submission = Some(Submission::AddBook(book)),
                    Err(err) => form.error = Some(surface_error(&err)),
                },
                KeyCode::Char(ch) => {
                    if form.push_char(ch) {
                        form.error = None;
                    }
                }
                _ => {}
            },
            Screen::ManageMembers { form, .. } => match code {
                KeyCode::Tab | KeyCode::Down => form.cycle_field(1),
                KeyCode::BackTab | KeyCode::Up => form.cycle_field(-1),
                KeyCode::Backspace => form.backspace(),
                KeyCode::Enter => match form.parse_inputs() {
                    Ok(member) => submission = Some(Submission::AddMember(member)),
                    Err(err) => form.error = Some(surface_error(&err)),
                },
                KeyCode::Char(ch) => {
                    if form.push_char(ch) {
                        form.error = None;
                    }
                }
                _ => {}
            },
            Screen::IssueBook(issue) => match code {
                KeyCode::Tab | KeyCode::BackTab | KeyCode::Left | KeyCode::Right => {
                    issue.toggle_list()
                }
                KeyCode::Up => issue.move_selection(-1),
                KeyCode::Down => issue.move_selection(1),
                KeyCode::PageUp => issue.move_selection(-5),
                KeyCode::PageDown => issue.move_selection(5),
                KeyCode::Home => issue.select_first(),
                KeyCode::End => issue.select_last(),
                KeyCode::Enter => {
                    if let Some((book_id, member_id)) = issue.selection() {
                        submission = Some(Submission::IssueBook { book_id, member_id });
                    }
                }
                _ => {}
            },
            Screen::ReturnBook(picker) => match code {
                KeyCode::Up => picker.move_selection(-1),
                KeyCode::Down => picker.move_selection(1),
                KeyCode::PageUp => picker.move_selection(-5),
                KeyCode::PageDown => picker.move_selection(5),
                KeyCode::Home => picker.select_first(),
                KeyCode::End => picker.select_last(),
                KeyCode::Enter => {
                    if let Some(loan) = picker.current() {
                        submission = Some(Submission::ReturnBook {
                            transaction_id: loan.transaction_id,
                        });
                    }
                }
                _ => {}
            },
            Screen::Books(_) | Screen::OverdueBooks(_) => {}
        }

        if let Some(submission) = submission {
            self.apply(submission);
        }
    }

    /// Write one submission, then rerun the screen so it shows the new state.
    /// Failures stay on screen.
    fn apply(&mut self, submission: Submission) {
        match screens::submit(&self.db, &submission, today(), &self.policy) {
            Ok(notice) => {
                self.status = Some(StatusMessage {
                    text: notice.text().to_string(),
                    kind: StatusKind::Notice(notice),
                });
                self.reload();
            }
            Err(err) => {
                let message = surface_error(&err);
                match &mut self.screen {
                    Screen::AddBook(form) => form.error = Some(message.clone()),
                    Screen::ManageMembers { form, .. } => form.error = Some(message.clone()),
                    _ => {}
                }
                self.set_error(message);
            }
        }
    }

    fn select_menu(&mut self, index: usize) {
        let index = index.min(Menu::ALL.len() - 1);
        if Menu::ALL[index] != self.menu {
            self.menu = Menu::ALL[index];
            self.clear_status();
            self.reload();
        }
    }

    /// Read the current screen from the database again. A failed read leaves
    /// the screen blank with the cause in the footer.
    fn reload(&mut self) {
        if let Err(err) = self.load_screen() {
            warn!(screen = self.menu.label(), "screen load failed: {err:#}");
            self.screen = Screen::blank(self.menu);
            self.empty_notice = None;
            self.set_error(surface_error(&err));
        }
        if !self.screen.accepts_focus() {
            self.focus = Focus::Menu;
        }
    }

    fn load_screen(&mut self) -> Result<()> {
        let view = screens::load(&self.db, self.menu, today(), &self.policy)?;
        self.empty_notice = view.empty_notice();
        self.screen = Screen::from_view(view);
        Ok(())
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(area);

        self.draw_menu(frame, columns[0]);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT.min(columns[1].height)),
            ])
            .split(columns[1]);

        self.draw_screen(frame, rows[0]);
        self.draw_footer(frame, rows[1]);
    }

    fn draw_menu(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = Menu::ALL
            .iter()
            .map(|menu| ListItem::new(menu.label()))
            .collect();

        let border_style = if self.focus == Focus::Menu {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };

        let list = List::new(items)
            .block(
                Block::default()
                    .title("Menu")
                    .borders(Borders::ALL)
                    .border_style(border_style),
            )
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");

        let mut state = ListState::default();
        state.select(Some(self.menu.index()));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_screen(&self, frame: &mut Frame, area: Rect) {
        let border_style = if self.focus == Focus::Screen {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        let block = Block::default()
            .title(self.menu.heading())
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(border_style);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        match &self.screen {
            Screen::Books(books) => self.draw_books(frame, inner, books),
            Screen::AddBook(form) => self.draw_book_form(frame, inner, form),
            Screen::IssueBook(issue) => self.draw_issue(frame, inner, issue),
            Screen::ReturnBook(picker) => self.draw_return(frame, inner, picker),
            Screen::ManageMembers { form, members } => {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(MEMBER_FORM_HEIGHT), Constraint::Min(0)])
                    .split(inner);
                self.draw_member_form(frame, chunks[0], form);
                self.draw_members(frame, chunks[1], members);
            }
            Screen::OverdueBooks(loans) => self.draw_overdue(frame, inner, loans),
        }
    }

    /// Paint the empty-screen notice in the middle of `area`. Returns `false`
    /// when there is none so the caller draws its table instead.
    fn draw_empty_notice(&self, frame: &mut Frame, area: Rect) -> bool {
        let Some(notice) = &self.empty_notice else {
            return false;
        };
        let message = Paragraph::new(Span::styled(notice.text().to_string(), notice_style(notice)))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(message, centered_rect(80, 30, area));
        true
    }

    fn draw_books(&self, frame: &mut Frame, area: Rect, books: &[Book]) {
        if self.draw_empty_notice(frame, area) {
            return;
        }
        let header = header_row([
            "BookID",
            "Title",
            "Author",
            "Genre",
            "PublishedYear",
            "AvailableCopies",
        ]);
        let rows = books.iter().map(|book| {
            Row::new(vec![
                Cell::from(book.id.to_string()),
                Cell::from(book.title.clone()),
                Cell::from(book.author.clone()),
                Cell::from(or_blank(&book.genre)),
                Cell::from(or_blank(&book.published_year)),
                Cell::from(book.available_copies.to_string()),
            ])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Length(7),
                Constraint::Percentage(30),
                Constraint::Percentage(22),
                Constraint::Percentage(15),
                Constraint::Length(14),
                Constraint::Length(16),
            ],
        )
        .header(header)
        .column_spacing(1);
        frame.render_widget(table, area);
    }

    fn draw_book_form(&self, frame: &mut Frame, area: Rect, form: &BookForm) {
        let mut lines: Vec<Line> = BookField::ALL
            .iter()
            .map(|field| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));
        lines.push(form_hint(form.error.as_deref(), "Add Book"));
        frame.render_widget(Paragraph::new(lines), area);

        if self.focus == Focus::Screen {
            let (x, y) = form.cursor();
            frame.set_cursor_position((area.x + x, area.y + y));
        }
    }

    fn draw_issue(&self, frame: &mut Frame, area: Rect, issue: &IssueScreen) {
        if self.draw_empty_notice(frame, area) {
            return;
        }
        let halves = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        let books: Vec<ListItem> = issue
            .books
            .items
            .iter()
            .map(|book| ListItem::new(book.title.clone()))
            .collect();
        self.draw_picker(
            frame,
            halves[0],
            "Select Book",
            books,
            issue.books.selected,
            issue.active == IssueList::Books,
        );

        let members: Vec<ListItem> = issue
            .members
            .items
            .iter()
            .map(|member| ListItem::new(member.name.clone()))
            .collect();
        self.draw_picker(
            frame,
            halves[1],
            "Select Member",
            members,
            issue.members.selected,
            issue.active == IssueList::Members,
        );
    }

    fn draw_return(&self, frame: &mut Frame, area: Rect, picker: &ReturnScreen) {
        if self.draw_empty_notice(frame, area) {
            return;
        }
        let items: Vec<ListItem> = picker
            .items
            .iter()
            .map(|loan| ListItem::new(loan.label()))
            .collect();
        self.draw_picker(
            frame,
            area,
            "Select Issued Book to Return",
            items,
            picker.selected,
            true,
        );
    }

    fn draw_picker(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        items: Vec<ListItem>,
        selected: usize,
        active: bool,
    ) {
        let highlight = if active && self.focus == Focus::Screen {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::Gray)
        };
        let list = List::new(items)
            .block(Block::default().title(title.to_string()).borders(Borders::ALL))
            .highlight_style(highlight)
            .highlight_symbol("▶ ");

        let mut state = ListState::default();
        state.select(Some(selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_member_form(&self, frame: &mut Frame, area: Rect, form: &MemberForm) {
        let mut lines: Vec<Line> = MemberField::ALL
            .iter()
            .map(|field| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));
        lines.push(form_hint(form.error.as_deref(), "Add Member"));
        frame.render_widget(Paragraph::new(lines), area);

        if self.focus == Focus::Screen {
            let (x, y) = form.cursor();
            frame.set_cursor_position((area.x + x, area.y + y));
        }
    }

    fn draw_members(&self, frame: &mut Frame, area: Rect, members: &[Member]) {
        let block = Block::default().title("View Members").borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        if self.draw_empty_notice(frame, inner) {
            return;
        }
        let header = header_row(["MemberID", "Name", "Email", "Phone", "JoinDate"]);
        let rows = members.iter().map(|member| {
            Row::new(vec![
                Cell::from(member.id.to_string()),
                Cell::from(member.name.clone()),
                Cell::from(member.email.clone()),
                Cell::from(or_blank(&member.phone)),
                Cell::from(member.join_date.clone()),
            ])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Length(9),
                Constraint::Percentage(25),
                Constraint::Percentage(30),
                Constraint::Length(14),
                Constraint::Length(20),
            ],
        )
        .header(header)
        .column_spacing(1);
        frame.render_widget(table, inner);
    }

    fn draw_overdue(&self, frame: &mut Frame, area: Rect, loans: &[OverdueLoan]) {
        if self.draw_empty_notice(frame, area) {
            return;
        }
        let header = header_row(["Member Name", "Book Title", "Due Date", "Fine (₹)"]);
        let rows = loans.iter().map(|loan| {
            Row::new(vec![
                Cell::from(loan.member_name.clone()),
                Cell::from(loan.book_title.clone()),
                Cell::from(loan.due_date.clone()),
                Cell::from(loan.fine.to_string()),
            ])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Percentage(30),
                Constraint::Percentage(40),
                Constraint::Length(12),
                Constraint::Length(10),
            ],
        )
        .header(header)
        .column_spacing(1);
        frame.render_widget(table, area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let keys: &[(&str, &str)] = match (self.focus, &self.screen) {
            (Focus::Menu, screen) if screen.accepts_focus() => &[
                ("[↑↓]", " Menu   "),
                ("[Enter]", " Open   "),
                ("[r]", " Refresh   "),
                ("[q]", " Quit"),
            ],
            (Focus::Menu, _) => &[("[↑↓]", " Menu   "), ("[r]", " Refresh   "), ("[q]", " Quit")],
            (Focus::Screen, Screen::AddBook(_) | Screen::ManageMembers { .. }) => &[
                ("[Tab]", " Next field   "),
                ("[Enter]", " Save   "),
                ("[Esc]", " Menu"),
            ],
            (Focus::Screen, Screen::IssueBook(_)) => &[
                ("[↑↓]", " Choose   "),
                ("[Tab]", " Book/Member   "),
                ("[Enter]", " Issue   "),
                ("[Esc]", " Menu"),
            ],
            (Focus::Screen, Screen::ReturnBook(_)) => &[
                ("[↑↓]", " Choose   "),
                ("[Enter]", " Return   "),
                ("[Esc]", " Menu"),
            ],
            (Focus::Screen, _) => &[("[Esc]", " Menu")],
        };

        let spans: Vec<Span<'static>> = keys
            .iter()
            .flat_map(|(key, label)| {
                [
                    Span::styled(key.to_string(), key_style),
                    Span::raw(label.to_string()),
                ]
            })
            .collect();
        Line::from(spans)
    }

    fn set_error<S: Into<String>>(&mut self, text: S) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind: StatusKind::Error,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn header_row<const N: usize>(titles: [&'static str; N]) -> Row<'static> {
    Row::new(titles.map(Cell::from)).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )
}

/// Last line of a form: the validation error if there is one, otherwise the
/// key hint.
fn form_hint(error: Option<&str>, action: &str) -> Line<'static> {
    match error {
        Some(error) => Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(Span::styled(
            format!("Enter to {action} • Tab to switch fields • Esc for menu"),
            Style::default().fg(Color::Gray),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> (tempfile::TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("library.db")).unwrap();
        db.bootstrap().unwrap();
        let app = App::new(db, LendingPolicy::default()).unwrap();
        (dir, app)
    }

    fn press(app: &mut App, keys: &[KeyCode]) {
        for key in keys {
            assert!(!app.handle_key(*key));
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch));
        }
    }

    fn status_text(app: &App) -> Option<&str> {
        app.status.as_ref().map(|status| status.text.as_str())
    }

    #[test]
    fn starts_on_view_books_with_seed_rows() {
        let (_dir, app) = app();
        assert_eq!(app.menu, Menu::ViewBooks);
        assert!(matches!(&app.screen, Screen::Books(books) if books.len() == 3));
        assert!(app.empty_notice.is_none());
    }

    #[test]
    fn q_quits_from_the_menu() {
        let (_dir, mut app) = app();
        assert!(app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn view_only_screens_keep_focus_on_menu() {
        let (_dir, mut app) = app();
        press(&mut app, &[KeyCode::Enter]);
        assert!(app.focus == Focus::Menu);
    }

    #[test]
    fn adding_a_book_through_the_form() {
        let (_dir, mut app) = app();
        press(&mut app, &[KeyCode::Down, KeyCode::Enter]);
        assert_eq!(app.menu, Menu::AddBook);

        type_text(&mut app, "Dune");
        press(&mut app, &[KeyCode::Tab]);
        type_text(&mut app, "Frank Herbert");
        press(&mut app, &[KeyCode::Tab, KeyCode::Tab]);
        type_text(&mut app, "1965");
        press(&mut app, &[KeyCode::Enter]);

        assert_eq!(status_text(&app), Some("Book 'Dune' added successfully!"));
        assert_eq!(app.db.count_rows("Books").unwrap(), 4);
        assert!(matches!(&app.screen, Screen::AddBook(form) if form.title.is_empty()));
    }

    #[test]
    fn issuing_then_returning_restores_copies() {
        let (_dir, mut app) = app();
        press(&mut app, &[KeyCode::Down, KeyCode::Down, KeyCode::Enter]);
        assert_eq!(app.menu, Menu::IssueBook);

        // Second seeded book is 1984; first member is Alice.
        press(&mut app, &[KeyCode::Down, KeyCode::Enter]);
        let status = status_text(&app).unwrap().to_string();
        assert!(status.starts_with("Book '1984' issued to Alice Johnson."));

        press(&mut app, &[KeyCode::Esc, KeyCode::Down, KeyCode::Enter, KeyCode::Enter]);
        assert_eq!(app.menu, Menu::ReturnBook);
        assert_eq!(status_text(&app), Some("Book returned successfully!"));
        assert!(app.focus == Focus::Menu);
        assert_eq!(
            app.empty_notice,
            Some(Notice::Info("No books to return.".into()))
        );
    }

    #[test]
    fn duplicate_member_email_stays_on_form() {
        let (_dir, mut app) = app();
        press(&mut app, &[KeyCode::End]);
        press(&mut app, &[KeyCode::Up, KeyCode::Enter]);
        assert_eq!(app.menu, Menu::ManageMembers);

        type_text(&mut app, "Alice Again");
        press(&mut app, &[KeyCode::Tab]);
        type_text(&mut app, "alice@example.com");
        press(&mut app, &[KeyCode::Enter]);

        assert_eq!(
            status_text(&app),
            Some("A member with email alice@example.com already exists.")
        );
        assert!(matches!(
            &app.screen,
            Screen::ManageMembers { form, members } if form.error.is_some() && members.len() == 2
        ));
    }

    #[test]
    fn failed_screen_load_reports_in_footer_and_keeps_running() {
        let (_dir, mut app) = app();
        app.db
            .execute_query("DROP TABLE Transactions", [], crate::db::Fetch::None)
            .unwrap();

        press(&mut app, &[KeyCode::Down, KeyCode::Down, KeyCode::Down]);
        assert_eq!(app.menu, Menu::ReturnBook);
        let status = app.status.as_ref().unwrap();
        assert!(matches!(status.kind, StatusKind::Error));
        assert!(status.text.contains("no such table: Transactions"));
        assert!(matches!(&app.screen, Screen::ReturnBook(picker) if picker.is_empty()));
        assert!(app.focus == Focus::Menu);

        press(&mut app, &[KeyCode::Up]);
        assert_eq!(app.menu, Menu::IssueBook);
        assert!(app.status.is_none());
        assert!(matches!(&app.screen, Screen::IssueBook(issue) if issue.selection().is_some()));
    }

    #[test]
    fn esc_returns_focus_to_menu() {
        let (_dir, mut app) = app();
        press(&mut app, &[KeyCode::Down, KeyCode::Enter]);
        assert!(app.focus == Focus::Screen);
        press(&mut app, &[KeyCode::Esc]);
        assert!(app.focus == Focus::Menu);
        assert!(app.handle_key(KeyCode::Esc));
    }
}
