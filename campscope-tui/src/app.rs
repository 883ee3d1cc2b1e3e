//! Application state for the TUI.

use campscope_core::analysis::{run_analysis, AnalysisEvent, AnalysisPhase, AnalysisRequest};
use campscope_core::registry;
use campscope_core::render::SessionRow;
use campscope_core::Config;
use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// Input fields, in focus-cycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Username,
    Password,
    CampaignId,
    FromDate,
    ToDate,
    ApiKey,
    Tables,
}

impl Focus {
    const ORDER: [Focus; 7] = [
        Focus::Username,
        Focus::Password,
        Focus::CampaignId,
        Focus::FromDate,
        Focus::ToDate,
        Focus::ApiKey,
        Focus::Tables,
    ];

    fn next(self) -> Focus {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(i + 1) % Self::ORDER.len()]
    }

    fn prev(self) -> Focus {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(i + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

/// Results panel tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsTab {
    Sessions,
    Stats,
    ModelInput,
}

impl ResultsTab {
    pub fn title(&self) -> &'static str {
        match self {
            ResultsTab::Sessions => "Change History",
            ResultsTab::Stats => "Statistics",
            ResultsTab::ModelInput => "Raw Data for AI",
        }
    }

    fn next(self) -> ResultsTab {
        match self {
            ResultsTab::Sessions => ResultsTab::Stats,
            ResultsTab::Stats => ResultsTab::ModelInput,
            ResultsTab::ModelInput => ResultsTab::Sessions,
        }
    }
}

/// Main application state.
pub struct App {
    /// Loaded configuration, shared with every analysis request
    config: Config,
    /// Handle onto the async runtime driving analyses
    runtime: Handle,

    // Input form
    pub focus: Focus,
    pub username: String,
    pub password: String,
    pub campaign_id: String,
    pub from_date: String,
    pub to_date: String,
    pub api_key: String,
    /// Table selection: (name, selected), registry order
    pub tables: Vec<(String, bool)>,
    pub table_cursor: usize,

    // Analysis output
    pub phase: AnalysisPhase,
    pub status_line: String,
    pub connection_line: String,
    pub session_rows: Vec<SessionRow>,
    pub stats_text: String,
    pub model_input: String,
    pub ai_text: String,

    // Panel state
    pub results_tab: ResultsTab,
    pub results_scroll: u16,
    pub ai_scroll: u16,

    /// Event stream of the in-flight analysis, if any
    events: Option<UnboundedReceiver<AnalysisEvent>>,
    /// Whether the app should exit
    pub should_quit: bool,
}

impl App {
    /// Create a new App for the given configuration.
    pub fn new(config: Config, runtime: Handle) -> Self {
        let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
        let tables = registry::available_tables()
            .into_iter()
            .map(|(name, _)| (name.to_string(), true))
            .collect();

        Self {
            config,
            runtime,
            focus: Focus::Username,
            username: String::new(),
            password: String::new(),
            campaign_id: String::new(),
            from_date: today.clone(),
            to_date: today,
            api_key: String::new(),
            tables,
            table_cursor: 0,
            phase: AnalysisPhase::Idle,
            status_line: "Ready. Fill in the form and press Enter to analyze.".to_string(),
            connection_line: String::new(),
            session_rows: Vec::new(),
            stats_text: String::new(),
            model_input: String::new(),
            ai_text: String::new(),
            results_tab: ResultsTab::Sessions,
            results_scroll: 0,
            ai_scroll: 0,
            events: None,
            should_quit: false,
        }
    }

    /// Whether an analysis is currently running.
    pub fn is_running(&self) -> bool {
        self.events.is_some() && !self.phase.is_terminal() && self.phase != AnalysisPhase::Idle
    }

    /// Handle a key event.
    pub fn handle_key(&mut self, key: KeyEvent) {
        // Global bindings first
        if key.code == KeyCode::Esc {
            self.should_quit = true;
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => self.should_quit = true,
                KeyCode::Char('t') => {
                    self.results_tab = self.results_tab.next();
                    self.results_scroll = 0;
                }
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.prev(),
            KeyCode::Enter => self.start_analysis(),
            KeyCode::PageDown => self.ai_scroll = self.ai_scroll.saturating_add(5),
            KeyCode::PageUp => self.ai_scroll = self.ai_scroll.saturating_sub(5),
            KeyCode::Down if self.focus == Focus::Tables => {
                if self.table_cursor + 1 < self.tables.len() {
                    self.table_cursor += 1;
                }
            }
            KeyCode::Up if self.focus == Focus::Tables => {
                self.table_cursor = self.table_cursor.saturating_sub(1);
            }
            KeyCode::Down => self.results_scroll = self.results_scroll.saturating_add(1),
            KeyCode::Up => self.results_scroll = self.results_scroll.saturating_sub(1),
            KeyCode::Char(' ') if self.focus == Focus::Tables => {
                if let Some(entry) = self.tables.get_mut(self.table_cursor) {
                    entry.1 = !entry.1;
                }
            }
            KeyCode::Char(c) => self.push_char(c),
            KeyCode::Backspace => self.pop_char(),
            _ => {}
        }
    }

    fn push_char(&mut self, c: char) {
        if let Some(field) = self.focused_field() {
            field.push(c);
        }
    }

    fn pop_char(&mut self) {
        if let Some(field) = self.focused_field() {
            field.pop();
        }
    }

    fn focused_field(&mut self) -> Option<&mut String> {
        match self.focus {
            Focus::Username => Some(&mut self.username),
            Focus::Password => Some(&mut self.password),
            Focus::CampaignId => Some(&mut self.campaign_id),
            Focus::FromDate => Some(&mut self.from_date),
            Focus::ToDate => Some(&mut self.to_date),
            Focus::ApiKey => Some(&mut self.api_key),
            Focus::Tables => None,
        }
    }

    /// Kick off an analysis with the current form values.
    pub fn start_analysis(&mut self) {
        if self.is_running() {
            return;
        }

        let selected_tables: Vec<String> = self
            .tables
            .iter()
            .filter(|(_, on)| *on)
            .map(|(name, _)| name.clone())
            .collect();

        let request = AnalysisRequest {
            username: self.username.clone(),
            password: self.password.clone(),
            campaign_id: self.campaign_id.clone(),
            from_date: self.from_date.clone(),
            to_date: self.to_date.clone(),
            selected_tables,
            api_key: self.api_key.clone(),
        };

        // Fresh output for the new request
        self.session_rows.clear();
        self.stats_text.clear();
        self.model_input.clear();
        self.ai_text = "Generating analysis...".to_string();
        self.connection_line.clear();
        self.results_scroll = 0;
        self.ai_scroll = 0;
        self.phase = AnalysisPhase::Validating;
        self.status_line = "Starting analysis...".to_string();

        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(rx);
        self.runtime
            .spawn(run_analysis(self.config.clone(), request, tx));
    }

    /// Drain pending analysis events into the display state.
    pub fn drain_events(&mut self) {
        let Some(rx) = self.events.as_mut() else {
            return;
        };

        let mut finished = false;
        while let Ok(event) = rx.try_recv() {
            match event {
                AnalysisEvent::Phase(phase) => {
                    self.phase = phase;
                    self.status_line = phase.as_str().to_string();
                    if phase.is_terminal() {
                        finished = true;
                    }
                }
                AnalysisEvent::ConnectionStatus(line) => self.connection_line = line,
                AnalysisEvent::SessionRows(rows) => self.session_rows = rows,
                AnalysisEvent::StatsText(text) => self.stats_text = text,
                AnalysisEvent::ModelInput(text) => self.model_input = text,
                AnalysisEvent::ModelPartial(text) => self.ai_text = text,
                AnalysisEvent::ModelFinal(text) => self.ai_text = text,
                AnalysisEvent::NoChanges(message) => {
                    self.ai_text = message.clone();
                    self.status_line = message;
                }
                AnalysisEvent::Failed(message) => {
                    self.ai_text.clear();
                    self.status_line = format!("Error: {message}");
                }
            }
        }

        if finished {
            self.events = None;
        }
    }
}
