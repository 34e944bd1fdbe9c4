/// Model picker drawn over the canvas
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use rotator_core::{ModelCatalog, ModelDescriptor, PickerRequest};

/// What a key press did to the picker
#[derive(Debug, PartialEq)]
pub enum PickerOutcome {
    /// Still open
    Open,
    Chosen(Arc<ModelDescriptor>),
    Cancelled,
}

/// Lists the catalog models sharing the current model's kind.
///
/// Holds the controller's `PickerRequest` until the user decides; choosing
/// sends the model back, cancelling drops the request.
pub struct PickerOverlay {
    request: Option<PickerRequest>,
    choices: Vec<Arc<ModelDescriptor>>,
    cursor: usize,
}

impl PickerOverlay {
    pub fn new(request: PickerRequest, catalog: &ModelCatalog) -> Self {
        let choices: Vec<_> = catalog.of_kind(request.kind()).cloned().collect();
        let cursor = choices
            .iter()
            .position(|m| m == request.current())
            .unwrap_or(0);
        Self {
            request: Some(request),
            choices,
            cursor,
        }
    }

    pub fn choices(&self) -> &[Arc<ModelDescriptor>] {
        &self.choices
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PickerOutcome {
        match key.code {
            KeyCode::Esc => {
                self.request = None;
                PickerOutcome::Cancelled
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor = self.cursor.saturating_sub(1);
                PickerOutcome::Open
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.cursor + 1 < self.choices.len() {
                    self.cursor += 1;
                }
                PickerOutcome::Open
            }
            KeyCode::Enter => self.choose(self.cursor),
            KeyCode::Char(c) => match c.to_digit(10) {
                Some(d) if d >= 1 && (d as usize) <= self.choices.len() => {
                    self.choose(d as usize - 1)
                }
                _ => PickerOutcome::Open,
            },
            _ => PickerOutcome::Open,
        }
    }

    fn choose(&mut self, index: usize) -> PickerOutcome {
        let (Some(request), Some(model)) = (self.request.take(), self.choices.get(index)) else {
            return PickerOutcome::Cancelled;
        };
        request.choose(Arc::clone(model));
        PickerOutcome::Chosen(Arc::clone(model))
    }

    /// Overlay text, one entry per line, the highlighted entry marked
    pub fn lines(&self) -> Vec<String> {
        let kind = self.request.as_ref().map_or("", |r| r.kind());
        let mut lines = vec![format!(" Choose a {kind} model (enter, 1-9, esc) ")];
        lines.extend(self.choices.iter().enumerate().map(|(i, model)| {
            let marker = if i == self.cursor { '>' } else { ' ' };
            format!(" {marker} {}. {} ", i + 1, model.label)
        }));
        lines
    }
}
